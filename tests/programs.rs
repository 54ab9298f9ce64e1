//! End-to-end tests that run small machine-code programs through the public
//! interface and inspect the resulting machine state.

use mos6502::cpu6502::{new_cpu, CpuError, StatusFlag};

#[test]
fn lda_from_zero_page() {
    let mut cpu = new_cpu();
    cpu.load_program(&[0xA5, 0x10, 0x00]); // LDA $10 ; BRK
    cpu.reset();
    cpu.write_u8(0x0010, 0x55);
    cpu.run().unwrap();

    assert_eq!(cpu.accumulator, 0x55);
    assert_eq!(cpu.x_register, 0x00);
    assert!(!cpu.get_status_flag(StatusFlag::Zero));
    assert!(!cpu.get_status_flag(StatusFlag::Negative));
}

#[test]
fn tax_then_inx() {
    let mut cpu = new_cpu();
    // LDA #$C0 ; TAX ; INX ; BRK
    cpu.load_and_run(&[0xA9, 0xC0, 0xAA, 0xE8, 0x00]).unwrap();

    assert_eq!(cpu.accumulator, 0xC0);
    assert_eq!(cpu.x_register, 0xC1);
    assert!(cpu.get_status_flag(StatusFlag::Negative));
    assert!(!cpu.get_status_flag(StatusFlag::Zero));
}

#[test]
fn inx_overflows_to_zero() {
    let mut cpu = new_cpu();
    // LDA #$FF ; TAX ; INX ; BRK
    cpu.load_and_run(&[0xA9, 0xFF, 0xAA, 0xE8, 0x00]).unwrap();

    assert_eq!(cpu.x_register, 0x00);
    assert!(cpu.get_status_flag(StatusFlag::Zero));
    assert!(!cpu.get_status_flag(StatusFlag::Negative));
}

#[test]
fn adc_with_carry_in() {
    let mut cpu = new_cpu();
    // SEC ; LDA #$01 ; ADC #$01 ; BRK
    cpu.load_and_run(&[0x38, 0xA9, 0x01, 0x69, 0x01, 0x00]).unwrap();

    assert_eq!(cpu.accumulator, 0x03, "the pending carry joins the sum");
    assert!(!cpu.get_status_flag(StatusFlag::Carry));
    assert!(!cpu.get_status_flag(StatusFlag::Overflow));
    assert!(!cpu.get_status_flag(StatusFlag::Zero));
}

#[test]
fn adc_signed_overflow() {
    let mut cpu = new_cpu();
    // CLC ; LDA #$7F ; ADC #$01 ; BRK
    cpu.load_and_run(&[0x18, 0xA9, 0x7F, 0x69, 0x01, 0x00]).unwrap();

    assert_eq!(cpu.accumulator, 0x80);
    assert!(cpu.get_status_flag(StatusFlag::Overflow), "+127 + 1 overflows signed range");
    assert!(cpu.get_status_flag(StatusFlag::Negative));
    assert!(!cpu.get_status_flag(StatusFlag::Carry));
}

#[test]
fn sbc_subtracts_with_borrow_semantics() {
    let mut cpu = new_cpu();
    // SEC ; LDA #$10 ; SBC #$03 ; BRK
    cpu.load_and_run(&[0x38, 0xA9, 0x10, 0xE9, 0x03, 0x00]).unwrap();

    assert_eq!(cpu.accumulator, 0x0D);
    assert!(cpu.get_status_flag(StatusFlag::Carry), "no borrow was needed");
}

#[test]
fn jsr_rts_round_trip() {
    let mut cpu = new_cpu();
    // 0x8000: JSR $8006 ; 0x8003: BRK ; 0x8004-5: NOP ; 0x8006: RTS
    cpu.load_and_run(&[0x20, 0x06, 0x80, 0x00, 0xEA, 0xEA, 0x60]).unwrap();

    assert_eq!(cpu.stack_pointer, 0xFD, "the stack pointer returns to its pre-call value");
    // Execution resumed just after the JSR and halted on the BRK at 0x8003.
    assert_eq!(cpu.program_counter, 0x8004);
}

#[test]
fn store_writes_memory_without_touching_flags() {
    let mut cpu = new_cpu();
    // LDA #$5A ; STA $0042 ; BRK
    cpu.load_and_run(&[0xA9, 0x5A, 0x8D, 0x42, 0x00, 0x00]).unwrap();

    assert_eq!(cpu.read_u8(0x0042), 0x5A);
    assert_eq!(cpu.accumulator, 0x5A);
    // Flags are exactly what the preceding load left behind.
    assert_eq!(cpu.status_register, 0b0000_0100);
}

#[test]
fn pha_pla_is_identity_on_accumulator() {
    let mut cpu = new_cpu();
    // LDA #$42 ; PHA ; LDA #$00 ; PLA ; BRK
    cpu.load_and_run(&[0xA9, 0x42, 0x48, 0xA9, 0x00, 0x68, 0x00]).unwrap();

    assert_eq!(cpu.accumulator, 0x42);
    assert_eq!(cpu.stack_pointer, 0xFD, "push and pull balance out");
}

#[test]
fn php_plp_round_trips_the_flags() {
    let mut cpu = new_cpu();
    // SEC ; PHP ; CLC ; PLP ; BRK
    cpu.load_and_run(&[0x38, 0x08, 0x18, 0x28, 0x00]).unwrap();

    // Carry came back from the stack; the stacked B bit was dropped and U forced high.
    // Post-reset N and I are still set: N,U,I,C = 0b1010_0101.
    assert!(cpu.get_status_flag(StatusFlag::Carry));
    assert_eq!(cpu.status_register, 0b1010_0101);
}

#[test]
fn flag_set_clear_pairs() {
    let mut cpu = new_cpu();
    // SEC ; CLC ; BRK
    cpu.load_and_run(&[0x38, 0x18, 0x00]).unwrap();
    assert!(!cpu.get_status_flag(StatusFlag::Carry));

    // SEC ; BRK
    cpu.load_and_run(&[0x38, 0x00]).unwrap();
    assert!(cpu.get_status_flag(StatusFlag::Carry));

    // SED ; CLD ; BRK
    cpu.load_and_run(&[0xF8, 0xD8, 0x00]).unwrap();
    assert!(!cpu.get_status_flag(StatusFlag::DecimalMode));

    // CLI ; BRK (reset leaves Interrupt Disable set)
    cpu.load_and_run(&[0x58, 0x00]).unwrap();
    assert!(!cpu.get_status_flag(StatusFlag::InterruptDisable));
}

#[test]
fn bit_reflects_operand_bits() {
    let mut cpu = new_cpu();
    cpu.load_program(&[0x24, 0x10, 0x00]); // BIT $10 ; BRK
    cpu.reset();
    cpu.write_u8(0x0010, 0b1100_0000);
    cpu.accumulator = 0x3F; // no overlap with the operand -> Z set
    cpu.run().unwrap();

    assert!(cpu.get_status_flag(StatusFlag::Zero));
    assert!(cpu.get_status_flag(StatusFlag::Negative));
    assert!(cpu.get_status_flag(StatusFlag::Overflow));
    assert_eq!(cpu.accumulator, 0x3F, "BIT does not modify the accumulator");
}

#[test]
fn branch_loop_counts_down() {
    let mut cpu = new_cpu();
    // LDX #$05 ; loop: DEX ; BNE loop ; BRK
    cpu.load_and_run(&[0xA2, 0x05, 0xCA, 0xD0, 0xFD, 0x00]).unwrap();

    assert_eq!(cpu.x_register, 0x00);
    assert!(cpu.get_status_flag(StatusFlag::Zero));
}

#[test]
fn indirect_y_operand_crosses_pages() {
    let mut cpu = new_cpu();
    // LDY #$01 ; LDA ($80),Y ; BRK
    cpu.load_program(&[0xA0, 0x01, 0xB1, 0x80, 0x00]);
    cpu.reset();
    // Pointer at $80/$81 is $00FF; adding Y crosses into $0100.
    cpu.write_u8(0x0080, 0xFF);
    cpu.write_u8(0x0081, 0x00);
    cpu.write_u8(0x0100, 0x77);
    cpu.run().unwrap();

    assert_eq!(cpu.accumulator, 0x77);
}

#[test]
fn indirect_x_pointer_wraps_within_zero_page() {
    let mut cpu = new_cpu();
    // LDX #$FF ; LDA ($00,X) ; BRK
    cpu.load_program(&[0xA2, 0xFF, 0xA1, 0x00, 0x00]);
    cpu.reset();
    // The pointer lands on $FF; its high byte wraps around to $00.
    cpu.write_u8(0x00FF, 0x34);
    cpu.write_u8(0x0000, 0x12);
    cpu.write_u8(0x1234, 0x99);
    cpu.run().unwrap();

    assert_eq!(cpu.accumulator, 0x99);
}

#[test]
fn jmp_indirect_reproduces_page_boundary_bug() {
    let mut cpu = new_cpu();
    // JMP ($30FF) ; the pointer high byte comes from $3000, not $3100.
    cpu.load_program(&[0x6C, 0xFF, 0x30]);
    cpu.reset();
    cpu.write_u8(0x30FF, 0x80);
    cpu.write_u8(0x3000, 0x40);
    cpu.write_u8(0x3100, 0x50); // the "sane" high byte that must NOT be used
    // Memory at the buggy target 0x4080 is zeroed, so the CPU halts on BRK there.
    cpu.run().unwrap();

    assert_eq!(cpu.program_counter, 0x4081, "execution continued at 0x4080, not 0x5080");
}

#[test]
fn illegal_opcode_aborts_the_run() {
    let mut cpu = new_cpu();
    assert_eq!(
        cpu.load_and_run(&[0xA9, 0x01, 0x02]), // LDA #$01 ; illegal 0x02
        Err(CpuError::UnsupportedOpcode { opcode: 0x02, address: 0x8002 })
    );
    assert_eq!(cpu.accumulator, 0x01, "state up to the fault is observable");
}

#[test]
fn host_can_single_step_between_instructions() {
    let mut cpu = new_cpu();
    // LDA $10 ; STA $11 ; BRK
    cpu.load_program(&[0xA5, 0x10, 0x85, 0x11, 0x00]);
    cpu.reset();
    cpu.write_u8(0x0010, 0x07);

    assert_eq!(cpu.step(), Ok(true));
    assert_eq!(cpu.accumulator, 0x07);

    // Memory-mapped-style input: the host pokes memory between instructions.
    cpu.write_u8(0x0010, 0xFF);

    assert_eq!(cpu.step(), Ok(true));
    assert_eq!(cpu.read_u8(0x0011), 0x07, "the store used the value loaded before the poke");
    assert_eq!(cpu.step(), Ok(false));
}
