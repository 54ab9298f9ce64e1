use log::debug;
use phf::phf_map;
use thiserror::Error;

#[derive(Debug)]
pub struct CPU {
    // More info about the 6502 registers can be found here:
    // https://www.nesdev.org/obelisk-6502-guide/registers.html

    // The program counter is a 16 bit register that holds the memory address of the next instruction to be executed.
    // The value of program counter is modified automatically as instructions are executed.
    pub program_counter: u16,

    // The stack pointer is an 8 bit register and holds the low 8 bits of the next free location
    // on the stack. The location of the stack is fixed and cannot be moved.
    // Memory space [0x0100 .. 0x01FF]
    pub stack_pointer: u8,

    // The accumulator is an 8 bit register used for arithmetic and logical operations.
    pub accumulator: u8,

    // The 8 bit index register is most commonly used to hold counters or offsets for accessing memory.
    pub x_register: u8,

    // The Y register is similar to the X register in that it is available for holding counter or offsets memory access
    pub y_register: u8,

    // As instructions are executed a set of processor flags are set or clear to record the results of the operation.
    // Each bit in the status register represents a different flag:
    // Bit 7: Negative Flag (N)
    // Bit 6: Overflow Flag (V)
    // Bit 5: Unused (U) (always set in any status byte pushed to the stack)
    // Bit 4: Break Command (B)
    // Bit 3: Decimal Mode Flag (D) (set/cleared but otherwise ignored, as on the NES)
    // Bit 2: Interrupt Disable (I)
    // Bit 1: Zero Flag (Z)
    // Bit 0: Carry Flag (C)
    pub status_register: u8,

    // The 6502 has a 16 bit address bus, which means it can address up to 64KB of memory.
    // This machine is a flat 64KB byte array with no mapped peripherals. The program region
    // starts at 0x8000 and the reset vector lives at 0xFFFC/0xFFFD; the very last byte at
    // 0xFFFF belongs to the address space too and must stay readable.
    // Total memory size: 0xFFFF + 1 = 65536 bytes = 0x10000 to include all addresses.
    memory: [u8; 0x10000],

    // Global cycle counter (counts nominal CPU cycles executed)
    pub cycles: u64,
}

// Each flag corresponds to a bit in the status register
// Values are the bit positions
#[derive(Debug, Clone, Copy)]
pub enum StatusFlag {
    Carry = 0,
    Zero = 1,
    InterruptDisable = 2,
    DecimalMode = 3,
    BreakCommand = 4,
    Unused = 5,
    Overflow = 6,
    Negative = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Absolute,    // e.g. LDA $1234
    AbsoluteX,   // e.g. LDA $1234,X
    AbsoluteY,   // e.g. LDA $1234,Y
    Accumulator, // e.g. ASL A
    Immediate,   // e.g. LDA #$10
    Implicit,    // e.g. CLC, INX (no operand)
    Indirect,    // e.g. JMP ($1234)
    IndirectX,   // e.g. LDA ($10,X)
    IndirectY,   // e.g. LDA ($10),Y
    Relative,    // e.g. BEQ +5
    ZeroPage,    // e.g. LDA $10
    ZeroPageX,   // e.g. LDA $10,X
    ZeroPageY,   // e.g. LDX $10,Y
}

// Fatal conditions the execution loop reports back to the host.
// Stack wrap, address wrap and arithmetic overflow are defined 6502 behavior, not errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    #[error("unsupported opcode {opcode:#04X} at {address:#06X}")]
    UnsupportedOpcode { opcode: u8, address: u16 },

    #[error("addressing mode {0:?} does not resolve to an operand address")]
    AddressingModeNotApplicable(AddressingMode),
}

pub fn new_cpu() -> CPU {
    CPU {
        program_counter: 0x0000,
        stack_pointer: CPU::STACK_POINTER_RESET,
        accumulator: 0x00,
        x_register: 0x00,
        y_register: 0x00,
        status_register: CPU::STATUS_RESET,
        memory: [0; 0x10000],
        cycles: 0,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Operand {
    opcode: u8,
    name: &'static str,
    // Function pointer to the instruction handler
    //                    memory value   address
    handler: fn(&mut CPU, Option<u8>, Option<u16>) -> u8,
    addressing_mode: AddressingMode,
    bytes: u8,
    cycles: u8,
}

impl CPU {
    const STACK_BASE_ADDRESS: u16 = 0x0100;
    const STACK_POINTER_RESET: u8 = 0xFD;
    const PRG_ROM_BASE_ADDRESS: u16 = 0x8000;
    const RESET_VECTOR_ADDRESS: u16 = 0xFFFC;

    // Documented power-on/reset status: Negative and Interrupt Disable set.
    const STATUS_RESET: u8 =
        (1 << (StatusFlag::Negative as u8)) | (1 << (StatusFlag::InterruptDisable as u8));

    // List of all documented opcodes and their corresponding Operand definitions.
    // Opcode bytes missing from this map are illegal opcodes and abort the run.
    const OPERAND_MAP: phf::Map<u8, Operand> = phf_map! {
        // ADC Instructions
        0x69u8 => Operand { opcode: 0x69, name: "ADC", handler: CPU::handle_adc, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0x65u8 => Operand { opcode: 0x65, name: "ADC", handler: CPU::handle_adc, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0x75u8 => Operand { opcode: 0x75, name: "ADC", handler: CPU::handle_adc, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0x6Du8 => Operand { opcode: 0x6D, name: "ADC", handler: CPU::handle_adc, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0x7Du8 => Operand { opcode: 0x7D, name: "ADC", handler: CPU::handle_adc, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0x79u8 => Operand { opcode: 0x79, name: "ADC", handler: CPU::handle_adc, addressing_mode: AddressingMode::AbsoluteY, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0x61u8 => Operand { opcode: 0x61, name: "ADC", handler: CPU::handle_adc, addressing_mode: AddressingMode::IndirectX, bytes: 2, cycles: 6 },
        0x71u8 => Operand { opcode: 0x71, name: "ADC", handler: CPU::handle_adc, addressing_mode: AddressingMode::IndirectY, bytes: 2, cycles: 5 /* +1 if page crossed */ },

        // AND Instructions
        0x29u8 => Operand { opcode: 0x29, name: "AND", handler: CPU::handle_and, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0x25u8 => Operand { opcode: 0x25, name: "AND", handler: CPU::handle_and, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0x35u8 => Operand { opcode: 0x35, name: "AND", handler: CPU::handle_and, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0x2Du8 => Operand { opcode: 0x2D, name: "AND", handler: CPU::handle_and, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0x3Du8 => Operand { opcode: 0x3D, name: "AND", handler: CPU::handle_and, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0x39u8 => Operand { opcode: 0x39, name: "AND", handler: CPU::handle_and, addressing_mode: AddressingMode::AbsoluteY, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0x21u8 => Operand { opcode: 0x21, name: "AND", handler: CPU::handle_and, addressing_mode: AddressingMode::IndirectX, bytes: 2, cycles: 6 },
        0x31u8 => Operand { opcode: 0x31, name: "AND", handler: CPU::handle_and, addressing_mode: AddressingMode::IndirectY, bytes: 2, cycles: 5 /* +1 if page crossed */ },

        // ASL Instructions
        0x0Au8 => Operand { opcode: 0x0A, name: "ASL", handler: CPU::handle_asl, addressing_mode: AddressingMode::Accumulator, bytes: 1, cycles: 2 },
        0x06u8 => Operand { opcode: 0x06, name: "ASL", handler: CPU::handle_asl, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 5 },
        0x16u8 => Operand { opcode: 0x16, name: "ASL", handler: CPU::handle_asl, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 6 },
        0x0Eu8 => Operand { opcode: 0x0E, name: "ASL", handler: CPU::handle_asl, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 6 },
        0x1Eu8 => Operand { opcode: 0x1E, name: "ASL", handler: CPU::handle_asl, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 7 },

        // BCC Instructions
        0x90u8 => Operand { opcode: 0x90, name: "BCC", handler: CPU::handle_bcc, addressing_mode: AddressingMode::Relative, bytes: 2, cycles: 2 /* +1 if branch succeeds or +2 if to a new page */ },

        // BCS Instructions
        0xB0u8 => Operand { opcode: 0xB0, name: "BCS", handler: CPU::handle_bcs, addressing_mode: AddressingMode::Relative, bytes: 2, cycles: 2 /* +1 if branch succeeds or +2 if to a new page */ },

        // BEQ Instructions
        0xF0u8 => Operand { opcode: 0xF0, name: "BEQ", handler: CPU::handle_beq, addressing_mode: AddressingMode::Relative, bytes: 2, cycles: 2 /* +1 if branch succeeds or +2 if to a new page */ },

        // BIT Instructions
        0x24u8 => Operand { opcode: 0x24, name: "BIT", handler: CPU::handle_bit, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0x2Cu8 => Operand { opcode: 0x2C, name: "BIT", handler: CPU::handle_bit, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },

        // BMI Instructions
        0x30u8 => Operand { opcode: 0x30, name: "BMI", handler: CPU::handle_bmi, addressing_mode: AddressingMode::Relative, bytes: 2, cycles: 2 /* +1 if branch succeeds or +2 if to a new page */ },

        // BNE Instructions
        0xD0u8 => Operand { opcode: 0xD0, name: "BNE", handler: CPU::handle_bne, addressing_mode: AddressingMode::Relative, bytes: 2, cycles: 2 /* +1 if branch succeeds or +2 if to a new page */ },

        // BPL Instructions
        0x10u8 => Operand { opcode: 0x10, name: "BPL", handler: CPU::handle_bpl, addressing_mode: AddressingMode::Relative, bytes: 2, cycles: 2 /* +1 if branch succeeds or +2 if to a new page */ },

        // BRK Instructions
        0x00u8 => Operand { opcode: 0x00, name: "BRK", handler: CPU::handle_brk, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 7 },

        // BVC Instructions
        0x50u8 => Operand { opcode: 0x50, name: "BVC", handler: CPU::handle_bvc, addressing_mode: AddressingMode::Relative, bytes: 2, cycles: 2 /* +1 if branch succeeds or +2 if to a new page */ },

        // BVS Instructions
        0x70u8 => Operand { opcode: 0x70, name: "BVS", handler: CPU::handle_bvs, addressing_mode: AddressingMode::Relative, bytes: 2, cycles: 2 /* +1 if branch succeeds or +2 if to a new page */ },

        // CLC Instructions
        0x18u8 => Operand { opcode: 0x18, name: "CLC", handler: CPU::handle_clc, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // CLD Instructions
        0xD8u8 => Operand { opcode: 0xD8, name: "CLD", handler: CPU::handle_cld, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // CLI Instructions
        0x58u8 => Operand { opcode: 0x58, name: "CLI", handler: CPU::handle_cli, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // CLV Instructions
        0xB8u8 => Operand { opcode: 0xB8, name: "CLV", handler: CPU::handle_clv, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // CMP Instructions
        0xC9u8 => Operand { opcode: 0xC9, name: "CMP", handler: CPU::handle_cmp, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0xC5u8 => Operand { opcode: 0xC5, name: "CMP", handler: CPU::handle_cmp, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0xD5u8 => Operand { opcode: 0xD5, name: "CMP", handler: CPU::handle_cmp, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0xCDu8 => Operand { opcode: 0xCD, name: "CMP", handler: CPU::handle_cmp, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0xDDu8 => Operand { opcode: 0xDD, name: "CMP", handler: CPU::handle_cmp, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0xD9u8 => Operand { opcode: 0xD9, name: "CMP", handler: CPU::handle_cmp, addressing_mode: AddressingMode::AbsoluteY, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0xC1u8 => Operand { opcode: 0xC1, name: "CMP", handler: CPU::handle_cmp, addressing_mode: AddressingMode::IndirectX, bytes: 2, cycles: 6 },
        0xD1u8 => Operand { opcode: 0xD1, name: "CMP", handler: CPU::handle_cmp, addressing_mode: AddressingMode::IndirectY, bytes: 2, cycles: 5 /* +1 if page crossed */ },

        // CPX Instructions
        0xE0u8 => Operand { opcode: 0xE0, name: "CPX", handler: CPU::handle_cpx, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0xE4u8 => Operand { opcode: 0xE4, name: "CPX", handler: CPU::handle_cpx, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0xECu8 => Operand { opcode: 0xEC, name: "CPX", handler: CPU::handle_cpx, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },

        // CPY Instructions
        0xC0u8 => Operand { opcode: 0xC0, name: "CPY", handler: CPU::handle_cpy, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0xC4u8 => Operand { opcode: 0xC4, name: "CPY", handler: CPU::handle_cpy, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0xCCu8 => Operand { opcode: 0xCC, name: "CPY", handler: CPU::handle_cpy, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },

        // DEC Instructions
        0xC6u8 => Operand { opcode: 0xC6, name: "DEC", handler: CPU::handle_dec, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 5 },
        0xD6u8 => Operand { opcode: 0xD6, name: "DEC", handler: CPU::handle_dec, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 6 },
        0xCEu8 => Operand { opcode: 0xCE, name: "DEC", handler: CPU::handle_dec, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 6 },
        0xDEu8 => Operand { opcode: 0xDE, name: "DEC", handler: CPU::handle_dec, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 7 },

        // DEX Instructions
        0xCAu8 => Operand { opcode: 0xCA, name: "DEX", handler: CPU::handle_dex, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // DEY Instructions
        0x88u8 => Operand { opcode: 0x88, name: "DEY", handler: CPU::handle_dey, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // EOR Instructions
        0x49u8 => Operand { opcode: 0x49, name: "EOR", handler: CPU::handle_eor, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0x45u8 => Operand { opcode: 0x45, name: "EOR", handler: CPU::handle_eor, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0x55u8 => Operand { opcode: 0x55, name: "EOR", handler: CPU::handle_eor, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0x4Du8 => Operand { opcode: 0x4D, name: "EOR", handler: CPU::handle_eor, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0x5Du8 => Operand { opcode: 0x5D, name: "EOR", handler: CPU::handle_eor, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0x59u8 => Operand { opcode: 0x59, name: "EOR", handler: CPU::handle_eor, addressing_mode: AddressingMode::AbsoluteY, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0x41u8 => Operand { opcode: 0x41, name: "EOR", handler: CPU::handle_eor, addressing_mode: AddressingMode::IndirectX, bytes: 2, cycles: 6 },
        0x51u8 => Operand { opcode: 0x51, name: "EOR", handler: CPU::handle_eor, addressing_mode: AddressingMode::IndirectY, bytes: 2, cycles: 5 /* +1 if page crossed */ },

        // INC Instructions
        0xE6u8 => Operand { opcode: 0xE6, name: "INC", handler: CPU::handle_inc, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 5 },
        0xF6u8 => Operand { opcode: 0xF6, name: "INC", handler: CPU::handle_inc, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 6 },
        0xEEu8 => Operand { opcode: 0xEE, name: "INC", handler: CPU::handle_inc, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 6 },
        0xFEu8 => Operand { opcode: 0xFE, name: "INC", handler: CPU::handle_inc, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 7 },

        // INX Instructions
        0xE8u8 => Operand { opcode: 0xE8, name: "INX", handler: CPU::handle_inx, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // INY Instructions
        0xC8u8 => Operand { opcode: 0xC8, name: "INY", handler: CPU::handle_iny, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // JMP Instructions
        0x4Cu8 => Operand { opcode: 0x4C, name: "JMP", handler: CPU::handle_jmp, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 3 },
        0x6Cu8 => Operand { opcode: 0x6C, name: "JMP", handler: CPU::handle_jmp, addressing_mode: AddressingMode::Indirect, bytes: 3, cycles: 5 },

        // JSR Instructions
        0x20u8 => Operand { opcode: 0x20, name: "JSR", handler: CPU::handle_jsr, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 6 },

        // LDA Instructions
        0xA9u8 => Operand { opcode: 0xA9, name: "LDA", handler: CPU::handle_lda, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0xA5u8 => Operand { opcode: 0xA5, name: "LDA", handler: CPU::handle_lda, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0xB5u8 => Operand { opcode: 0xB5, name: "LDA", handler: CPU::handle_lda, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0xADu8 => Operand { opcode: 0xAD, name: "LDA", handler: CPU::handle_lda, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0xBDu8 => Operand { opcode: 0xBD, name: "LDA", handler: CPU::handle_lda, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0xB9u8 => Operand { opcode: 0xB9, name: "LDA", handler: CPU::handle_lda, addressing_mode: AddressingMode::AbsoluteY, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0xA1u8 => Operand { opcode: 0xA1, name: "LDA", handler: CPU::handle_lda, addressing_mode: AddressingMode::IndirectX, bytes: 2, cycles: 6 },
        0xB1u8 => Operand { opcode: 0xB1, name: "LDA", handler: CPU::handle_lda, addressing_mode: AddressingMode::IndirectY, bytes: 2, cycles: 5 /* +1 if page crossed */ },

        // LDX Instructions
        0xA2u8 => Operand { opcode: 0xA2, name: "LDX", handler: CPU::handle_ldx, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0xA6u8 => Operand { opcode: 0xA6, name: "LDX", handler: CPU::handle_ldx, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0xB6u8 => Operand { opcode: 0xB6, name: "LDX", handler: CPU::handle_ldx, addressing_mode: AddressingMode::ZeroPageY, bytes: 2, cycles: 4 },
        0xAEu8 => Operand { opcode: 0xAE, name: "LDX", handler: CPU::handle_ldx, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0xBEu8 => Operand { opcode: 0xBE, name: "LDX", handler: CPU::handle_ldx, addressing_mode: AddressingMode::AbsoluteY, bytes: 3, cycles: 4 /* +1 if page crossed */ },

        // LDY Instructions
        0xA0u8 => Operand { opcode: 0xA0, name: "LDY", handler: CPU::handle_ldy, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0xA4u8 => Operand { opcode: 0xA4, name: "LDY", handler: CPU::handle_ldy, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0xB4u8 => Operand { opcode: 0xB4, name: "LDY", handler: CPU::handle_ldy, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0xACu8 => Operand { opcode: 0xAC, name: "LDY", handler: CPU::handle_ldy, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0xBCu8 => Operand { opcode: 0xBC, name: "LDY", handler: CPU::handle_ldy, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 4 /* +1 if page crossed */ },

        // LSR Instructions
        0x4Au8 => Operand { opcode: 0x4A, name: "LSR", handler: CPU::handle_lsr, addressing_mode: AddressingMode::Accumulator, bytes: 1, cycles: 2 },
        0x46u8 => Operand { opcode: 0x46, name: "LSR", handler: CPU::handle_lsr, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 5 },
        0x56u8 => Operand { opcode: 0x56, name: "LSR", handler: CPU::handle_lsr, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 6 },
        0x4Eu8 => Operand { opcode: 0x4E, name: "LSR", handler: CPU::handle_lsr, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 6 },
        0x5Eu8 => Operand { opcode: 0x5E, name: "LSR", handler: CPU::handle_lsr, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 7 },

        // NOP Instructions
        0xEAu8 => Operand { opcode: 0xEA, name: "NOP", handler: CPU::handle_nop, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // ORA Instructions
        0x09u8 => Operand { opcode: 0x09, name: "ORA", handler: CPU::handle_ora, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0x05u8 => Operand { opcode: 0x05, name: "ORA", handler: CPU::handle_ora, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0x15u8 => Operand { opcode: 0x15, name: "ORA", handler: CPU::handle_ora, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0x0Du8 => Operand { opcode: 0x0D, name: "ORA", handler: CPU::handle_ora, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0x1Du8 => Operand { opcode: 0x1D, name: "ORA", handler: CPU::handle_ora, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0x19u8 => Operand { opcode: 0x19, name: "ORA", handler: CPU::handle_ora, addressing_mode: AddressingMode::AbsoluteY, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0x01u8 => Operand { opcode: 0x01, name: "ORA", handler: CPU::handle_ora, addressing_mode: AddressingMode::IndirectX, bytes: 2, cycles: 6 },
        0x11u8 => Operand { opcode: 0x11, name: "ORA", handler: CPU::handle_ora, addressing_mode: AddressingMode::IndirectY, bytes: 2, cycles: 5 /* +1 if page crossed */ },

        // PHA Instructions
        0x48u8 => Operand { opcode: 0x48, name: "PHA", handler: CPU::handle_pha, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 3 },

        // PHP Instructions
        0x08u8 => Operand { opcode: 0x08, name: "PHP", handler: CPU::handle_php, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 3 },

        // PLA Instructions
        0x68u8 => Operand { opcode: 0x68, name: "PLA", handler: CPU::handle_pla, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 4 },

        // PLP Instructions
        0x28u8 => Operand { opcode: 0x28, name: "PLP", handler: CPU::handle_plp, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 4 },

        // ROL Instructions
        0x2Au8 => Operand { opcode: 0x2A, name: "ROL", handler: CPU::handle_rol, addressing_mode: AddressingMode::Accumulator, bytes: 1, cycles: 2 },
        0x26u8 => Operand { opcode: 0x26, name: "ROL", handler: CPU::handle_rol, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 5 },
        0x36u8 => Operand { opcode: 0x36, name: "ROL", handler: CPU::handle_rol, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 6 },
        0x2Eu8 => Operand { opcode: 0x2E, name: "ROL", handler: CPU::handle_rol, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 6 },
        0x3Eu8 => Operand { opcode: 0x3E, name: "ROL", handler: CPU::handle_rol, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 7 },

        // ROR Instructions
        0x6Au8 => Operand { opcode: 0x6A, name: "ROR", handler: CPU::handle_ror, addressing_mode: AddressingMode::Accumulator, bytes: 1, cycles: 2 },
        0x66u8 => Operand { opcode: 0x66, name: "ROR", handler: CPU::handle_ror, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 5 },
        0x76u8 => Operand { opcode: 0x76, name: "ROR", handler: CPU::handle_ror, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 6 },
        0x6Eu8 => Operand { opcode: 0x6E, name: "ROR", handler: CPU::handle_ror, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 6 },
        0x7Eu8 => Operand { opcode: 0x7E, name: "ROR", handler: CPU::handle_ror, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 7 },

        // RTI Instructions
        0x40u8 => Operand { opcode: 0x40, name: "RTI", handler: CPU::handle_rti, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 6 },

        // RTS Instructions
        0x60u8 => Operand { opcode: 0x60, name: "RTS", handler: CPU::handle_rts, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 6 },

        // SBC Instructions
        0xE9u8 => Operand { opcode: 0xE9, name: "SBC", handler: CPU::handle_sbc, addressing_mode: AddressingMode::Immediate, bytes: 2, cycles: 2 },
        0xE5u8 => Operand { opcode: 0xE5, name: "SBC", handler: CPU::handle_sbc, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0xF5u8 => Operand { opcode: 0xF5, name: "SBC", handler: CPU::handle_sbc, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0xEDu8 => Operand { opcode: 0xED, name: "SBC", handler: CPU::handle_sbc, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0xFDu8 => Operand { opcode: 0xFD, name: "SBC", handler: CPU::handle_sbc, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0xF9u8 => Operand { opcode: 0xF9, name: "SBC", handler: CPU::handle_sbc, addressing_mode: AddressingMode::AbsoluteY, bytes: 3, cycles: 4 /* +1 if page crossed */ },
        0xE1u8 => Operand { opcode: 0xE1, name: "SBC", handler: CPU::handle_sbc, addressing_mode: AddressingMode::IndirectX, bytes: 2, cycles: 6 },
        0xF1u8 => Operand { opcode: 0xF1, name: "SBC", handler: CPU::handle_sbc, addressing_mode: AddressingMode::IndirectY, bytes: 2, cycles: 5 /* +1 if page crossed */ },

        // SEC Instructions
        0x38u8 => Operand { opcode: 0x38, name: "SEC", handler: CPU::handle_sec, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // SED Instructions
        0xF8u8 => Operand { opcode: 0xF8, name: "SED", handler: CPU::handle_sed, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // SEI Instructions
        0x78u8 => Operand { opcode: 0x78, name: "SEI", handler: CPU::handle_sei, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // STA Instructions
        0x85u8 => Operand { opcode: 0x85, name: "STA", handler: CPU::handle_sta, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0x95u8 => Operand { opcode: 0x95, name: "STA", handler: CPU::handle_sta, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0x8Du8 => Operand { opcode: 0x8D, name: "STA", handler: CPU::handle_sta, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },
        0x9Du8 => Operand { opcode: 0x9D, name: "STA", handler: CPU::handle_sta, addressing_mode: AddressingMode::AbsoluteX, bytes: 3, cycles: 5 },
        0x99u8 => Operand { opcode: 0x99, name: "STA", handler: CPU::handle_sta, addressing_mode: AddressingMode::AbsoluteY, bytes: 3, cycles: 5 },
        0x81u8 => Operand { opcode: 0x81, name: "STA", handler: CPU::handle_sta, addressing_mode: AddressingMode::IndirectX, bytes: 2, cycles: 6 },
        0x91u8 => Operand { opcode: 0x91, name: "STA", handler: CPU::handle_sta, addressing_mode: AddressingMode::IndirectY, bytes: 2, cycles: 6 },

        // STX Instructions
        0x86u8 => Operand { opcode: 0x86, name: "STX", handler: CPU::handle_stx, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0x96u8 => Operand { opcode: 0x96, name: "STX", handler: CPU::handle_stx, addressing_mode: AddressingMode::ZeroPageY, bytes: 2, cycles: 4 },
        0x8Eu8 => Operand { opcode: 0x8E, name: "STX", handler: CPU::handle_stx, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },

        // STY Instructions
        0x84u8 => Operand { opcode: 0x84, name: "STY", handler: CPU::handle_sty, addressing_mode: AddressingMode::ZeroPage, bytes: 2, cycles: 3 },
        0x94u8 => Operand { opcode: 0x94, name: "STY", handler: CPU::handle_sty, addressing_mode: AddressingMode::ZeroPageX, bytes: 2, cycles: 4 },
        0x8Cu8 => Operand { opcode: 0x8C, name: "STY", handler: CPU::handle_sty, addressing_mode: AddressingMode::Absolute, bytes: 3, cycles: 4 },

        // TAX Instructions
        0xAAu8 => Operand { opcode: 0xAA, name: "TAX", handler: CPU::handle_tax, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // TAY Instructions
        0xA8u8 => Operand { opcode: 0xA8, name: "TAY", handler: CPU::handle_tay, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // TSX Instructions
        0xBAu8 => Operand { opcode: 0xBA, name: "TSX", handler: CPU::handle_tsx, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // TXA Instructions
        0x8Au8 => Operand { opcode: 0x8A, name: "TXA", handler: CPU::handle_txa, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // TXS Instructions
        0x9Au8 => Operand { opcode: 0x9A, name: "TXS", handler: CPU::handle_txs, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },

        // TYA Instructions
        0x98u8 => Operand { opcode: 0x98, name: "TYA", handler: CPU::handle_tya, addressing_mode: AddressingMode::Implicit, bytes: 1, cycles: 2 },
    };

    pub fn read_u8(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    pub fn write_u8(&mut self, addr: u16, value: u8) {
        self.memory[addr as usize] = value;
    }

    pub fn read_u16(&self, addr: u16) -> u16 {
        // We use little-endian format: low byte at addr, high byte at addr + 1.
        // The high byte address wraps at the top of the address space.
        u16::from_le_bytes([self.read_u8(addr), self.read_u8(addr.wrapping_add(1))])
    }

    pub fn write_u16(&mut self, addr: u16, value: u16) {
        // We use little-endian format: low byte at addr, high byte at addr + 1
        let [low, high] = u16::to_le_bytes(value);

        self.write_u8(addr, low);
        self.write_u8(addr.wrapping_add(1), high);
    }

    pub fn set_status_flag(&mut self, flag: StatusFlag, value: bool) {
        if value {
            self.status_register |= 1 << (flag as u8);
        } else {
            self.status_register &= !(1 << (flag as u8));
        }
    }

    pub fn get_status_flag(&self, flag: StatusFlag) -> bool {
        (self.status_register & (1 << (flag as u8))) != 0
    }

    /// Pushes a byte onto the stack.
    pub(crate) fn push_u8(&mut self, value: u8) {
        let stack_addr = Self::STACK_BASE_ADDRESS + self.stack_pointer as u16;
        self.write_u8(stack_addr, value);
        self.stack_pointer = self.stack_pointer.wrapping_sub(1);
    }

    /// Pushes a 16-bit word onto the stack.
    /// The high byte is pushed first, then the low byte, so they are stored in little-endian format on the stack.
    pub(crate) fn push_u16(&mut self, value: u16) {
        let [low, high] = value.to_le_bytes();
        // Push high byte first, then low byte
        self.push_u8(high);
        self.push_u8(low);
    }

    /// Pops a byte from the stack.
    pub(crate) fn pop_u8(&mut self) -> u8 {
        self.stack_pointer = self.stack_pointer.wrapping_add(1);
        let stack_addr = Self::STACK_BASE_ADDRESS + self.stack_pointer as u16;
        self.read_u8(stack_addr)
    }

    /// Pops a 16-bit word from the stack.
    /// The low byte is popped first, then the high byte, as they are stored in little-endian format on the stack.
    pub(crate) fn pop_u16(&mut self) -> u16 {
        let low = self.pop_u8();
        let high = self.pop_u8();
        u16::from_le_bytes([low, high])
    }

    // Sets the Zero and Negative flags from a result byte, leaving every other flag alone.
    pub(crate) fn update_zero_and_negative_flags(&mut self, result: u8) {
        self.set_status_flag(StatusFlag::Zero, result == 0);
        self.set_status_flag(StatusFlag::Negative, (result & 0x80) != 0);
    }

    // Adds a value plus the carry-in to the accumulator, the shared core of ADC and SBC.
    // Decimal mode is ignored, as on the NES variant of the chip.
    // Overflow: http://www.righto.com/2012/12/the-6502-overflow-flag-explained.html
    pub(crate) fn add_to_accumulator(&mut self, value: u8) {
        let carry_in = self.get_status_flag(StatusFlag::Carry) as u16;
        let sum = self.accumulator as u16 + value as u16 + carry_in;
        let result = sum as u8;

        self.set_status_flag(StatusFlag::Carry, sum > 0xFF);

        // Signed overflow: operand and result have opposite signs, and so do result
        // and the original accumulator.
        let overflow = (value ^ result) & (result ^ self.accumulator) & 0x80 != 0;
        self.set_status_flag(StatusFlag::Overflow, overflow);

        self.accumulator = result;
        self.update_zero_and_negative_flags(self.accumulator);
    }

    // Subtracts an operand from a register without writing the register back,
    // the shared core of CMP, CPX and CPY.
    pub(crate) fn compare(&mut self, register: u8, value: u8) {
        // Carry Flag (C): set if register >= operand (no borrow needed)
        self.set_status_flag(StatusFlag::Carry, register >= value);
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    pub fn load_program(&mut self, program: &[u8]) {
        let start_address = Self::PRG_ROM_BASE_ADDRESS as usize;
        let end_address = start_address + program.len();

        if end_address > self.memory.len() {
            panic!("Program size exceeds memory bounds");
        }

        self.memory[start_address..end_address].copy_from_slice(program);

        // Prime the reset vector so the next reset starts at the program.
        self.write_u16(Self::RESET_VECTOR_ADDRESS, Self::PRG_ROM_BASE_ADDRESS);
        debug!(
            "loaded {} bytes at {:#06X}",
            program.len(),
            Self::PRG_ROM_BASE_ADDRESS
        );
    }

    // Re-initializes the registers and loads the program counter from the reset
    // vector at 0xFFFC. Memory contents survive a reset.
    pub fn reset(&mut self) {
        self.accumulator = 0;
        self.x_register = 0;
        self.y_register = 0;
        self.status_register = Self::STATUS_RESET;
        self.stack_pointer = Self::STACK_POINTER_RESET;
        self.program_counter = self.read_u16(Self::RESET_VECTOR_ADDRESS);
        debug!("reset: pc={:04X}", self.program_counter);
    }

    pub fn load_and_run(&mut self, program: &[u8]) -> Result<(), CpuError> {
        self.load_program(program);
        self.reset();
        self.run()
    }

    // Executes instructions until BRK, or until an illegal opcode aborts the run.
    pub fn run(&mut self) -> Result<(), CpuError> {
        self.run_with_callback(|_| {})
    }

    // Like `run`, but invokes the callback before every instruction. The host may
    // inspect or modify registers and memory from the callback; the machine is
    // never observed mid-instruction.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<(), CpuError>
    where
        F: FnMut(&mut CPU),
    {
        loop {
            callback(self);
            if !self.step()? {
                return Ok(());
            }
        }
    }

    // Executes the single instruction at the program counter.
    // Returns Ok(false) once BRK has been executed, Ok(true) otherwise.
    pub fn step(&mut self) -> Result<bool, CpuError> {
        log::trace!("{}", trace(self));

        let opcode_address = self.program_counter;
        let opcode = self.read_u8(opcode_address);
        self.program_counter = self.program_counter.wrapping_add(1);
        let pc_after_opcode = self.program_counter;

        let operand_info = Self::OPERAND_MAP
            .get(&opcode)
            .copied()
            .ok_or(CpuError::UnsupportedOpcode {
                opcode,
                address: opcode_address,
            })?;

        // Fetch the operand based on the addressing mode. The program counter
        // currently points at the first operand byte.
        let (operand_value, operand_address) = match operand_info.addressing_mode {
            AddressingMode::Implicit => (None, None),
            AddressingMode::Accumulator => (Some(self.accumulator), None),
            mode => {
                let addr = self.get_operand_address(mode, pc_after_opcode)?;
                (Some(self.read_u8(addr)), Some(addr))
            }
        };

        // Execute the instruction and collect any additional cycles the handler reports.
        let handler_extra = (operand_info.handler)(self, operand_value, operand_address);
        self.cycles += operand_info.cycles as u64 + handler_extra as u64;

        // BRK ends the run. The hardware interrupt frame (push PC and status, jump
        // through 0xFFFE) is not modeled; the host reads the machine state instead.
        if operand_info.opcode == 0x00 {
            return Ok(false);
        }

        // If the handler did not move the program counter (no jump or branch taken),
        // advance it past the operand bytes.
        if self.program_counter == pc_after_opcode {
            self.program_counter = self
                .program_counter
                .wrapping_add(operand_info.bytes as u16 - 1);
        }

        Ok(true)
    }

    /// Branch helper: centralizes branch behavior for relative branches.
    /// `condition` indicates whether the branch should be taken.
    /// `target` is the already-resolved destination address.
    /// Returns additional cycles: 0 if not taken, +1 if taken, +2 if page crossed.
    pub(crate) fn branch(&mut self, condition: bool, target: u16) -> u8 {
        let mut additional_cycles: u8 = 0;
        if condition {
            // Page crossing is measured against the instruction that would have
            // executed next: the program counter still points at the offset byte.
            let next_instruction = self.program_counter.wrapping_add(1);
            additional_cycles += 1; // branch taken
            if (next_instruction & 0xFF00) != (target & 0xFF00) {
                additional_cycles += 1; // page crossed
            }
            self.program_counter = target;
        }
        additional_cycles
    }

    // Helper to get the effective operand address based on addressing mode.
    // `addr` is the address of the first operand byte of the current instruction.
    pub(crate) fn get_operand_address(
        &self,
        mode: AddressingMode,
        addr: u16,
    ) -> Result<u16, CpuError> {
        match mode {
            AddressingMode::Absolute => Ok(self.read_u16(addr)),

            AddressingMode::AbsoluteX => {
                let base = self.read_u16(addr);
                Ok(base.wrapping_add(self.x_register as u16))
            }

            AddressingMode::AbsoluteY => {
                let base = self.read_u16(addr);
                Ok(base.wrapping_add(self.y_register as u16))
            }

            AddressingMode::Immediate => Ok(addr),

            AddressingMode::Indirect => {
                let ptr = self.read_u16(addr);
                // 6502 hardware bug: an indirect pointer at the end of a page wraps
                // within that page. JMP ($30FF) reads its high byte from $3000, not $3100.
                let low = self.read_u8(ptr);
                let high = if ptr & 0x00FF == 0x00FF {
                    self.read_u8(ptr & 0xFF00)
                } else {
                    self.read_u8(ptr.wrapping_add(1))
                };
                Ok(u16::from_le_bytes([low, high]))
            }

            AddressingMode::IndirectX => {
                let base = self.read_u8(addr);
                // Both the indexed sum and the pointer high byte stay in the zero page.
                let ptr = base.wrapping_add(self.x_register);
                let low = self.read_u8(ptr as u16);
                let high = self.read_u8(ptr.wrapping_add(1) as u16);
                Ok(u16::from_le_bytes([low, high]))
            }

            AddressingMode::IndirectY => {
                let base = self.read_u8(addr);
                let low = self.read_u8(base as u16);
                let high = self.read_u8(base.wrapping_add(1) as u16);
                let deref_base = u16::from_le_bytes([low, high]);
                // The Y offset is added with full 16-bit wrap, unlike the pointer bytes.
                Ok(deref_base.wrapping_add(self.y_register as u16))
            }

            AddressingMode::Relative => {
                let offset = self.read_u8(addr) as i8;
                // The offset is relative to the address of the *next* instruction.
                Ok(addr.wrapping_add(1).wrapping_add(offset as u16))
            }

            AddressingMode::ZeroPage => Ok(self.read_u8(addr) as u16),

            AddressingMode::ZeroPageX => {
                let base = self.read_u8(addr);
                Ok(base.wrapping_add(self.x_register) as u16)
            }

            AddressingMode::ZeroPageY => {
                let base = self.read_u8(addr);
                Ok(base.wrapping_add(self.y_register) as u16)
            }

            // Accumulator and Implicit operands don't live in memory. Reaching this
            // arm means the opcode table wired a handler to the wrong mode.
            AddressingMode::Accumulator | AddressingMode::Implicit => {
                Err(CpuError::AddressingModeNotApplicable(mode))
            }
        }
    }
}

/// Formats the instruction at the current program counter together with the
/// register file, one line per executed instruction.
pub fn trace(cpu: &CPU) -> String {
    let opcode = cpu.read_u8(cpu.program_counter);
    let name = CPU::OPERAND_MAP
        .get(&opcode)
        .map_or("???", |operand| operand.name);
    format!(
        "{:04X}  {:02X}  {}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
        cpu.program_counter,
        opcode,
        name,
        cpu.accumulator,
        cpu.x_register,
        cpu.y_register,
        cpu.status_register,
        cpu.stack_pointer
    )
}
