use mos6502::cpu6502::new_cpu;

fn main() {
    env_logger::init();

    // LDA #$C0 ; TAX ; INX ; BRK
    let program = [0xA9, 0xC0, 0xAA, 0xE8, 0x00];

    let mut cpu = new_cpu();
    cpu.load_and_run(&program).expect("program execution failed");

    println!("accumulator:      {:#04X}", cpu.accumulator);
    println!("x_register:       {:#04X}", cpu.x_register);
    println!("y_register:       {:#04X}", cpu.y_register);
    println!("status_register:  {:08b}", cpu.status_register);
    println!("cycles:           {}", cpu.cycles);
}
