use crate::cpu6502::{CPU, StatusFlag};

impl CPU {
    pub(crate) fn handle_bcc(&mut self, _opt_value: Option<u8>, opt_address: Option<u16>) -> u8 {
        let target = opt_address.expect("BUG: branch target of BCC should be present");
        self.branch(!self.get_status_flag(StatusFlag::Carry), target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu6502::new_cpu;

    #[test]
    fn test_bcc_branch_taken() {
        let mut cpu = new_cpu();
        // The program counter sits on the offset byte while a branch executes.
        cpu.program_counter = 0x1001;
        cpu.set_status_flag(StatusFlag::Carry, false);
        let cycles = cpu.handle_bcc(Some(0x10), Some(0x1012));
        assert_eq!(cpu.program_counter, 0x1012);
        assert_eq!(cycles, 1);
    }

    #[test]
    fn test_bcc_branch_not_taken() {
        let mut cpu = new_cpu();
        cpu.program_counter = 0x1001;
        cpu.set_status_flag(StatusFlag::Carry, true);
        let cycles = cpu.handle_bcc(Some(0x10), Some(0x1012));
        assert_eq!(cpu.program_counter, 0x1001, "PC should remain unchanged");
        assert_eq!(cycles, 0);
    }
}
