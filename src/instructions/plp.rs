use crate::cpu6502::{CPU, StatusFlag};

impl CPU {
    pub(crate) fn handle_plp(&mut self, _opt_value: Option<u8>, _opt_address: Option<u16>) -> u8 {
        // The B bit only exists in stacked copies of the status register and U is
        // always high in the live register, so both are normalized on the way back.
        let popped_status = self.pop_u8();
        self.status_register = popped_status;
        self.set_status_flag(StatusFlag::BreakCommand, false);
        self.set_status_flag(StatusFlag::Unused, true);
        return 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu6502::new_cpu;

    #[test]
    fn test_plp_pulls_status_from_stack() {
        let mut cpu = new_cpu();
        // Push a status with N, B, U, Z and C set (0b1011_0011)
        cpu.push_u8(0b1011_0011);

        cpu.handle_plp(None, None);

        // N, Z and C come from the stack; B is dropped and U is forced high.
        assert_eq!(cpu.status_register, 0b1010_0011);
        assert_eq!(cpu.stack_pointer, 0xFD, "Stack pointer should increment");
        assert!(!cpu.get_status_flag(StatusFlag::BreakCommand));
        assert!(cpu.get_status_flag(StatusFlag::Unused));
    }

    #[test]
    fn test_plp_sets_unused_even_when_clear_on_stack() {
        let mut cpu = new_cpu();
        cpu.push_u8(0x00);
        cpu.handle_plp(None, None);
        assert_eq!(cpu.status_register, 0b0010_0000);
    }
}
