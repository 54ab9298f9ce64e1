use crate::cpu6502::{CPU, StatusFlag};

impl CPU {
    pub(crate) fn handle_bne(&mut self, _opt_value: Option<u8>, opt_address: Option<u16>) -> u8 {
        let target = opt_address.expect("BUG: branch target of BNE should be present");
        self.branch(!self.get_status_flag(StatusFlag::Zero), target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu6502::new_cpu;

    #[test]
    fn test_bne_branches_when_zero_clear() {
        let mut cpu = new_cpu();
        cpu.program_counter = 0x1001;
        cpu.set_status_flag(StatusFlag::Zero, false);
        let cycles = cpu.handle_bne(Some(0xFC), Some(0x0FFE));
        assert_eq!(cpu.program_counter, 0x0FFE, "negative offsets branch backwards");
        assert_eq!(cycles, 2, "backward branch into the previous page crosses a page");
    }

    #[test]
    fn test_bne_falls_through_when_zero_set() {
        let mut cpu = new_cpu();
        cpu.program_counter = 0x1001;
        cpu.set_status_flag(StatusFlag::Zero, true);
        let cycles = cpu.handle_bne(Some(0xFC), Some(0x0FFE));
        assert_eq!(cpu.program_counter, 0x1001);
        assert_eq!(cycles, 0);
    }
}
