use crate::cpu6502::CPU;

impl CPU {
    pub(crate) fn handle_eor(&mut self, opt_value: Option<u8>, _opt_address: Option<u16>) -> u8 {
        let value = opt_value.expect("BUG: memory value of EOR should be present");
        self.accumulator ^= value;
        self.update_zero_and_negative_flags(self.accumulator);
        return 0;
    }
}
