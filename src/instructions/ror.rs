use crate::cpu6502::{CPU, StatusFlag};

impl CPU {
    pub(crate) fn handle_ror(&mut self, opt_value: Option<u8>, opt_address: Option<u16>) -> u8 {
        let value = opt_value.expect("BUG: memory value of ROR should be present");

        // The old carry rotates into bit 7, the old bit 0 becomes the new carry.
        let carry_in = self.get_status_flag(StatusFlag::Carry) as u8;
        let result = (value >> 1) | (carry_in << 7);

        self.set_status_flag(StatusFlag::Carry, (value & 0x01) != 0);
        self.update_zero_and_negative_flags(result);

        match opt_address {
            Some(address) => self.write_u8(address, result),
            None => self.accumulator = result,
        }
        return 0;
    }
}
