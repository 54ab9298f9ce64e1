use crate::cpu6502::{CPU, StatusFlag};

impl CPU {
    pub(crate) fn handle_bit(&mut self, opt_value: Option<u8>, _opt_address: Option<u16>) -> u8 {
        let value = opt_value.expect("BUG: memory value of BIT should be present");

        // Zero reflects the masked accumulator, but the accumulator is untouched.
        self.set_status_flag(StatusFlag::Zero, (self.accumulator & value) == 0);

        // N and V are copied straight from bits 7 and 6 of the operand,
        // clearing them when the bits are low.
        self.set_status_flag(StatusFlag::Negative, (value & 0x80) != 0);
        self.set_status_flag(StatusFlag::Overflow, (value & 0x40) != 0);

        return 0;
    }
}
