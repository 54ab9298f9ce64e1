use crate::cpu6502::{CPU, StatusFlag};

impl CPU {
    pub(crate) fn handle_clv(&mut self, _opt_value: Option<u8>, _opt_address: Option<u16>) -> u8 {
        // There is no matching SEV instruction; only ADC/SBC and BIT set V.
        self.set_status_flag(StatusFlag::Overflow, false);
        return 0;
    }
}
