//! Keypad matrix on RP2040 pins

use embassy_time::Delay;
use ringlink_core::config::KeypadPins;
use ringlink_core::scanner::MatrixKeypad;
use ringlink_hal::Level;

use crate::gpio::{RpInput, RpOutput};
use crate::pins::{PinBank, PinError};

/// Keypad scanner on RP2040 GPIO
pub type Keypad = MatrixKeypad<RpOutput, RpInput, Delay>;

impl PinBank {
    /// Claim the keypad rows and columns
    pub fn keypad(&mut self, pins: &KeypadPins) -> Result<Keypad, PinError> {
        let rows = [
            self.output(pins.rows[0], Level::High)?,
            self.output(pins.rows[1], Level::High)?,
            self.output(pins.rows[2], Level::High)?,
            self.output(pins.rows[3], Level::High)?,
        ];
        let cols = [
            self.input(pins.cols[0])?,
            self.input(pins.cols[1])?,
            self.input(pins.cols[2])?,
            self.input(pins.cols[3])?,
        ];
        Ok(MatrixKeypad::new(rows, cols, Delay))
    }
}
