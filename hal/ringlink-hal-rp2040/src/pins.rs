//! Dynamic pin allocation for config-driven hardware setup
//!
//! Provides a way to get GPIO pins by number at runtime, so the ring and
//! keypad wiring can come from `node.toml` instead of being hardcoded.

use embassy_rp::gpio::AnyPin;
use embassy_rp::{Peri, Peripherals};
use ringlink_core::config::{PinConfig, RingPins};
use ringlink_hal::Level;
use ringlink_protocol::{RxPins, TxPins};

use crate::gpio::{RpInput, RpOutput};

/// Number of user GPIO pins
const PIN_COUNT: usize = 30;

/// Outbound pair on RP2040 pins
pub type RpTxPins = TxPins<RpOutput, RpOutput, RpInput>;

/// Inbound pair on RP2040 pins
pub type RpRxPins = RxPins<RpInput, RpInput, RpOutput>;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin(u8),
    /// Pin already taken
    AlreadyTaken(u8),
}

/// Pin bank that holds all GPIO pins and allows taking them by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; PIN_COUNT],
}

impl PinBank {
    /// Take ownership of every GPIO pin
    pub fn new(p: Peripherals) -> Self {
        Self {
            pins: [
                Some(p.PIN_0.into()),
                Some(p.PIN_1.into()),
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        }
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        self.pins
            .get_mut(pin_num as usize)
            .ok_or(PinError::InvalidPin(pin_num))?
            .take()
            .ok_or(PinError::AlreadyTaken(pin_num))
    }

    /// Claim a pin as output driving `initial`
    pub fn output(&mut self, config: PinConfig, initial: Level) -> Result<RpOutput, PinError> {
        Ok(RpOutput::new(self.take(config.pin)?, initial))
    }

    /// Claim a pin as input
    pub fn input(&mut self, config: PinConfig) -> Result<RpInput, PinError> {
        Ok(RpInput::new(self.take(config.pin)?, config.pull_up))
    }

    /// Claim both ring pairs, driven lines starting idle
    pub fn ring(&mut self, pins: &RingPins) -> Result<(RpTxPins, RpRxPins), PinError> {
        let tx = TxPins {
            clock: self.output(pins.clock_out, Level::High)?,
            data: self.output(pins.data_out, Level::High)?,
            ack: self.input(pins.ack_in)?,
        };
        let rx = RxPins {
            clock: self.input(pins.clock_in)?,
            data: self.input(pins.data_in)?,
            ack: self.output(pins.ack_out, Level::High)?,
        };
        Ok((tx, rx))
    }
}
