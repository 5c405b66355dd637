//! GPIO lines on embassy-rp
//!
//! Ring and keypad lines are plain push-pull outputs and inputs with an
//! optional pull-up. Writes take effect immediately.

use embassy_rp::gpio::{self as rp, AnyPin, Input, Output, Pull};
use embassy_rp::Peri;
use ringlink_hal::{InputPin, Level, OutputPin};

fn to_rp(level: Level) -> rp::Level {
    match level {
        Level::High => rp::Level::High,
        Level::Low => rp::Level::Low,
    }
}

/// Push-pull output line
pub struct RpOutput(Output<'static>);

impl RpOutput {
    /// Configure a pin as output, driving `initial`
    pub fn new(pin: Peri<'static, AnyPin>, initial: Level) -> Self {
        Self(Output::new(pin, to_rp(initial)))
    }
}

impl OutputPin for RpOutput {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn set_level(&mut self, level: Level) {
        self.0.set_level(to_rp(level));
    }

    fn driven_level(&self) -> Level {
        Level::from(self.0.is_set_high())
    }
}

/// Input line
pub struct RpInput(Input<'static>);

impl RpInput {
    /// Configure a pin as input
    pub fn new(pin: Peri<'static, AnyPin>, pull_up: bool) -> Self {
        let pull = if pull_up { Pull::Up } else { Pull::None };
        Self(Input::new(pin, pull))
    }
}

impl InputPin for RpInput {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }

    fn is_low(&self) -> bool {
        self.0.is_low()
    }
}
