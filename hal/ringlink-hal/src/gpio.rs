//! GPIO line abstractions
//!
//! Ring lines are plain push-pull GPIO: the node drives clock/data on its
//! outbound pair and ack on its inbound pair, and samples the other three.

use core::ops::Not;

/// Logic level of a line
///
/// Every ring line idles [`Level::High`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1 (idle)
    #[default]
    High,
}

impl Level {
    /// Check if this is logic 1
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    /// Check if this is logic 0
    pub fn is_low(self) -> bool {
        self == Level::Low
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Digital output line
///
/// Writes must take effect immediately; the protocol inserts its own
/// settling delays after every transition.
pub trait OutputPin {
    /// Drive the line high (logic 1)
    fn set_high(&mut self);

    /// Drive the line low (logic 0)
    fn set_low(&mut self);

    /// Drive the line to a specific level
    fn set_level(&mut self, level: Level) {
        match level {
            Level::High => self.set_high(),
            Level::Low => self.set_low(),
        }
    }

    /// Level currently being driven
    fn driven_level(&self) -> Level;
}

/// Digital input line
pub trait InputPin {
    /// Check if the line reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the line reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }

    /// Sample the line
    fn level(&self) -> Level {
        Level::from(self.is_high())
    }
}
