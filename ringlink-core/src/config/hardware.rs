//! Hardware configuration types
//!
//! Pin assignments for the two ring pairs and the keypad matrix.

use super::types::LinkConfig;

/// Rows and columns of the keypad matrix
pub const KEYPAD_LINES: usize = 4;

/// Pin configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Enable internal pull-up
    pub pull_up: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            pull_up: false,
        }
    }

    /// Create a pin with pull-up enabled
    pub const fn with_pullup(pin: u8) -> Self {
        Self { pin, pull_up: true }
    }
}

/// Pins of both ring pairs
///
/// Inputs default to pull-ups so an unconnected neighbour reads idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RingPins {
    /// Clock toward the downstream neighbour
    pub clock_out: PinConfig,
    /// Data toward the downstream neighbour
    pub data_out: PinConfig,
    /// Acknowledgement from the downstream neighbour
    pub ack_in: PinConfig,
    /// Clock from the upstream neighbour
    pub clock_in: PinConfig,
    /// Data from the upstream neighbour
    pub data_in: PinConfig,
    /// Acknowledgement toward the upstream neighbour
    pub ack_out: PinConfig,
}

impl Default for RingPins {
    fn default() -> Self {
        Self {
            clock_out: PinConfig::new(2),
            data_out: PinConfig::new(3),
            ack_in: PinConfig::with_pullup(4),
            clock_in: PinConfig::with_pullup(6),
            data_in: PinConfig::with_pullup(7),
            ack_out: PinConfig::new(8),
        }
    }
}

/// Keypad matrix pins
///
/// Rows are driven low one at a time; columns are inputs with pull-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeypadPins {
    pub rows: [PinConfig; KEYPAD_LINES],
    pub cols: [PinConfig; KEYPAD_LINES],
}

impl Default for KeypadPins {
    fn default() -> Self {
        Self {
            rows: [
                PinConfig::new(10),
                PinConfig::new(11),
                PinConfig::new(12),
                PinConfig::new(13),
            ],
            cols: [
                PinConfig::with_pullup(14),
                PinConfig::with_pullup(15),
                PinConfig::with_pullup(16),
                PinConfig::with_pullup(17),
            ],
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    /// Link behaviour
    pub link: LinkConfig,
    /// Ring pins
    pub pins: RingPins,
    /// Keypad pins
    pub keypad: KeypadPins,
}

impl NodeConfig {
    /// Every GPIO number used by this configuration
    pub fn gpio_numbers(&self) -> impl Iterator<Item = u8> + '_ {
        let ring = [
            self.pins.clock_out,
            self.pins.data_out,
            self.pins.ack_in,
            self.pins.clock_in,
            self.pins.data_in,
            self.pins.ack_out,
        ];
        ring.into_iter()
            .chain(self.keypad.rows)
            .chain(self.keypad.cols)
            .map(|p| p.pin)
    }

    /// Check that no GPIO is assigned twice
    pub fn has_unique_pins(&self) -> bool {
        let mut seen: u32 = 0;
        for pin in self.gpio_numbers() {
            let bit = 1u32 << (pin & 31);
            if seen & bit != 0 {
                return false;
            }
            seen |= bit;
        }
        true
    }
}
