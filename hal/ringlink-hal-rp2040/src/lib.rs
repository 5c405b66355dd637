//! RP2040-specific HAL for the ring link node
//!
//! This crate provides RP2040 implementations of the shared
//! `ringlink-hal` traits, plus the board wiring built on them:
//!
//! - GPIO lines backed by embassy-rp `Output`/`Input`
//! - Dynamic pin allocation for config-driven setup
//! - Keypad matrix scanner on RP2040 pins

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod keypad;
pub mod pins;

pub use gpio::{RpInput, RpOutput};
pub use keypad::Keypad;
pub use pins::{PinBank, PinError, RpRxPins, RpTxPins};
