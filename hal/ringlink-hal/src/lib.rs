//! Ringlink Hardware Abstraction Layer
//!
//! This crate defines the digital line traits that the ring protocol is
//! written against. Chip-specific HALs implement them on real GPIO; the
//! host simulation in `ringlink-core` implements the protocol-facing
//! traits directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ringlink-core / ringlink-protocol      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ringlink-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ ringlink-hal- │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`gpio::Level`] - Logic level of a line

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, Level, OutputPin};
