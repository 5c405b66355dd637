//! Board-agnostic core logic for the ring link node
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Message layer: framing over the byte handshake, retries, relay
//! - Node loop tying the link, keypad and display together
//! - Keypad message composer and matrix scanner
//! - Display and keypad collaborator traits
//! - Configuration types and the `node.toml` parser
//! - Host simulation of the two-wire link (feature `std`)

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod compose;
pub mod config;
pub mod message;
pub mod node;
pub mod scanner;
#[cfg(any(test, feature = "std"))]
pub mod sim;
pub mod traits;
