//! Ring Link Protocol
//!
//! This crate implements the lower two layers of the message ring and the
//! wire framing shared with the message layer. Every node has an outbound
//! pair (clock, data, ack-in) toward its downstream neighbour and an
//! inbound pair (clock, data, ack-out) from its upstream neighbour.
//!
//! # Layers
//!
//! - [`phy`]: line ownership, idle levels, START/STOP conditions
//! - [`byte`]: one byte per transfer, MSB first, with an ack handshake
//! - [`frame`]: node ids and the message frame carried over the bytes
//!
//! # Wire format
//!
//! ```text
//! ┌───────┬────────┬───────────┬────────┬─────────────┬──────┐
//! │ START │ LENGTH │ RECIPIENT │ SENDER │ PAYLOAD     │ STOP │
//! │       │ 1B     │ 1B        │ 1B     │ 0–10B       │      │
//! └───────┴────────┴───────────┴────────┴─────────────┴──────┘
//! ```
//!
//! START is clock high with data falling; STOP is data rising with clock
//! high. Every byte is acknowledged individually by the receiver.

#![no_std]
#![deny(unsafe_code)]

pub mod budget;
pub mod byte;
pub mod frame;
pub mod phy;

pub use budget::{wait_for, Expired, PollBudget, WaitBudget};
pub use byte::{ByteSink, ByteSource, ReceiveError, ReceiveStep, SendError};
pub use frame::{FrameError, Message, NodeId, COMPOSE_MAX, HEADER_LEN, MAX_PAYLOAD};
pub use phy::{Receiver, RxLines, RxPins, Timing, Transmitter, TxLines, TxPins};
pub use ringlink_hal::Level;
