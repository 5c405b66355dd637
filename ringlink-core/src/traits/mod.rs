//! Collaborator traits
//!
//! These traits define the interface between the node logic and the
//! display and keypad on a particular board.

pub mod display;
pub mod keypad;

pub use display::{DisplayExt, DisplaySink, TextBuffer};
pub use keypad::{Key, KeySource};
