//! Configuration types
//!
//! Node configuration is written as a small TOML file and parsed on the
//! device at boot by [`parse_config`].

pub mod hardware;
pub mod parse;
pub mod types;

pub use hardware::*;
pub use parse::{parse_config, ParseError};
pub use types::*;
