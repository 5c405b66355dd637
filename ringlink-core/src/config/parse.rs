//! Minimal TOML parser for `node.toml`
//!
//! Handles only the subset the node configuration needs. It does NOT
//! support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers
//! - Single-line arrays of strings: rows = ["gpio10", "gpio11"]
//! - Comments (# ...)
//!
//! Unknown sections and keys are rejected rather than ignored, so a typo
//! in the file cannot silently fall back to a default.

use ringlink_protocol::NodeId;

use super::hardware::{NodeConfig, PinConfig, KEYPAD_LINES};
use super::types::OversizePolicy;

/// Highest GPIO number on the RP2040
const MAX_GPIO: u8 = 29;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Line is neither a section, a comment nor `key = value`
    MalformedLine,
    /// Invalid value type or range
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
    /// Node id is not a single hex digit
    InvalidNodeId,
    /// The same GPIO is assigned twice
    DuplicatePin,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Node,
    Timing,
    Limits,
    Receive,
    Pins,
    Keypad,
}

/// Parse TOML configuration into a [`NodeConfig`]
///
/// Anything not mentioned keeps its default value.
pub fn parse_config(input: &str) -> Result<NodeConfig, ParseError> {
    let mut config = NodeConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::MalformedLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    if !config.has_unique_pins() {
        return Err(ParseError::DuplicatePin);
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "node" => Ok(Section::Node),
        "timing" => Ok(Section::Timing),
        "limits" => Ok(Section::Limits),
        "receive" => Ok(Section::Receive),
        "pins" => Ok(Section::Pins),
        "keypad" => Ok(Section::Keypad),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Remove a trailing comment, leaving `#` inside strings alone
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    strip_separators(value).parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a node id like "1" or "A"
fn parse_node_id(value: &str) -> Result<NodeId, ParseError> {
    let mut chars = parse_string(value).chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => NodeId::parse(c).map_err(|_| ParseError::InvalidNodeId),
        _ => Err(ParseError::InvalidNodeId),
    }
}

/// Parse a pin string like "gpio11" or "^gpio4" (pull-up)
fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let value = parse_string(value);

    let (pull_up, name) = match value.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let pin: u8 = name
        .strip_prefix("gpio")
        .and_then(|n| n.parse().ok())
        .ok_or(ParseError::InvalidPin)?;

    if pin > MAX_GPIO {
        return Err(ParseError::InvalidPin);
    }

    Ok(PinConfig { pin, pull_up })
}

/// Parse an array of exactly [`KEYPAD_LINES`] pins
fn parse_pin_array(value: &str) -> Result<[PinConfig; KEYPAD_LINES], ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;

    let mut pins = [PinConfig::default(); KEYPAD_LINES];
    let mut count = 0;
    for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let slot = pins.get_mut(count).ok_or(ParseError::InvalidValue)?;
        *slot = parse_pin(item)?;
        count += 1;
    }

    if count != KEYPAD_LINES {
        return Err(ParseError::InvalidValue);
    }
    Ok(pins)
}

fn parse_oversize(value: &str) -> Result<OversizePolicy, ParseError> {
    match parse_string(value) {
        "drain" => Ok(OversizePolicy::Drain),
        "abandon" => Ok(OversizePolicy::Abandon),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut NodeConfig,
) -> Result<(), ParseError> {
    let link = &mut config.link;
    let pins = &mut config.pins;

    match (section, key) {
        (Section::Node, "id") => link.node_id = parse_node_id(value)?,

        (Section::Timing, "bit_delay_us") => link.timing.bit_delay_us = parse_int(value)?,
        (Section::Timing, "settle_delay_us") => link.timing.settle_delay_us = parse_int(value)?,
        (Section::Timing, "start_hold_us") => link.timing.start_hold_us = parse_int(value)?,

        (Section::Limits, "ack_polls") => link.ack_polls = parse_positive(value)?,
        (Section::Limits, "edge_polls") => link.edge_polls = parse_positive(value)?,
        (Section::Limits, "retry_limit") => {
            link.retry_limit = parse_positive::<u32>(value)?
                .try_into()
                .map_err(|_| ParseError::InvalidValue)?
        }

        (Section::Receive, "oversize") => link.oversize = parse_oversize(value)?,
        (Section::Receive, "resync") => link.resync.enabled = parse_bool(value)?,

        (Section::Pins, "clock_out") => pins.clock_out = parse_pin(value)?,
        (Section::Pins, "data_out") => pins.data_out = parse_pin(value)?,
        (Section::Pins, "ack_in") => pins.ack_in = parse_pin(value)?,
        (Section::Pins, "clock_in") => pins.clock_in = parse_pin(value)?,
        (Section::Pins, "data_in") => pins.data_in = parse_pin(value)?,
        (Section::Pins, "ack_out") => pins.ack_out = parse_pin(value)?,

        (Section::Keypad, "rows") => config.keypad.rows = parse_pin_array(value)?,
        (Section::Keypad, "cols") => config.keypad.cols = parse_pin_array(value)?,

        _ => return Err(ParseError::UnknownKey),
    }

    Ok(())
}

/// Parse an integer that must be at least 1
fn parse_positive<T: core::str::FromStr + PartialOrd + From<u8>>(value: &str) -> Result<T, ParseError> {
    let n: T = parse_int(value)?;
    if n < T::from(1) {
        return Err(ParseError::InvalidValue);
    }
    Ok(n)
}

/// Drop `_` digit separators
fn strip_separators(value: &str) -> heapless::String<16> {
    let mut out = heapless::String::new();
    for c in value.chars().filter(|c| *c != '_') {
        if out.push(c).is_err() {
            // Too long to be a valid integer anyway
            out.clear();
            break;
        }
    }
    out
}
