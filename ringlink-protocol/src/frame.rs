//! Message framing for the ring
//!
//! Frame format (each field one acknowledged byte, between START and STOP):
//! - LENGTH (1 byte): payload length (0-10)
//! - RECIPIENT (1 byte): id of the destination node, ASCII hex
//! - SENDER (1 byte): id of the originating node, ASCII hex
//! - PAYLOAD (0-10 bytes): message text
//!
//! There is no checksum; the per-byte handshake is the only integrity check.

use core::fmt;

use heapless::Vec;

/// Maximum payload a node will accept (16 display columns minus "Recv: ")
pub const MAX_PAYLOAD: usize = 10;

/// Maximum payload the keypad composer produces (16 columns minus "M: " and " R:x")
pub const COMPOSE_MAX: usize = 9;

/// Header bytes preceding the payload
pub const HEADER_LEN: usize = 3;

/// Errors that can occur while building a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds [`MAX_PAYLOAD`]
    PayloadTooLarge,
    /// Node id is not a hex digit
    InvalidNodeId,
}

/// Single-character node identity
///
/// Locally configured ids are always hex digits '0'-'F'. Ids read from the
/// wire are kept as-is, whatever byte arrived.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeId(u8);

impl NodeId {
    /// Parse a hex digit id, normalising lower case
    pub fn parse(c: char) -> Result<Self, FrameError> {
        match c {
            '0'..='9' | 'A'..='F' => Ok(Self(c as u8)),
            'a'..='f' => Ok(Self(c.to_ascii_uppercase() as u8)),
            _ => Err(FrameError::InvalidNodeId),
        }
    }

    /// Wrap an id byte received from the wire
    pub const fn from_wire(byte: u8) -> Self {
        Self(byte)
    }

    /// Raw id byte
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Check if this id is a valid hex digit
    pub fn is_hex(self) -> bool {
        matches!(self.0, b'0'..=b'9' | b'A'..=b'F')
    }

    /// Id as a displayable character
    pub fn as_char(self) -> char {
        self.0 as char
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_ascii_graphic() {
            write!(f, "NodeId('{}')", self.0 as char)
        } else {
            write!(f, "NodeId({:#04x})", self.0)
        }
    }
}

impl TryFrom<char> for NodeId {
    type Error = FrameError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::parse(c)
    }
}

/// One message travelling around the ring
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    /// Destination node
    pub recipient: NodeId,
    /// Originating node
    pub sender: NodeId,
    /// Message text
    pub payload: Vec<u8, MAX_PAYLOAD>,
}

impl Message {
    /// Create a message, rejecting payloads over [`MAX_PAYLOAD`]
    pub fn new(recipient: NodeId, sender: NodeId, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self {
            recipient,
            sender,
            payload,
        })
    }

    /// Create a message with no payload
    pub fn empty(recipient: NodeId, sender: NodeId) -> Self {
        Self {
            recipient,
            sender,
            payload: Vec::new(),
        }
    }

    /// Value of the LENGTH field
    pub fn length(&self) -> u8 {
        // bounded by MAX_PAYLOAD
        self.payload.len() as u8
    }

    /// LENGTH, RECIPIENT and SENDER fields in wire order
    pub fn header(&self) -> [u8; HEADER_LEN] {
        [self.length(), self.recipient.as_byte(), self.sender.as_byte()]
    }

    /// Every byte of the frame in wire order
    pub fn wire_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.header().into_iter().chain(self.payload.iter().copied())
    }

    /// Payload as text, if it is valid UTF-8
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}
