//! Link configuration types

use ringlink_protocol::{NodeId, Timing};

/// Default polls allowed for each handshake wait
pub const DEFAULT_WAIT_POLLS: u32 = 60_000;

/// Default number of attempts per message
pub const DEFAULT_RETRY_LIMIT: u8 = 20;

/// What to do with a frame whose LENGTH exceeds the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OversizePolicy {
    /// Read and discard the payload so the sender finishes in step
    #[default]
    Drain,
    /// Stop reading after the header
    Abandon,
}

/// Defensive resynchronisation around relays
///
/// Noisy wiring can leave a line glitched after a frame. When enabled,
/// both pairs are settled and forced idle before and after every relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResyncPolicy {
    pub enabled: bool,
}

impl Default for ResyncPolicy {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Message link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// This node's id
    pub node_id: NodeId,
    /// Line timing
    pub timing: Timing,
    /// Polls allowed while waiting for an acknowledgement
    pub ack_polls: u32,
    /// Polls allowed while waiting for each clock edge
    pub edge_polls: u32,
    /// Attempts per message before it is abandoned
    pub retry_limit: u8,
    /// Oversize frame handling
    pub oversize: OversizePolicy,
    /// Relay resynchronisation
    pub resync: ResyncPolicy,
}

impl LinkConfig {
    /// Default configuration for a node
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            timing: Timing::default(),
            ack_polls: DEFAULT_WAIT_POLLS,
            edge_polls: DEFAULT_WAIT_POLLS,
            retry_limit: DEFAULT_RETRY_LIMIT,
            oversize: OversizePolicy::default(),
            resync: ResyncPolicy::default(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new(NodeId::from_wire(b'1'))
    }
}
