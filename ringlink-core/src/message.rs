//! Message layer
//!
//! Frames travel hop by hop around the ring. Each node reads the header,
//! keeps frames addressed to it and forwards everything else unchanged to
//! its downstream neighbour.
//!
//! ```text
//! AWAIT_HEADER ──► VALIDATING ──┬─► stale echo ───────────────┐
//!                               ├─► DISCARD_OVERSIZE ─────────┤
//!                               └─► READ_PAYLOAD ─┬─► DELIVER ├─► IDLE
//!                                                 ├─► RELAY   │
//!                                                 └─► DROP    ┘
//! ```
//!
//! Any byte that fails to arrive aborts the frame on the spot; the node
//! never carries on with a partial byte.

use heapless::Vec;
use ringlink_protocol::{
    ByteSink, ByteSource, Message, NodeId, ReceiveError, SendError, MAX_PAYLOAD,
};

use crate::config::{LinkConfig, OversizePolicy};
use crate::traits::{DisplayExt, DisplaySink};

/// Result of sending one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendOutcome {
    /// Every byte was acknowledged
    Sent { attempts: u8 },
    /// The retry limit was reached
    Abandoned { attempts: u8, last_error: SendError },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }

    /// Attempts made, including the successful one
    pub fn attempts(&self) -> u8 {
        match *self {
            SendOutcome::Sent { attempts } | SendOutcome::Abandoned { attempts, .. } => attempts,
        }
    }
}

/// Frame field being read when a byte was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Length,
    Recipient,
    Sender,
    /// Payload byte at this index
    Payload(u8),
}

/// What became of an inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposition {
    /// Addressed to this node and shown on the display
    Delivered(Message),
    /// Forwarded to the downstream neighbour
    Relayed {
        message: Message,
        outcome: SendOutcome,
    },
    /// Empty frame for another node; not worth forwarding
    DroppedEmpty { recipient: NodeId, sender: NodeId },
    /// A frame this node sent came all the way round without finding its
    /// recipient
    StaleEcho { recipient: NodeId, length: u8 },
    /// LENGTH larger than the receive buffer
    Oversize {
        length: u8,
        recipient: NodeId,
        sender: NodeId,
        /// All payload bytes were read and discarded
        drained: bool,
    },
    /// A byte was lost partway through the frame
    Desync { field: Field, error: ReceiveError },
}

/// A frame that was read in full
enum Inbound {
    Local(Message),
    Foreign(Message),
    /// Already dealt with while reading
    Closed(Disposition),
}

/// Both directions of a node's ring link
pub struct MessageLink<T, R> {
    tx: T,
    rx: R,
    config: LinkConfig,
}

impl<T: ByteSink, R: ByteSource> MessageLink<T, R> {
    /// Take ownership of both directions and drive them idle
    pub fn new(tx: T, rx: R, config: LinkConfig) -> Self {
        let mut link = Self { tx, rx, config };
        link.idle();
        link
    }

    /// Link configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// This node's id
    pub fn node_id(&self) -> NodeId {
        self.config.node_id
    }

    /// Check the inbound pair for a START condition
    pub fn poll_start(&mut self) -> bool {
        self.rx.poll_start()
    }

    /// Force both pairs idle
    pub fn idle(&mut self) {
        self.tx.idle();
        self.rx.idle();
    }

    /// Release both directions
    pub fn release(self) -> (T, R) {
        (self.tx, self.rx)
    }

    /// Send a message, retrying the whole frame on any failed byte
    ///
    /// Gives up quietly after `retry_limit` attempts.
    pub fn send(&mut self, message: &Message) -> SendOutcome {
        let limit = self.config.retry_limit.max(1);
        let mut last_error = SendError::AckTimeout;

        for attempt in 1..=limit {
            match self.send_frame(message) {
                Ok(()) => return SendOutcome::Sent { attempts: attempt },
                Err(e) => last_error = e,
            }
        }

        SendOutcome::Abandoned {
            attempts: limit,
            last_error,
        }
    }

    /// One attempt: START, every byte, STOP
    ///
    /// Stops at the first failed byte; the receiver is out of step by then
    /// and the remaining bytes would only burn timeouts.
    fn send_frame(&mut self, message: &Message) -> Result<(), SendError> {
        self.tx.start();
        let result = message
            .wire_bytes()
            .try_for_each(|byte| self.tx.send_byte(byte));
        self.tx.stop();
        result
    }

    /// Receive a frame after [`poll_start`](Self::poll_start) fired
    ///
    /// Both pairs are idle again when this returns, whatever happened.
    pub fn receive<D: DisplaySink>(&mut self, display: &mut D) -> Disposition {
        match self.read_frame(display) {
            Ok(Inbound::Local(message)) => {
                display.show_line(1, "Recv:");
                display.move_cursor(6, 1);
                display.show_bytes(&message.payload);
                Disposition::Delivered(message)
            }
            Ok(Inbound::Foreign(message)) if message.payload.is_empty() => {
                Disposition::DroppedEmpty {
                    recipient: message.recipient,
                    sender: message.sender,
                }
            }
            Ok(Inbound::Foreign(message)) => {
                let outcome = self.relay(&message, display);
                Disposition::Relayed { message, outcome }
            }
            Ok(Inbound::Closed(disposition)) => disposition,
            Err((field, error)) => {
                show_desync(display, error);
                self.finish();
                Disposition::Desync { field, error }
            }
        }
    }

    /// Read the frame and close the inbound side
    fn read_frame<D: DisplaySink>(
        &mut self,
        display: &mut D,
    ) -> Result<Inbound, (Field, ReceiveError)> {
        let local = self.config.node_id;

        let length = self.read(Field::Length)?;
        let recipient = NodeId::from_wire(self.read(Field::Recipient)?);
        let sender = NodeId::from_wire(self.read(Field::Sender)?);

        if sender == local && recipient != local {
            self.finish();
            return Ok(Inbound::Closed(Disposition::StaleEcho { recipient, length }));
        }

        if length as usize > MAX_PAYLOAD {
            display.clear();
            display.show_text("Invalid Message:\nToo long [");
            display.show_number(i32::from(length));
            display.show_text("]");

            let drained = match self.config.oversize {
                OversizePolicy::Drain => (0..length).all(|_| self.rx.receive_byte().is_ok()),
                OversizePolicy::Abandon => false,
            };
            self.finish();
            return Ok(Inbound::Closed(Disposition::Oversize {
                length,
                recipient,
                sender,
                drained,
            }));
        }

        let mut payload: Vec<u8, MAX_PAYLOAD> = Vec::new();
        for index in 0..length {
            let byte = self.read(Field::Payload(index))?;
            // length was checked against MAX_PAYLOAD above
            let _ = payload.push(byte);
        }
        self.finish();

        let message = Message {
            recipient,
            sender,
            payload,
        };
        Ok(if recipient == local {
            Inbound::Local(message)
        } else {
            Inbound::Foreign(message)
        })
    }

    fn read(&mut self, field: Field) -> Result<u8, (Field, ReceiveError)> {
        self.rx.receive_byte().map_err(|e| (field, e))
    }

    /// Close the inbound frame: STOP on our own pair, settle, idle both
    fn finish(&mut self) {
        self.tx.stop();
        self.tx.settle();
        self.idle();
    }

    fn relay<D: DisplaySink>(&mut self, message: &Message, display: &mut D) -> SendOutcome {
        display.show_line(1, "Passing message");

        self.resync();
        let outcome = self.send(message);
        self.resync();

        display.show_line(1, "");
        outcome
    }

    /// Settle and force both pairs idle, if enabled
    fn resync(&mut self) {
        if self.config.resync.enabled {
            self.tx.settle();
            self.idle();
        }
    }
}

/// Show which handshake step lost the frame on the bottom row
fn show_desync<D: DisplaySink>(display: &mut D, error: ReceiveError) {
    display.show_line(1, "RX ");
    display.move_cursor(3, 1);
    display.show_text(error.step.label());
    display.show_text(" E");
    display.show_number(i32::from(error.step.code()));
}
