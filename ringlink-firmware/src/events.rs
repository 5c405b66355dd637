//! Event logging
//!
//! The LCD is mirrored to RTT whenever an event changed it, so a bench
//! setup without a display can still follow the ring.

use defmt::*;
use ringlink_core::message::{Disposition, SendOutcome};
use ringlink_core::node::NodeEvent;
use ringlink_core::traits::TextBuffer;

pub fn log_event(event: &NodeEvent, lcd: &mut TextBuffer) {
    match event {
        NodeEvent::Received(disposition) => log_disposition(disposition),
        NodeEvent::Sent(SendOutcome::Sent { attempts }) => {
            info!("Sent after {} attempt(s)", attempts);
        }
        NodeEvent::Sent(SendOutcome::Abandoned {
            attempts,
            last_error,
        }) => {
            warn!("Send abandoned after {} attempts: {}", attempts, last_error);
        }
    }

    if lcd.take_dirty() {
        debug!("LCD |{}|", lcd.row(0));
        debug!("LCD |{}|", lcd.row(1));
    }
}

fn log_disposition(disposition: &Disposition) {
    match disposition {
        Disposition::Delivered(message) => match message.payload_str() {
            Some(text) => info!("Message from {}: {}", message.sender.as_char(), text),
            None => info!(
                "Message from {}: {=[u8]:a}",
                message.sender.as_char(),
                &message.payload[..]
            ),
        },
        Disposition::Relayed { message, outcome } => {
            if outcome.is_sent() {
                info!(
                    "Relayed {} -> {}",
                    message.sender.as_char(),
                    message.recipient.as_char()
                );
            } else {
                warn!(
                    "Relay {} -> {} abandoned: {}",
                    message.sender.as_char(),
                    message.recipient.as_char(),
                    outcome
                );
            }
        }
        Disposition::DroppedEmpty { recipient, sender } => {
            info!(
                "Dropped empty frame {} -> {}",
                sender.as_char(),
                recipient.as_char()
            );
        }
        Disposition::StaleEcho { recipient, length } => {
            warn!(
                "Own frame for {} came back ({} bytes), recipient not on the ring",
                recipient.as_char(),
                length
            );
        }
        Disposition::Oversize {
            length, drained, ..
        } => {
            warn!("Oversize frame, length {} (drained: {})", length, drained);
        }
        Disposition::Desync { field, error } => {
            warn!(
                "Lost sync reading {}: step {} bit {}",
                field,
                error.step.code(),
                error.bit
            );
        }
    }
}
