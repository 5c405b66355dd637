//! Node run loop
//!
//! One cooperative loop per node: look for an inbound START, otherwise
//! feed the next keystroke to the composer. Sending and receiving block
//! the loop until the frame is done or has timed out.

use ringlink_protocol::{ByteSink, ByteSource, Message};

use crate::compose::Composer;
use crate::message::{Disposition, MessageLink, SendOutcome};
use crate::traits::{DisplaySink, Key, KeySource};

/// Something that happened during one loop iteration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeEvent {
    /// An inbound frame was handled
    Received(Disposition),
    /// A composed message was sent or abandoned
    Sent(SendOutcome),
}

/// A ring node: link, display and keypad composer
pub struct Node<T, R, D> {
    link: MessageLink<T, R>,
    display: D,
    composer: Composer,
}

impl<T: ByteSink, R: ByteSource, D: DisplaySink> Node<T, R, D> {
    /// Create a node and draw the compose screen
    pub fn new(link: MessageLink<T, R>, mut display: D) -> Self {
        let composer = Composer::new(link.node_id());
        composer.draw(&mut display);
        Self {
            link,
            display,
            composer,
        }
    }

    pub fn link(&self) -> &MessageLink<T, R> {
        &self.link
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// One loop iteration
    ///
    /// An inbound frame takes priority. A key that arrives in the same
    /// iteration as a frame is dropped, like a keystroke interrupted by
    /// the transfer.
    pub fn poll(&mut self, key: Option<Key>) -> Option<NodeEvent> {
        if self.link.poll_start() {
            let disposition = self.link.receive(&mut self.display);
            match disposition {
                // The diagnostic cleared the screen
                Disposition::Oversize { .. } => self.composer.draw_top(&mut self.display),
                _ => self.composer.restore_cursor(&mut self.display),
            }
            return Some(NodeEvent::Received(disposition));
        }

        let message = self.composer.press(key?, &mut self.display)?;
        Some(NodeEvent::Sent(self.send(&message)))
    }

    /// Send a message directly, bypassing the composer
    pub fn send(&mut self, message: &Message) -> SendOutcome {
        self.link.send(message)
    }

    /// Run forever, handing every event and the display to `on_event`
    pub fn run<K, F>(&mut self, keys: &mut K, mut on_event: F) -> !
    where
        K: KeySource,
        F: FnMut(&NodeEvent, &mut D),
    {
        loop {
            let key = keys.poll_key();
            if let Some(event) = self.poll(key) {
                on_event(&event, &mut self.display);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkConfig;
    use crate::message::tests::{id, Event, RecordingSink, ScriptedSource};
    use crate::traits::TextBuffer;

    type TestNode = Node<RecordingSink, ScriptedSource, TextBuffer>;

    fn node(source: ScriptedSource) -> TestNode {
        let link = MessageLink::new(RecordingSink::default(), source, LinkConfig::new(id('1')));
        Node::new(link, TextBuffer::new())
    }

    #[test]
    fn test_idle_poll_does_nothing() {
        let mut node = node(ScriptedSource::default());
        assert_eq!(node.poll(None), None);
        assert_eq!(node.display().row(0), "M:           R:0");
    }

    #[test]
    fn test_keys_compose_and_send() {
        let mut node = node(ScriptedSource::default());

        assert_eq!(node.poll(Some(Key::Symbol(b'G'))), None);
        assert_eq!(node.poll(Some(Key::Advance)), None);
        assert_eq!(node.poll(Some(Key::Symbol(b'0'))), None);
        assert_eq!(node.poll(Some(Key::Symbol(b'0'))), None);
        let event = node.poll(Some(Key::Advance));

        assert_eq!(event, Some(NodeEvent::Sent(SendOutcome::Sent { attempts: 1 })));
        assert_eq!(node.link.release().0.bytes(), [1, b'1', b'1', b'G']);
    }

    #[test]
    fn test_inbound_frame_takes_priority() {
        let source = ScriptedSource::new(&[2, b'1', b'5', b'H', b'I']).with_start();
        let mut node = node(source);

        let event = node.poll(Some(Key::Symbol(b'G')));
        assert_eq!(
            event,
            Some(NodeEvent::Received(Disposition::Delivered(
                Message::new(id('1'), id('5'), b"HI").unwrap()
            )))
        );
        // The key was dropped
        assert!(node.composer().text().is_empty());
    }

    #[test]
    fn test_delivery_returns_cursor_to_typing_position() {
        let mut node = node(ScriptedSource::default());
        node.poll(Some(Key::Symbol(b'G')));

        let (tx, _) = node.link.release();
        let source = ScriptedSource::new(&[2, b'1', b'5', b'H', b'I']).with_start();
        node.link = MessageLink::new(tx, source, LinkConfig::new(id('1')));

        node.poll(None);
        assert_eq!(node.display().row(0), "M: G         R:0");
        assert_eq!(node.display().row_trimmed(1), "Recv: HI");
        assert_eq!(node.display().cursor(), (4, 0));
    }

    #[test]
    fn test_oversize_redraws_compose_row() {
        let source = ScriptedSource::new(&[11, b'1', b'5']).with_start();
        let mut node = node(source);

        let event = node.poll(None);
        assert!(matches!(
            event,
            Some(NodeEvent::Received(Disposition::Oversize { length: 11, .. }))
        ));
        assert_eq!(node.display().row(0), "M:           R:0");
        assert_eq!(node.display().row_trimmed(1), "Too long [11]");
    }

    #[test]
    fn test_relay_does_not_disturb_composer() {
        let source = ScriptedSource::new(&[1, b'2', b'5', b'Q']).with_start();
        let mut node = node(source);
        node.poll(None);

        let (tx, _) = node.link.release();
        assert_eq!(tx.count(Event::Start), 1);
        assert_eq!(tx.bytes(), [1, b'2', b'5', b'Q']);
    }
}
