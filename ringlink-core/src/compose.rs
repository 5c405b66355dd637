//! Keypad message composer
//!
//! Messages are typed on the keypad with multi-tap: tapping the same key
//! again replaces the character just typed with the next one in the key's
//! group (A→B→C→A). Any other key starts a new character.
//!
//! Screen layout (16x2):
//!
//! ```text
//! M: HELLO     R:2
//! Recv: HI
//! ```
//!
//! The top row belongs to the composer; the bottom row is left to the
//! message layer for inbound messages and diagnostics.

use heapless::Vec;
use ringlink_protocol::{Message, NodeId, COMPOSE_MAX};

use crate::traits::{DisplaySink, Key};

/// Column where message text starts, after "M: "
const TEXT_COL: u8 = 3;

/// Composer input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ComposeState {
    /// Typing the message text
    Message,
    /// Choosing the recipient id
    Recipient,
}

/// Builds outgoing messages from keystrokes
#[derive(Debug, Clone)]
pub struct Composer {
    local: NodeId,
    state: ComposeState,
    text: Vec<u8, COMPOSE_MAX>,
    recipient: NodeId,
    /// Symbol key whose character was applied last, for multi-tap
    last: Option<u8>,
    /// Offset into the last key's group
    tap: u8,
}

impl Composer {
    /// Create a composer for the node `local`
    pub fn new(local: NodeId) -> Self {
        Self {
            local,
            state: ComposeState::Message,
            text: Vec::new(),
            recipient: NodeId::from_wire(b'0'),
            last: None,
            tap: 0,
        }
    }

    pub fn state(&self) -> ComposeState {
        self.state
    }

    /// Message text typed so far
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Currently selected recipient
    pub fn recipient(&self) -> NodeId {
        self.recipient
    }

    /// Redraw the whole screen
    pub fn draw<D: DisplaySink>(&self, display: &mut D) {
        display.clear();
        self.draw_top(display);
    }

    /// Redraw the composer row and put the cursor back, leaving the
    /// bottom row alone
    pub fn draw_top<D: DisplaySink>(&self, display: &mut D) {
        let width = display.width();
        display.move_cursor(0, 0);
        display.show_text("M: ");
        for &b in &self.text {
            show_char(display, b);
        }
        for _ in TEXT_COL as usize + self.text.len()..width.saturating_sub(3) as usize {
            display.show_text(" ");
        }
        display.move_cursor(width.saturating_sub(3), 0);
        display.show_text("R:");
        show_char(display, self.recipient.as_byte());
        self.restore_cursor(display);
    }

    /// Move the cursor to where the user is typing
    pub fn restore_cursor<D: DisplaySink>(&self, display: &mut D) {
        match self.state {
            ComposeState::Message => display.move_cursor(TEXT_COL + self.text.len() as u8, 0),
            ComposeState::Recipient => display.move_cursor(display.width().saturating_sub(1), 0),
        }
    }

    /// Apply one keystroke
    ///
    /// Returns the finished message when the user sends it.
    pub fn press<D: DisplaySink>(&mut self, key: Key, display: &mut D) -> Option<Message> {
        let repeat = matches!(key, Key::Symbol(s) if self.last == Some(s));
        self.tap = if repeat {
            (self.tap + 1) % key.group_width().max(1)
        } else {
            0
        };
        self.last = None;

        match key {
            Key::Commit | Key::Spare => None,
            Key::Backspace => {
                if self.state == ComposeState::Message && self.text.pop().is_some() {
                    let col = TEXT_COL + self.text.len() as u8;
                    display.move_cursor(col, 0);
                    display.show_text(" ");
                    display.move_cursor(col, 0);
                }
                None
            }
            Key::Advance => self.advance(display),
            Key::Symbol(base) => {
                self.type_symbol(base, repeat, display);
                None
            }
        }
    }

    fn type_symbol<D: DisplaySink>(&mut self, base: u8, repeat: bool, display: &mut D) {
        let c = base.wrapping_add(self.tap);

        match self.state {
            ComposeState::Message => {
                if repeat {
                    self.text.pop();
                }
                if self.text.push(c).is_ok() {
                    display.move_cursor(TEXT_COL + self.text.len() as u8 - 1, 0);
                    show_char(display, c);
                    self.last = Some(base);
                }
            }
            ComposeState::Recipient => {
                // Cycle through the group even over non-hex characters
                self.last = Some(base);
                if let Ok(id) = NodeId::parse(c as char) {
                    self.recipient = id;
                    display.move_cursor(display.width().saturating_sub(1), 0);
                    show_char(display, id.as_byte());
                    display.move_cursor(display.width().saturating_sub(1), 0);
                }
            }
        }
    }

    fn advance<D: DisplaySink>(&mut self, display: &mut D) -> Option<Message> {
        match self.state {
            ComposeState::Message => {
                self.state = ComposeState::Recipient;
                self.restore_cursor(display);
                None
            }
            ComposeState::Recipient => {
                // COMPOSE_MAX is below MAX_PAYLOAD so this cannot fail
                let message = Message::new(self.recipient, self.local, &self.text).ok();
                self.text.clear();
                self.state = ComposeState::Message;
                self.draw(display);
                message
            }
        }
    }
}

fn show_char<D: DisplaySink>(display: &mut D, c: u8) {
    let buf = [c];
    match core::str::from_utf8(&buf) {
        Ok(s) => display.show_text(s),
        Err(_) => display.show_text("?"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TextBuffer;
    use proptest::prelude::*;

    fn id(c: char) -> NodeId {
        NodeId::parse(c).unwrap()
    }

    fn press_all(composer: &mut Composer, lcd: &mut TextBuffer, keys: &[Key]) -> Option<Message> {
        let mut sent = None;
        for key in keys {
            if let Some(m) = composer.press(*key, lcd) {
                sent = Some(m);
            }
        }
        sent
    }

    const G: Key = Key::Symbol(b'G');
    const D: Key = Key::Symbol(b'D');
    const J: Key = Key::Symbol(b'J');
    const M: Key = Key::Symbol(b'M');
    const P: Key = Key::Symbol(b'P');
    const ZERO: Key = Key::Symbol(b'0');

    #[test]
    fn test_initial_screen() {
        let composer = Composer::new(id('1'));
        let mut lcd: TextBuffer = TextBuffer::new();
        composer.draw(&mut lcd);

        assert_eq!(lcd.row(0), "M:           R:0");
        assert_eq!(lcd.cursor(), (3, 0));
    }

    #[test]
    fn test_multi_tap_hello() {
        let mut composer = Composer::new(id('1'));
        let mut lcd: TextBuffer = TextBuffer::new();
        composer.draw(&mut lcd);

        #[rustfmt::skip]
        let keys = [
            G, G,           // H
            D, D,           // E
            J, J, J,        // L
            Key::Commit,
            J, J, J,        // L
            M, M, M,        // O
        ];
        press_all(&mut composer, &mut lcd, &keys);

        assert_eq!(composer.text(), b"HELLO");
        assert_eq!(lcd.row(0), "M: HELLO     R:0");
        assert_eq!(lcd.cursor(), (8, 0));
    }

    #[test]
    fn test_group_wraps() {
        let mut composer = Composer::new(id('1'));
        let mut lcd: TextBuffer = TextBuffer::new();

        press_all(&mut composer, &mut lcd, &[G, G, G, G]);
        assert_eq!(composer.text(), b"G");

        press_all(&mut composer, &mut lcd, &[Key::Spare, P, P, P, P]);
        assert_eq!(composer.text(), b"GS");

        press_all(&mut composer, &mut lcd, &[P]);
        assert_eq!(composer.text(), b"GP");

        let mut digits = [ZERO; 10];
        digits[0] = Key::Commit;
        press_all(&mut composer, &mut lcd, &digits);
        assert_eq!(composer.text(), b"GP8");
    }

    #[test]
    fn test_backspace() {
        let mut composer = Composer::new(id('1'));
        let mut lcd: TextBuffer = TextBuffer::new();
        composer.draw(&mut lcd);

        press_all(&mut composer, &mut lcd, &[G, Key::Commit, G, Key::Backspace]);
        assert_eq!(composer.text(), b"G");
        assert_eq!(lcd.row_trimmed(0), "M: G         R:0");
        assert_eq!(lcd.cursor(), (4, 0));

        // Tapping again after a backspace starts a fresh character
        press_all(&mut composer, &mut lcd, &[G]);
        assert_eq!(composer.text(), b"GG");
    }

    #[test]
    fn test_backspace_on_empty_is_noop() {
        let mut composer = Composer::new(id('1'));
        let mut lcd: TextBuffer = TextBuffer::new();
        press_all(&mut composer, &mut lcd, &[Key::Backspace, Key::Backspace]);
        assert!(composer.text().is_empty());
    }

    #[test]
    fn test_recipient_accepts_hex_only() {
        let mut composer = Composer::new(id('1'));
        let mut lcd: TextBuffer = TextBuffer::new();
        composer.draw(&mut lcd);

        press_all(&mut composer, &mut lcd, &[Key::Advance]);
        assert_eq!(composer.state(), ComposeState::Recipient);
        assert_eq!(lcd.cursor(), (15, 0));

        // G/H/I are not ids
        press_all(&mut composer, &mut lcd, &[G, G]);
        assert_eq!(composer.recipient(), id('0'));

        // D, E
        press_all(&mut composer, &mut lcd, &[Key::Commit, D, D]);
        assert_eq!(composer.recipient(), id('E'));
        assert_eq!(lcd.row(0), "M:           R:E");

        // 0, 1, 2
        press_all(&mut composer, &mut lcd, &[ZERO, ZERO, ZERO]);
        assert_eq!(composer.recipient(), id('2'));
    }

    #[test]
    fn test_send_and_reset() {
        let mut composer = Composer::new(id('1'));
        let mut lcd: TextBuffer = TextBuffer::new();
        composer.draw(&mut lcd);

        let sent = press_all(
            &mut composer,
            &mut lcd,
            &[M, Key::Advance, ZERO, ZERO, ZERO, Key::Advance],
        );

        let message = sent.unwrap();
        assert_eq!(message.recipient, id('2'));
        assert_eq!(message.sender, id('1'));
        assert_eq!(&message.payload[..], b"M");

        assert_eq!(composer.state(), ComposeState::Message);
        assert!(composer.text().is_empty());
        // Recipient is kept for the next message
        assert_eq!(lcd.row(0), "M:           R:2");
        assert_eq!(lcd.cursor(), (3, 0));
    }

    #[test]
    fn test_empty_message_can_be_sent() {
        let mut composer = Composer::new(id('1'));
        let mut lcd: TextBuffer = TextBuffer::new();
        let sent = press_all(&mut composer, &mut lcd, &[Key::Advance, Key::Advance]);
        assert_eq!(sent, Some(Message::empty(id('0'), id('1'))));
    }

    #[test]
    fn test_full_message_still_cycles_last_char() {
        let mut composer = Composer::new(id('1'));
        let mut lcd: TextBuffer = TextBuffer::new();

        let mut keys = std::vec::Vec::new();
        for i in 0..COMPOSE_MAX {
            if i > 0 {
                keys.push(Key::Commit);
            }
            keys.push(G);
        }
        press_all(&mut composer, &mut lcd, &keys);
        assert_eq!(composer.text().len(), COMPOSE_MAX);

        // Tapping the same key cycles the last character in place
        press_all(&mut composer, &mut lcd, &[G]);
        assert_eq!(composer.text().len(), COMPOSE_MAX);
        assert_eq!(composer.text().last(), Some(&b'H'));

        // A new key has no room
        press_all(&mut composer, &mut lcd, &[M, M]);
        assert_eq!(composer.text().len(), COMPOSE_MAX);
        assert_eq!(composer.text().last(), Some(&b'H'));
    }

    fn any_key() -> impl Strategy<Value = Key> {
        prop_oneof![
            Just(Key::Commit),
            Just(Key::Backspace),
            Just(Key::Spare),
            Just(Key::Advance),
            (0usize..4, 0usize..4).prop_map(|(r, c)| Key::from_matrix(r, c).unwrap()),
        ]
    }

    proptest! {
        #[test]
        fn prop_composed_messages_are_well_formed(keys in proptest::collection::vec(any_key(), 0..64)) {
            let mut composer = Composer::new(id('7'));
            let mut lcd: TextBuffer = TextBuffer::new();
            composer.draw(&mut lcd);

            for key in keys {
                if let Some(message) = composer.press(key, &mut lcd) {
                    prop_assert!(message.payload.len() <= COMPOSE_MAX);
                    prop_assert!(message.recipient.is_hex());
                    prop_assert_eq!(message.sender, id('7'));
                }
                prop_assert!(composer.text().len() <= COMPOSE_MAX);
                prop_assert!(composer.recipient().is_hex());
                prop_assert_eq!(lcd.row(0).len(), 16);
            }
        }
    }
}
