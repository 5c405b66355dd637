//! Keypad input
//!
//! The node is operated from a 4x4 matrix keypad. The left three columns
//! carry multi-tap letter groups like a phone keypad; the right column
//! holds the function keys.
//!
//! ```text
//!        col0   col1   col2   col3
//! row0    A      B      C      D        Commit Backspace Spare Advance
//! row1   GHI    PQRS   CDE    space
//! row2   DEF    MNO    WXY    0-9
//! row3   ABC    JKL    TUV    *
//! ```

/// Logical key of the keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// Character key; the value is the first character of its group
    Symbol(u8),
    /// Ends the current multi-tap cycle
    Commit,
    /// Deletes the last message character
    Backspace,
    /// Unassigned; ends the current multi-tap cycle
    Spare,
    /// Moves from message to recipient, then sends
    Advance,
}

/// Scan order of the keypad matrix, row by row
const MATRIX: [Key; 16] = [
    Key::Commit,
    Key::Backspace,
    Key::Spare,
    Key::Advance,
    Key::Symbol(b'G'),
    Key::Symbol(b'P'),
    Key::Symbol(b'C'),
    Key::Symbol(b' '),
    Key::Symbol(b'D'),
    Key::Symbol(b'M'),
    Key::Symbol(b'W'),
    Key::Symbol(b'0'),
    Key::Symbol(b'A'),
    Key::Symbol(b'J'),
    Key::Symbol(b'T'),
    Key::Symbol(b'*'),
];

impl Key {
    /// Key at a matrix position
    pub fn from_matrix(row: usize, col: usize) -> Option<Self> {
        if row >= 4 || col >= 4 {
            return None;
        }
        MATRIX.get(row * 4 + col).copied()
    }

    /// Number of characters reached by tapping this key repeatedly
    pub fn group_width(self) -> u8 {
        match self {
            Key::Symbol(b'P') => 4,
            Key::Symbol(b'0') => 10,
            Key::Symbol(_) => 3,
            _ => 0,
        }
    }
}

/// Source of complete keystrokes
pub trait KeySource {
    /// Next completed (pressed and released) key, if any
    fn poll_key(&mut self) -> Option<Key>;
}

impl<K: KeySource + ?Sized> KeySource for &mut K {
    fn poll_key(&mut self) -> Option<Key> {
        (**self).poll_key()
    }
}
