//! Character display sink
//!
//! The node reports received messages and link diagnostics on a small
//! character LCD. Writes are fire-and-forget: a display cannot fail the
//! link.

use core::fmt::Write;

use heapless::String;

/// Width of the character display
pub const DISPLAY_WIDTH: u8 = 16;

/// Character display
pub trait DisplaySink {
    /// Write text at the cursor; `'\n'` moves to the start of the next row
    fn show_text(&mut self, text: &str);

    /// Write a decimal number at the cursor
    fn show_number(&mut self, value: i32);

    /// Move the cursor
    fn move_cursor(&mut self, col: u8, row: u8);

    /// Blank the screen and home the cursor
    fn clear(&mut self);

    /// Columns per row
    fn width(&self) -> u8 {
        DISPLAY_WIDTH
    }
}

impl<D: DisplaySink + ?Sized> DisplaySink for &mut D {
    fn show_text(&mut self, text: &str) {
        (**self).show_text(text)
    }

    fn show_number(&mut self, value: i32) {
        (**self).show_number(value)
    }

    fn move_cursor(&mut self, col: u8, row: u8) {
        (**self).move_cursor(col, row)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn width(&self) -> u8 {
        (**self).width()
    }
}

/// Helpers for common screen updates
pub trait DisplayExt: DisplaySink {
    /// Replace a whole row with `text`, padding with spaces
    fn show_line(&mut self, row: u8, text: &str) {
        self.move_cursor(0, row);
        self.show_text(text);

        let used = text.chars().count().min(self.width() as usize);
        for _ in used..self.width() as usize {
            self.show_text(" ");
        }
    }

    /// Write raw bytes, showing anything unprintable as `?`
    fn show_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            let printable = [if b == b' ' || b.is_ascii_graphic() { b } else { b'?' }];
            // Printable ASCII is always valid UTF-8
            if let Ok(s) = core::str::from_utf8(&printable) {
                self.show_text(s);
            }
        }
    }
}

impl<D: DisplaySink + ?Sized> DisplayExt for D {}

/// In-memory character grid
///
/// Behaves like a character LCD: text past the right edge is dropped,
/// `'\n'` starts the next row. Used on the host and by the firmware, which
/// mirrors the grid to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer<const W: usize = 16, const H: usize = 2> {
    cells: [[u8; W]; H],
    col: usize,
    row: usize,
    dirty: bool,
}

impl<const W: usize, const H: usize> TextBuffer<W, H> {
    /// Create a blank buffer
    pub const fn new() -> Self {
        Self {
            cells: [[b' '; W]; H],
            col: 0,
            row: 0,
            dirty: false,
        }
    }

    /// Contents of a row, including trailing spaces
    pub fn row(&self, row: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| core::str::from_utf8(r).ok())
            .unwrap_or("")
    }

    /// Contents of a row without trailing spaces
    pub fn row_trimmed(&self, row: usize) -> &str {
        self.row(row).trim_end()
    }

    /// Current cursor as (column, row)
    pub fn cursor(&self) -> (usize, usize) {
        (self.col, self.row)
    }

    /// Check and reset the changed flag
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    fn put(&mut self, c: char) {
        if c == '\n' {
            self.col = 0;
            self.row = (self.row + 1).min(H.saturating_sub(1));
            return;
        }

        let byte = if c.is_ascii() && !c.is_ascii_control() {
            c as u8
        } else {
            b'?'
        };

        if let Some(cell) = self.cells.get_mut(self.row).and_then(|r| r.get_mut(self.col)) {
            *cell = byte;
            self.dirty = true;
        }
        self.col = (self.col + 1).min(W);
    }
}

impl<const W: usize, const H: usize> Default for TextBuffer<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> DisplaySink for TextBuffer<W, H> {
    fn show_text(&mut self, text: &str) {
        for c in text.chars() {
            self.put(c);
        }
    }

    fn show_number(&mut self, value: i32) {
        let mut s: String<12> = String::new();
        // i32 is at most 11 characters
        let _ = write!(s, "{}", value);
        self.show_text(&s);
    }

    fn move_cursor(&mut self, col: u8, row: u8) {
        self.col = (col as usize).min(W);
        self.row = (row as usize).min(H.saturating_sub(1));
    }

    fn clear(&mut self) {
        self.cells = [[b' '; W]; H];
        self.col = 0;
        self.row = 0;
        self.dirty = true;
    }

    fn width(&self) -> u8 {
        W.min(u8::MAX as usize) as u8
    }
}
