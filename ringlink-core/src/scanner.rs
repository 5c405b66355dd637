//! Matrix keypad scanner
//!
//! Rows are outputs idling high, columns are inputs with pull-ups. A row
//! is selected by driving it low; a pressed key then pulls its column low.

use embedded_hal::delay::DelayNs;
use ringlink_hal::{InputPin, OutputPin};

use crate::config::KEYPAD_LINES;
use crate::traits::{Key, KeySource};

/// Time for a selected row to reach the columns
const ROW_SETTLE_US: u32 = 10;

/// 4x4 matrix keypad reporting each key once, on release
pub struct MatrixKeypad<R, C, T> {
    rows: [R; KEYPAD_LINES],
    cols: [C; KEYPAD_LINES],
    delay: T,
    held: Option<Key>,
}

impl<R: OutputPin, C: InputPin, T: DelayNs> MatrixKeypad<R, C, T> {
    /// Take the matrix lines and deselect every row
    pub fn new(mut rows: [R; KEYPAD_LINES], cols: [C; KEYPAD_LINES], delay: T) -> Self {
        for row in rows.iter_mut() {
            row.set_high();
        }
        Self {
            rows,
            cols,
            delay,
            held: None,
        }
    }

    /// Key currently held down, if any
    pub fn held(&self) -> Option<Key> {
        self.held
    }

    /// First pressed key in scan order
    pub fn scan(&mut self) -> Option<Key> {
        for row in 0..KEYPAD_LINES {
            self.rows[row].set_low();
            self.delay.delay_us(ROW_SETTLE_US);
            let col = self.cols.iter().position(|c| c.is_low());
            self.rows[row].set_high();

            if let Some(col) = col {
                return Key::from_matrix(row, col);
            }
        }
        None
    }
}

impl<R: OutputPin, C: InputPin, T: DelayNs> KeySource for MatrixKeypad<R, C, T> {
    fn poll_key(&mut self) -> Option<Key> {
        let pressed = self.scan();
        match (self.held, pressed) {
            (None, Some(key)) => {
                self.held = Some(key);
                None
            }
            (Some(key), None) => {
                self.held = None;
                Some(key)
            }
            _ => None,
        }
    }
}
