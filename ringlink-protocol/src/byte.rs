//! Byte transfer with acknowledgement handshake
//!
//! A byte is eight clock pulses, most significant bit first. The sender
//! changes data while clock is low and raises clock once data is stable;
//! the receiver samples on the rising edge. A ninth pulse carries the
//! acknowledgement:
//!
//! ```text
//! sender                      receiver
//! ──────                      ────────
//! 8 × (clock↓, data=b, clock↑)   8 × (wait clock↓, wait clock↑, sample)
//! ack already low? → fail
//! clock↓, data=0                 wait clock↓
//! wait ack↓                      ack=0
//! clock↑                         wait clock↑
//!                                wait clock↓ (next byte) or data↑ (STOP)
//!                                ack=1
//! ```
//!
//! Data is held low during the acknowledgement pulse so the STOP that
//! follows the last byte of a frame is a visible data edge.

use embedded_hal::delay::DelayNs;
use ringlink_hal::Level;

use crate::budget::{wait_for, WaitBudget};
use crate::phy::{Receiver, RxLines, Transmitter, TxLines};

/// Byte send failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// Ack-in was already low before the handshake began (peer out of step)
    PrematureAck,
    /// Ack-in never fell within the budget
    AckTimeout,
}

/// Receive wait that timed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveStep {
    /// Waiting for clock to fall before a data bit
    BitClockFall,
    /// Waiting for clock to rise on a data bit
    BitClockRise,
    /// Waiting for clock to fall after the eighth bit
    AckRequest,
    /// Waiting for the acknowledgement pulse to rise
    AckPulseRise,
    /// Waiting for the acknowledgement pulse to end
    AckPulseEnd,
}

impl ReceiveStep {
    /// Numeric step code shown in diagnostics
    pub fn code(self) -> u8 {
        match self {
            ReceiveStep::BitClockFall => 0,
            ReceiveStep::BitClockRise => 1,
            ReceiveStep::AckRequest => 2,
            ReceiveStep::AckPulseRise => 3,
            ReceiveStep::AckPulseEnd => 4,
        }
    }

    /// Edge that was expected
    pub fn label(self) -> &'static str {
        match self {
            ReceiveStep::BitClockFall | ReceiveStep::AckRequest | ReceiveStep::AckPulseEnd => {
                "CLK1->0"
            }
            ReceiveStep::BitClockRise | ReceiveStep::AckPulseRise => "CLK0->1",
        }
    }
}

/// Byte receive failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveError {
    /// Wait that timed out
    pub step: ReceiveStep,
    /// Bits fully received before the timeout
    pub bit: u8,
    /// Bits accumulated before the timeout
    pub partial: u8,
}

impl<L: TxLines, T: DelayNs, B: WaitBudget> Transmitter<L, T, B> {
    /// Send one byte and wait for its acknowledgement
    pub fn send_byte(&mut self, value: u8) -> Result<(), SendError> {
        for shift in (0..8).rev() {
            let bit = Level::from(value & (1 << shift) != 0);
            self.lines.set_clock(Level::Low);
            self.set_data(bit);
            self.set_clock(Level::High);
        }

        if self.lines.ack().is_low() {
            return Err(SendError::PrematureAck);
        }

        self.lines.set_clock(Level::Low);
        self.set_data(Level::Low);

        let lines = &self.lines;
        wait_for(&mut self.budget, || lines.ack().is_low()).map_err(|_| SendError::AckTimeout)?;

        self.set_clock(Level::High);
        Ok(())
    }
}

impl<L: RxLines, T: DelayNs, B: WaitBudget> Receiver<L, T, B> {
    /// Receive one byte and acknowledge it
    pub fn receive_byte(&mut self) -> Result<u8, ReceiveError> {
        let mut value = 0u8;
        self.lines.set_ack(Level::High);

        for bit in 0..8 {
            self.wait_clock(Level::Low)
                .map_err(|timeout| timeout.at(ReceiveStep::BitClockFall, bit, value))?;
            self.wait_clock(Level::High)
                .map_err(|timeout| timeout.at(ReceiveStep::BitClockRise, bit, value))?;
            value = (value << 1) | u8::from(self.lines.data().is_high());
        }

        self.wait_clock(Level::Low)
            .map_err(|timeout| timeout.at(ReceiveStep::AckRequest, 8, value))?;
        self.set_ack(Level::Low);
        self.wait_clock(Level::High)
            .map_err(|timeout| timeout.at(ReceiveStep::AckPulseRise, 8, value))?;

        let lines = &self.lines;
        wait_for(&mut self.budget, || {
            lines.clock().is_low() || lines.data().is_high()
        })
        .map_err(|_| Timeout.at(ReceiveStep::AckPulseEnd, 8, value))?;

        self.lines.set_ack(Level::High);
        Ok(value)
    }

    fn wait_clock(&mut self, level: Level) -> Result<(), Timeout> {
        let lines = &self.lines;
        wait_for(&mut self.budget, || lines.clock() == level).map_err(|_| Timeout)
    }
}

/// Internal marker for an expired edge wait
struct Timeout;

impl Timeout {
    fn at(self, step: ReceiveStep, bit: u8, partial: u8) -> ReceiveError {
        ReceiveError { step, bit, partial }
    }
}

/// Sending direction as used by the message layer
pub trait ByteSink {
    /// Generate the START condition
    fn start(&mut self);

    /// Send one acknowledged byte
    fn send_byte(&mut self, value: u8) -> Result<(), SendError>;

    /// Generate the STOP condition
    fn stop(&mut self);

    /// Hold the lines for the settle delay
    fn settle(&mut self);

    /// Force the outbound pair idle
    fn idle(&mut self);
}

/// Receiving direction as used by the message layer
pub trait ByteSource {
    /// Watch for a START condition
    fn poll_start(&mut self) -> bool;

    /// Receive one byte and acknowledge it
    fn receive_byte(&mut self) -> Result<u8, ReceiveError>;

    /// Force ack-out idle
    fn idle(&mut self);
}

impl<L: TxLines, T: DelayNs, B: WaitBudget> ByteSink for Transmitter<L, T, B> {
    fn start(&mut self) {
        self.send_start();
    }

    fn send_byte(&mut self, value: u8) -> Result<(), SendError> {
        Transmitter::send_byte(self, value)
    }

    fn stop(&mut self) {
        self.send_stop();
    }

    fn settle(&mut self) {
        Transmitter::settle(self);
    }

    fn idle(&mut self) {
        Transmitter::idle(self);
    }
}

impl<L: RxLines, T: DelayNs, B: WaitBudget> ByteSource for Receiver<L, T, B> {
    fn poll_start(&mut self) -> bool {
        Receiver::poll_start(self)
    }

    fn receive_byte(&mut self) -> Result<u8, ReceiveError> {
        Receiver::receive_byte(self)
    }

    fn idle(&mut self) {
        Receiver::idle(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::PollBudget;
    use crate::phy::tests::{NoDelay, RecordingTx};
    use crate::phy::Timing;
    use core::cell::Cell;
    use heapless::Vec;

    /// Bits latched on every rising clock edge of a recording
    fn latched_bits(writes: &[(Level, Level)]) -> Vec<Level, 16> {
        let mut bits = Vec::new();
        let mut clock = Level::High;
        for &(c, d) in writes {
            if clock.is_low() && c.is_high() {
                let _ = bits.push(d);
            }
            clock = c;
        }
        bits
    }

    /// Outbound pair whose receiver acknowledges as soon as clock drops after 8 bits
    struct AckingTx {
        inner: RecordingTx,
        falls: u8,
    }

    impl TxLines for AckingTx {
        fn set_clock(&mut self, level: Level) {
            if level.is_low() && self.inner.clock.is_high() {
                self.falls += 1;
                if self.falls == 9 {
                    self.inner.ack = Level::Low;
                }
            }
            self.inner.set_clock(level);
        }

        fn set_data(&mut self, level: Level) {
            self.inner.set_data(level);
        }

        fn ack(&self) -> Level {
            self.inner.ack
        }
    }

    #[test]
    fn test_send_byte_msb_first_with_ack_pulse() {
        let lines = AckingTx {
            inner: RecordingTx::new(),
            falls: 0,
        };
        let mut tx = Transmitter::new(lines, NoDelay, PollBudget::new(10), Timing::default());
        tx.lines.inner.writes.clear();
        tx.lines.falls = 0;

        assert_eq!(tx.send_byte(0b1011_0010), Ok(()));

        let bits = latched_bits(&tx.lines.inner.writes);
        use Level::{High as H, Low as L};
        // 8 data bits then the handshake pulse with data held low
        assert_eq!(bits.as_slice(), &[H, L, H, H, L, L, H, L, L]);
        assert_eq!(tx.lines.inner.clock, Level::High);
    }

    #[test]
    fn test_send_byte_premature_ack() {
        let mut lines = RecordingTx::new();
        lines.ack = Level::Low;
        let mut tx = Transmitter::new(lines, NoDelay, PollBudget::new(10), Timing::default());

        assert_eq!(tx.send_byte(0x55), Err(SendError::PrematureAck));
    }

    #[test]
    fn test_send_byte_ack_timeout() {
        let mut tx = Transmitter::new(RecordingTx::new(), NoDelay, PollBudget::new(50), Timing::default());

        assert_eq!(tx.send_byte(0x55), Err(SendError::AckTimeout));
        // Clock is left low, waiting for the ack that never came
        let (lines, _, _) = tx.release();
        assert_eq!(lines.clock, Level::Low);
    }

    /// Inbound pair replaying a waveform; each clock sample advances one step
    struct Waveform<'a> {
        steps: &'a [(Level, Level)],
        next: Cell<usize>,
        current: Cell<usize>,
        ack: Level,
        ack_history: Vec<Level, 8>,
    }

    impl<'a> Waveform<'a> {
        fn new(steps: &'a [(Level, Level)]) -> Self {
            Self {
                steps,
                next: Cell::new(0),
                current: Cell::new(0),
                ack: Level::High,
                ack_history: Vec::new(),
            }
        }
    }

    impl RxLines for Waveform<'_> {
        fn clock(&self) -> Level {
            let index = self.next.get().min(self.steps.len() - 1);
            self.current.set(index);
            self.next.set(index + 1);
            self.steps[index].0
        }

        fn data(&self) -> Level {
            self.steps[self.current.get()].1
        }

        fn set_ack(&mut self, level: Level) {
            if level != self.ack {
                let _ = self.ack_history.push(level);
            }
            self.ack = level;
        }
    }

    /// Waveform of one byte as driven by the sender, ending with STOP
    fn byte_waveform(value: u8) -> Vec<(Level, Level), 24> {
        use Level::{High as H, Low as L};
        let mut steps = Vec::new();
        let _ = steps.push((H, L));
        for shift in (0..8).rev() {
            let bit = Level::from(value & (1 << shift) != 0);
            let _ = steps.push((L, bit));
            let _ = steps.push((H, bit));
        }
        // acknowledgement pulse, then STOP
        let _ = steps.push((L, L));
        let _ = steps.push((H, L));
        let _ = steps.push((H, H));
        steps
    }

    #[test]
    fn test_receive_byte_from_waveform() {
        let steps = byte_waveform(0xC5);
        let mut rx = Receiver::new(Waveform::new(&steps), NoDelay, PollBudget::new(10), Timing::default());

        assert_eq!(rx.receive_byte(), Ok(0xC5));
        // ack asserted once for the handshake, then released
        assert_eq!(rx.lines.ack_history.as_slice(), &[Level::Low, Level::High]);
    }

    #[test]
    fn test_receive_byte_reports_step_of_timeout() {
        let steps = byte_waveform(0xFF);
        // Sender vanishes after the fourth bit was clocked
        let truncated = &steps[..9];
        let mut rx = Receiver::new(Waveform::new(truncated), NoDelay, PollBudget::new(10), Timing::default());

        let err = rx.receive_byte().unwrap_err();
        assert_eq!(err.step, ReceiveStep::BitClockFall);
        assert_eq!(err.bit, 4);
        assert_eq!(err.partial, 0x0F);
    }

    #[test]
    fn test_receive_byte_missing_ack_pulse() {
        let steps = byte_waveform(0x01);
        // Clock never rises for the acknowledgement pulse
        let truncated = &steps[..18];
        let mut rx = Receiver::new(Waveform::new(truncated), NoDelay, PollBudget::new(10), Timing::default());

        let err = rx.receive_byte().unwrap_err();
        assert_eq!(err.step, ReceiveStep::AckPulseRise);
        assert_eq!(err.step.code(), 3);
        assert_eq!(err.partial, 0x01);
    }

    #[test]
    fn test_step_codes_are_distinct() {
        let steps = [
            ReceiveStep::BitClockFall,
            ReceiveStep::BitClockRise,
            ReceiveStep::AckRequest,
            ReceiveStep::AckPulseRise,
            ReceiveStep::AckPulseEnd,
        ];
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.code() as usize, i);
        }
        assert_eq!(ReceiveStep::AckPulseRise.label(), "CLK0->1");
    }
}
