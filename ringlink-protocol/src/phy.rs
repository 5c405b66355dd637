//! Physical layer
//!
//! Owns the two line pairs of a node and generates the frame boundary
//! conditions:
//!
//! - START: clock held high while data falls 1→0
//! - STOP: data rises 0→1 while clock is high
//!
//! Every transition is followed by [`Timing::bit_delay_us`] so the peer
//! samples stable levels. START is additionally held for
//! [`Timing::start_hold_us`], which must outlast one pass of the peer's
//! polling loop. Nothing here can fail; a lost peer only shows up as a
//! handshake timeout in the byte layer.

use embedded_hal::delay::DelayNs;
use ringlink_hal::{InputPin, Level, OutputPin};

use crate::budget::WaitBudget;

/// Line timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Delay after every line transition, in microseconds
    pub bit_delay_us: u32,
    /// Delay used to let the lines settle around stop and relay, in microseconds
    pub settle_delay_us: u32,
    /// How long START is held before the first bit, in microseconds
    ///
    /// The receiver samples for START once per node loop iteration, so
    /// this must be longer than one iteration.
    pub start_hold_us: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            bit_delay_us: 20,
            settle_delay_us: 200,
            start_hold_us: 500,
        }
    }
}

/// Outbound pair as seen by the sending node
pub trait TxLines {
    /// Drive clock-out
    fn set_clock(&mut self, level: Level);

    /// Drive data-out
    fn set_data(&mut self, level: Level);

    /// Sample ack-in
    fn ack(&self) -> Level;
}

/// Inbound pair as seen by the receiving node
pub trait RxLines {
    /// Sample clock-in
    fn clock(&self) -> Level;

    /// Sample data-in
    fn data(&self) -> Level;

    /// Drive ack-out
    fn set_ack(&mut self, level: Level);
}

/// Outbound pair built from HAL pins
pub struct TxPins<C, D, A> {
    /// Clock-out
    pub clock: C,
    /// Data-out
    pub data: D,
    /// Ack-in
    pub ack: A,
}

impl<C: OutputPin, D: OutputPin, A: InputPin> TxLines for TxPins<C, D, A> {
    fn set_clock(&mut self, level: Level) {
        self.clock.set_level(level);
    }

    fn set_data(&mut self, level: Level) {
        self.data.set_level(level);
    }

    fn ack(&self) -> Level {
        self.ack.level()
    }
}

/// Inbound pair built from HAL pins
pub struct RxPins<C, D, A> {
    /// Clock-in
    pub clock: C,
    /// Data-in
    pub data: D,
    /// Ack-out
    pub ack: A,
}

impl<C: InputPin, D: InputPin, A: OutputPin> RxLines for RxPins<C, D, A> {
    fn clock(&self) -> Level {
        self.clock.level()
    }

    fn data(&self) -> Level {
        self.data.level()
    }

    fn set_ack(&mut self, level: Level) {
        self.ack.set_level(level);
    }
}

/// Sending side of a node: drives the outbound pair
pub struct Transmitter<L, T, B> {
    pub(crate) lines: L,
    pub(crate) delay: T,
    /// Budget for the acknowledgement wait
    pub(crate) budget: B,
    pub(crate) timing: Timing,
}

impl<L: TxLines, T: DelayNs, B: WaitBudget> Transmitter<L, T, B> {
    /// Take ownership of the outbound pair and drive it idle
    pub fn new(lines: L, delay: T, budget: B, timing: Timing) -> Self {
        let mut tx = Self {
            lines,
            delay,
            budget,
            timing,
        };
        tx.idle();
        tx
    }

    /// Return clock-out and data-out to their idle level
    pub fn idle(&mut self) {
        self.lines.set_clock(Level::High);
        self.lines.set_data(Level::High);
    }

    /// Generate the START condition
    pub fn send_start(&mut self) {
        self.set_clock(Level::High);
        self.set_data(Level::Low);
        self.delay.delay_us(self.timing.start_hold_us);
    }

    /// Generate the STOP condition, leaving the pair idle
    pub fn send_stop(&mut self) {
        self.set_clock(Level::High);
        self.set_data(Level::High);
    }

    /// Hold the lines for the settle delay
    pub fn settle(&mut self) {
        self.delay.delay_us(self.timing.settle_delay_us);
    }

    /// Release the lines, delay and budget
    pub fn release(self) -> (L, T, B) {
        (self.lines, self.delay, self.budget)
    }

    pub(crate) fn set_clock(&mut self, level: Level) {
        self.lines.set_clock(level);
        self.delay.delay_us(self.timing.bit_delay_us);
    }

    pub(crate) fn set_data(&mut self, level: Level) {
        self.lines.set_data(level);
        self.delay.delay_us(self.timing.bit_delay_us);
    }
}

/// Receiving side of a node: samples the inbound pair and drives ack-out
pub struct Receiver<L, T, B> {
    pub(crate) lines: L,
    pub(crate) delay: T,
    /// Budget for each edge wait
    pub(crate) budget: B,
    pub(crate) timing: Timing,
    /// Last (clock, data) seen by the start watcher
    last: (Level, Level),
}

impl<L: RxLines, T: DelayNs, B: WaitBudget> Receiver<L, T, B> {
    /// Take ownership of the inbound pair and drive ack-out idle
    pub fn new(lines: L, delay: T, budget: B, timing: Timing) -> Self {
        let mut rx = Self {
            lines,
            delay,
            budget,
            timing,
            last: (Level::High, Level::High),
        };
        rx.idle();
        rx
    }

    /// Return ack-out to its idle level and forget past line activity
    pub fn idle(&mut self) {
        self.lines.set_ack(Level::High);
        self.last = (self.lines.clock(), self.lines.data());
    }

    /// Watch for a START condition on the inbound pair
    ///
    /// Returns `true` once per observed transition from (clock high, data
    /// high) to (clock high, data low).
    pub fn poll_start(&mut self) -> bool {
        let clock = self.lines.clock();
        let data = self.lines.data();
        let (last_clock, last_data) = self.last;
        self.last = (clock, data);

        clock.is_high() && last_clock.is_high() && data.is_low() && last_data.is_high()
    }

    /// Release the lines, delay and budget
    pub fn release(self) -> (L, T, B) {
        (self.lines, self.delay, self.budget)
    }

    pub(crate) fn set_ack(&mut self, level: Level) {
        self.lines.set_ack(level);
        self.delay.delay_us(self.timing.bit_delay_us);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::budget::PollBudget;
    use core::cell::Cell;

    /// Delay that returns immediately
    pub struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    /// Outbound pair recording every write
    pub struct RecordingTx {
        pub clock: Level,
        pub data: Level,
        pub ack: Level,
        pub writes: heapless::Vec<(Level, Level), 128>,
    }

    impl RecordingTx {
        pub fn new() -> Self {
            Self {
                clock: Level::Low,
                data: Level::Low,
                ack: Level::High,
                writes: heapless::Vec::new(),
            }
        }
    }

    impl TxLines for RecordingTx {
        fn set_clock(&mut self, level: Level) {
            self.clock = level;
            let _ = self.writes.push((self.clock, self.data));
        }

        fn set_data(&mut self, level: Level) {
            self.data = level;
            let _ = self.writes.push((self.clock, self.data));
        }

        fn ack(&self) -> Level {
            self.ack
        }
    }

    /// Inbound pair with fixed levels
    pub struct StaticRx {
        pub clock: Level,
        pub data: Level,
        pub ack: Level,
    }

    impl RxLines for StaticRx {
        fn clock(&self) -> Level {
            self.clock
        }

        fn data(&self) -> Level {
            self.data
        }

        fn set_ack(&mut self, level: Level) {
            self.ack = level;
        }
    }

    #[test]
    fn test_transmitter_starts_idle() {
        let tx = Transmitter::new(RecordingTx::new(), NoDelay, PollBudget::new(10), Timing::default());
        let (lines, _, _) = tx.release();
        assert_eq!((lines.clock, lines.data), (Level::High, Level::High));
    }

    #[test]
    fn test_start_condition_is_data_falling_under_high_clock() {
        let mut tx = Transmitter::new(RecordingTx::new(), NoDelay, PollBudget::new(10), Timing::default());
        tx.lines.writes.clear();
        tx.send_start();

        assert_eq!(
            tx.lines.writes.as_slice(),
            &[(Level::High, Level::High), (Level::High, Level::Low)]
        );
    }

    #[test]
    fn test_stop_condition_returns_to_idle() {
        let mut tx = Transmitter::new(RecordingTx::new(), NoDelay, PollBudget::new(10), Timing::default());
        tx.send_start();
        tx.lines.writes.clear();
        tx.send_stop();

        assert_eq!(
            tx.lines.writes.as_slice(),
            &[(Level::High, Level::Low), (Level::High, Level::High)]
        );
    }

    #[test]
    fn test_receiver_detects_start_once() {
        let lines = StaticRx {
            clock: Level::High,
            data: Level::High,
            ack: Level::Low,
        };
        let mut rx = Receiver::new(lines, NoDelay, PollBudget::new(10), Timing::default());
        assert_eq!(rx.lines.ack, Level::High);

        assert!(!rx.poll_start());
        rx.lines.data = Level::Low;
        assert!(rx.poll_start());
        // Lines unchanged: not a new transition
        assert!(!rx.poll_start());
    }

    #[test]
    fn test_data_falling_with_clock_low_is_not_start() {
        let lines = StaticRx {
            clock: Level::Low,
            data: Level::High,
            ack: Level::High,
        };
        let mut rx = Receiver::new(lines, NoDelay, PollBudget::new(10), Timing::default());

        rx.lines.data = Level::Low;
        assert!(!rx.poll_start());
    }

    /// Delay advancing a shared virtual clock, in nanoseconds
    struct VirtualDelay<'a>(&'a Cell<u32>);

    impl DelayNs for VirtualDelay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.0.set(self.0.get() + ns);
        }
    }

    /// Outbound pair logging (time, clock, data) on every write
    struct TimedTx<'a> {
        now: &'a Cell<u32>,
        clock: Level,
        data: Level,
        trace: heapless::Vec<(u32, Level, Level), 64>,
    }

    impl TxLines for TimedTx<'_> {
        fn set_clock(&mut self, level: Level) {
            self.clock = level;
            let _ = self.trace.push((self.now.get(), self.clock, self.data));
        }

        fn set_data(&mut self, level: Level) {
            self.data = level;
            let _ = self.trace.push((self.now.get(), self.clock, self.data));
        }

        fn ack(&self) -> Level {
            Level::High
        }
    }

    /// Send START and one byte, then sample the waveform every `period_ns`
    /// from `phase_ns` on with a real start watcher
    fn start_seen(timing: Timing, period_ns: u32, phase_ns: u32) -> bool {
        let now = Cell::new(0);
        let lines = TimedTx {
            now: &now,
            clock: Level::Low,
            data: Level::Low,
            trace: heapless::Vec::new(),
        };
        let mut tx = Transmitter::new(lines, VirtualDelay(&now), PollBudget::new(4), timing);
        tx.send_start();
        // All ones: the only data-low-under-high-clock span is START itself
        let _ = tx.send_byte(0xFF);
        let end = now.get();

        let idle = StaticRx {
            clock: Level::High,
            data: Level::High,
            ack: Level::High,
        };
        let mut rx = Receiver::new(idle, NoDelay, PollBudget::new(1), timing);

        let mut t = phase_ns;
        while t <= end {
            let (_, clock, data) = tx
                .lines
                .trace
                .iter()
                .rev()
                .find(|(at, _, _)| *at <= t)
                .copied()
                .unwrap_or((0, Level::High, Level::High));
            rx.lines.clock = clock;
            rx.lines.data = data;
            if rx.poll_start() {
                return true;
            }
            t += period_ns;
        }
        false
    }

    #[test]
    fn test_start_outlasts_polling_loop() {
        // Four keypad rows at 10us each plus overhead
        const LOOP_NS: u32 = 45_000;

        for phase in (0..LOOP_NS).step_by(1_000) {
            assert!(
                start_seen(Timing::default(), LOOP_NS, phase),
                "START missed at phase {}ns",
                phase
            );
        }
    }

    #[test]
    fn test_unheld_start_is_missed_by_slow_poller() {
        const LOOP_NS: u32 = 45_000;
        let brief = Timing {
            start_hold_us: 0,
            ..Timing::default()
        };

        let seen = (0..LOOP_NS)
            .step_by(1_000)
            .filter(|phase| start_seen(brief, LOOP_NS, *phase))
            .count();
        assert_eq!(seen, 20);
    }
}
