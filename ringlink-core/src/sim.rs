//! Host simulation of the two-wire link
//!
//! A [`wire`] is one direction of the ring: clock and data driven by the
//! upstream node, ack driven by the downstream node. Each end runs in its
//! own thread.
//!
//! Real hardware relies on the bit delay being long enough for the
//! receiver to sample every level. Threads give no such guarantee, so the
//! sender's [`WireDelay`] waits until the receiver has sampled the clock
//! twice since the last write instead of sleeping. The receiver may be
//! arbitrarily slow without losing an edge.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use ringlink_protocol::{Level, Receiver, RxLines, Timing, Transmitter, TxLines, WaitBudget};

/// How long a sender waits for a receiver that has stopped sampling
const RECEIVER_GONE: Duration = Duration::from_secs(1);

/// Default allowance for every handshake wait in simulation
pub const SIM_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug)]
struct State {
    clock: Level,
    data: Level,
    ack: Level,
    /// Clock samples taken since the sender last wrote
    samples: u32,
    /// Last write or sample, whichever is later
    activity: Instant,
    receiver_dropped: bool,
}

type Shared = Arc<Mutex<State>>;

fn lock(shared: &Shared) -> MutexGuard<'_, State> {
    // A panicking test thread must not hide the real failure behind poisoning
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

/// Create one direction of the ring, all lines idle
pub fn wire() -> (TxEnd, RxEnd) {
    let shared = Arc::new(Mutex::new(State {
        clock: Level::High,
        data: Level::High,
        ack: Level::High,
        samples: 0,
        activity: Instant::now(),
        receiver_dropped: false,
    }));
    (TxEnd(shared.clone()), RxEnd(shared))
}

/// Upstream end: drives clock and data, reads ack
#[derive(Debug)]
pub struct TxEnd(Shared);

impl TxEnd {
    /// Delay that holds this end until the receiver has caught up
    pub fn delay(&self) -> WireDelay {
        WireDelay(self.0.clone())
    }

    /// Wrap in a [`Transmitter`] with wall-clock budgets
    pub fn into_transmitter(self, wait: Duration) -> SimTransmitter {
        let delay = self.delay();
        Transmitter::new(self, delay, ClockBudget::new(wait), Timing::default())
    }

    fn write(&mut self, f: impl FnOnce(&mut State)) {
        let mut state = lock(&self.0);
        f(&mut state);
        state.samples = 0;
        state.activity = Instant::now();
    }
}

impl TxLines for TxEnd {
    fn set_clock(&mut self, level: Level) {
        self.write(|s| s.clock = level);
    }

    fn set_data(&mut self, level: Level) {
        self.write(|s| s.data = level);
    }

    fn ack(&self) -> Level {
        thread::yield_now();
        lock(&self.0).ack
    }
}

/// Downstream end: reads clock and data, drives ack
#[derive(Debug)]
pub struct RxEnd(Shared);

impl RxEnd {
    /// Wrap in a [`Receiver`] with wall-clock budgets
    pub fn into_receiver(self, wait: Duration) -> SimReceiver {
        Receiver::new(self, YieldDelay, ClockBudget::new(wait), Timing::default())
    }
}

impl RxLines for RxEnd {
    fn clock(&self) -> Level {
        thread::yield_now();
        let mut state = lock(&self.0);
        state.samples = state.samples.saturating_add(1);
        state.activity = Instant::now();
        state.clock
    }

    fn data(&self) -> Level {
        lock(&self.0).data
    }

    fn set_ack(&mut self, level: Level) {
        lock(&self.0).ack = level;
    }
}

impl Drop for RxEnd {
    fn drop(&mut self) {
        lock(&self.0).receiver_dropped = true;
    }
}

/// Sender delay: returns once the receiver has sampled the latest write
#[derive(Debug, Clone)]
pub struct WireDelay(Shared);

impl DelayNs for WireDelay {
    fn delay_ns(&mut self, _ns: u32) {
        loop {
            {
                let state = lock(&self.0);
                if state.samples >= 2
                    || state.receiver_dropped
                    || state.activity.elapsed() > RECEIVER_GONE
                {
                    return;
                }
            }
            thread::yield_now();
        }
    }
}

/// Receiver delay: lets the other threads run
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldDelay;

impl DelayNs for YieldDelay {
    fn delay_ns(&mut self, _ns: u32) {
        thread::yield_now();
    }
}

/// Budget measured in wall-clock time
#[derive(Debug, Clone, Copy)]
pub struct ClockBudget {
    limit: Duration,
    started: Instant,
}

impl ClockBudget {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            started: Instant::now(),
        }
    }
}

impl WaitBudget for ClockBudget {
    fn restart(&mut self) {
        self.started = Instant::now();
    }

    fn tick(&mut self) -> bool {
        self.started.elapsed() < self.limit
    }
}

/// Transmitter on a simulated wire
pub type SimTransmitter = Transmitter<TxEnd, WireDelay, ClockBudget>;

/// Receiver on a simulated wire
pub type SimReceiver = Receiver<RxEnd, YieldDelay, ClockBudget>;

/// Outbound pair with nobody listening; acks never arrive
pub fn unconnected_transmitter(wait: Duration) -> SimTransmitter {
    let (tx, _) = wire();
    tx.into_transmitter(wait)
}

/// Inbound pair with nobody sending; lines stay idle
pub fn unconnected_receiver(wait: Duration) -> SimReceiver {
    let (_, rx) = wire();
    rx.into_receiver(wait)
}
