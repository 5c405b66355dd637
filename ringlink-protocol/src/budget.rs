//! Bounded waiting
//!
//! Every wait in the protocol is a busy poll. A budget decides how long a
//! single wait may poll before it is declared lost; the firmware counts
//! polls, the host simulation measures wall-clock time.

/// Allowance for one bounded wait
pub trait WaitBudget {
    /// Begin a new wait with the full allowance
    fn restart(&mut self);

    /// Spend one poll
    ///
    /// Returns `false` once the allowance is exhausted.
    fn tick(&mut self) -> bool;
}

/// A bounded wait ran out of budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Expired;

/// Budget counting polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollBudget {
    limit: u32,
    spent: u32,
}

impl PollBudget {
    /// Create a budget allowing `limit` polls per wait
    pub const fn new(limit: u32) -> Self {
        Self { limit, spent: 0 }
    }
}

impl WaitBudget for PollBudget {
    fn restart(&mut self) {
        self.spent = 0;
    }

    fn tick(&mut self) -> bool {
        if self.spent >= self.limit {
            return false;
        }
        self.spent += 1;
        true
    }
}

impl<B: WaitBudget + ?Sized> WaitBudget for &mut B {
    fn restart(&mut self) {
        (**self).restart()
    }

    fn tick(&mut self) -> bool {
        (**self).tick()
    }
}

/// Poll `done` until it holds or the budget runs out
///
/// The condition is checked before any budget is spent, so a condition
/// that already holds always succeeds, even with a zero budget.
pub fn wait_for<B: WaitBudget>(budget: &mut B, mut done: impl FnMut() -> bool) -> Result<(), Expired> {
    budget.restart();
    loop {
        if done() {
            return Ok(());
        }
        if !budget.tick() {
            return Err(Expired);
        }
    }
}
