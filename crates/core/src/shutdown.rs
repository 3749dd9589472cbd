//! Graceful-stop race between the engine's acknowledgement and a deadline

use crossbeam_channel::{after, never, Receiver};
use std::time::{Duration, Instant};

/// How long the engine gets to save and acknowledge a stop request
pub const STOP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Engine answered with `backendStopped`
    Acknowledged,
    /// Deadline fired first
    TimedOut,
}

/// First resolution wins; the loser is ignored
#[derive(Debug)]
pub struct ShutdownRace {
    deadline: Receiver<Instant>,
    armed_at: Option<Instant>,
    outcome: Option<ShutdownOutcome>,
}

impl Default for ShutdownRace {
    fn default() -> Self {
        Self {
            deadline: never(),
            armed_at: None,
            outcome: None,
        }
    }
}

impl ShutdownRace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the deadline. Returns `false` if already armed or resolved.
    pub fn arm(&mut self, timeout: Duration) -> bool {
        if self.armed_at.is_some() || self.outcome.is_some() {
            return false;
        }
        self.armed_at = Some(Instant::now());
        self.deadline = after(timeout);
        true
    }

    /// Fires once when the armed deadline passes; never fires otherwise
    pub fn deadline(&self) -> Receiver<Instant> {
        self.deadline.clone()
    }

    /// Record an outcome. Returns it only if this call won the race.
    pub fn resolve(&mut self, outcome: ShutdownOutcome) -> Option<ShutdownOutcome> {
        if self.outcome.is_some() {
            return None;
        }
        self.outcome = Some(outcome);
        self.deadline = never();
        if let Some(armed_at) = self.armed_at {
            tracing::debug!("Shutdown resolved as {:?} after {:?}", outcome, armed_at.elapsed());
        }
        Some(outcome)
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn outcome(&self) -> Option<ShutdownOutcome> {
        self.outcome
    }
}
