//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop flag, checked by the run loop between ticks.
///
/// Clones share the flag, so a signal handler or another thread can hold one
/// while the simulation holds the other.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arm the flag for the next run.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// How [`Sim::run`][crate::Sim::run] ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every configured tick was simulated.
    Completed,
    /// The stop signal was raised; statistics cover the ticks simulated so far.
    Interrupted,
}
