//! Deferred-callback seam for the search debounce.
//!
//! A scheduler only hands out tokens and later reports which token fired; the
//! owner of the token decides what firing means. [`TokioScheduler`] runs real
//! timers, [`ManualScheduler`] advances a virtual clock on demand.

use std::{fmt, time::Duration};

pub mod manual;
pub mod runtime;

pub use manual::ManualScheduler;
pub use runtime::TokioScheduler;

/// Identifies one scheduled timer. Tokens are never reused by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

pub trait Scheduler: Send {
    /// Arrange for `token` to fire once `delay` has elapsed.
    fn schedule(&mut self, delay: Duration) -> TimerToken;

    /// Prevent `token` from firing. Unknown, fired and already cancelled tokens are ignored.
    fn cancel(&mut self, token: TimerToken);
}
