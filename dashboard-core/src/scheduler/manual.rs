use std::time::Duration;

use super::{Scheduler, TimerToken};

/// Scheduler driven by an explicit virtual clock.
///
/// Nothing fires until [`ManualScheduler::advance`] moves the clock past a
/// timer's due time.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<(Duration, TimerToken)>,
    scheduled: usize,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward and return the timers that fired, earliest first.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerToken> {
        self.now += by;
        let now = self.now;

        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(at, _)| *at <= now);
        self.pending = rest;

        due.sort();
        due.into_iter().map(|(_, token)| token).collect()
    }

    /// Due time of a timer that has neither fired nor been cancelled.
    pub fn due_at(&self, token: TimerToken) -> Option<Duration> {
        self.pending
            .iter()
            .find(|(_, t)| *t == token)
            .map(|(at, _)| *at)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Total number of `schedule` calls.
    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    /// Number of `cancel` calls that actually removed a pending timer.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        let token = TimerToken::new(self.next_id);
        self.next_id += 1;
        self.scheduled += 1;
        self.pending.push((self.now + delay, token));
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        let before = self.pending.len();
        self.pending.retain(|(_, t)| *t != token);
        if self.pending.len() < before {
            self.cancelled += 1;
        }
    }
}
