use std::{collections::HashMap, time::Duration};

use tokio::{sync::mpsc, task::AbortHandle};
use tracing::trace;

use super::{Scheduler, TimerToken};

/// Scheduler backed by tokio timers.
///
/// Each timer is a spawned task that sleeps and then sends its token on the
/// channel returned by [`TokioScheduler::new`]. Cancelling aborts the task.
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    next_id: u64,
    timers: HashMap<TimerToken, AbortHandle>,
    fired: mpsc::UnboundedSender<TimerToken>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (fired, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: 0,
            timers: HashMap::new(),
            fired,
        };
        (scheduler, rx)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        self.timers.retain(|_, handle| !handle.is_finished());

        let token = TimerToken::new(self.next_id);
        self.next_id += 1;

        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the owner shut down; nothing to notify.
            let _ = fired.send(token);
        });

        trace!(%token, ?delay, "timer scheduled");
        self.timers.insert(token, task.abort_handle());
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(handle) = self.timers.remove(&token) {
            trace!(%token, "timer cancelled");
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}
