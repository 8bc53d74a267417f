use std::time::{Duration, Instant};

pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(250);

/// Coalesces bursts of change notifications into one recompute.
///
/// Every [`notify`](Self::notify) pushes the deadline out by the quiet window;
/// [`poll`](Self::poll) reports due exactly once after the window passes with
/// no further notifications.
#[derive(Clone, Debug)]
pub struct RecomputeScheduler {
    quiet_window: Duration,
    deadline: Option<Instant>,
    coalesced: usize,
}

impl Default for RecomputeScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_WINDOW)
    }
}

impl RecomputeScheduler {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            deadline: None,
            coalesced: 0,
        }
    }

    pub fn notify(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_window);
        self.coalesced += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn coalesced(&self) -> usize {
        self.coalesced
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.coalesced = 0;
                true
            }
            _ => false,
        }
    }

    pub(super) fn take_pending(&mut self) -> bool {
        let pending = self.deadline.take().is_some();
        self.coalesced = 0;
        pending
    }
}
