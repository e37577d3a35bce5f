//! Time-based gates: a trailing-edge debouncer and a leading-edge throttle. Both are driven by
//! explicit timestamps rather than timers, so that they're deterministic.

use std::time::{Duration, Instant};

/// How long parameter changes are allowed to settle before the population is rebuilt.
pub const RESET_DELAY: Duration = Duration::from_millis(20);

/// The minimum time between two accepted bursts.
pub const BURST_WINDOW: Duration = Duration::from_millis(1200);

/// Coalesces a flurry of requests into a single action, once the requests stop for `delay`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// How long to wait after the most recent request
    delay: Duration,
    /// When the action is due, if one is pending
    deadline: Option<Instant>,
}

impl Debouncer {
    /// A debouncer with nothing pending.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Request the action, pushing back any pending deadline.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Forget any pending request.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Is there a pending request?
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true`, exactly once, when a pending request has become due.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Accepts the first request, then refuses everything else until `window` has passed.
#[derive(Debug, Clone)]
pub struct Throttle {
    /// Minimum time between accepted requests
    window: Duration,
    /// When the last request was accepted
    last: Option<Instant>,
}

impl Throttle {
    /// A throttle that will accept the very next request.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Returns whether the request is accepted, and if so starts a new window.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self
            .last
            .is_some_and(|last| now.saturating_duration_since(last) < self.window)
        {
            return false;
        }
        self.last = Some(now);
        true
    }
}
