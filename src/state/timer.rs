//! Deadline-driven timing primitives.
//!
//! The crate is pure state: nothing here spawns threads or sleeps. Sessions
//! own these values and the host drives them by polling with its clock
//! (`poll()` on the session, or `poll_at(now)` in tests). A session holds at
//! most one of each inside an `Option`; dropping or replacing the `Option` is
//! how a pending effect is cancelled.

use std::time::{Duration, Instant};

/// A single deadline.
#[derive(Debug, Clone, Copy)]
pub struct OneShot {
    due_at: Instant,
}

impl OneShot {
    /// Deadline `delay` from now.
    pub fn after(delay: Duration) -> Self {
        Self::at(Instant::now() + delay)
    }

    /// Deadline at an explicit instant.
    pub fn at(due_at: Instant) -> Self {
        Self { due_at }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due_at
    }

    pub fn due_at(&self) -> Instant {
        self.due_at
    }
}

/// A fixed-interval recurring deadline.
///
/// `due_ticks` returns how many whole intervals have elapsed since the last
/// call and advances the internal deadline past them, so a late poll catches
/// up instead of losing ticks.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    next_due: Instant,
    interval: Duration,
}

impl Countdown {
    /// Start ticking now.
    pub fn new(interval: Duration) -> Self {
        Self::start_at(Instant::now(), interval)
    }

    /// Start ticking from an explicit instant.
    pub fn start_at(now: Instant, interval: Duration) -> Self {
        Self {
            next_due: now + interval,
            interval,
        }
    }

    /// Consume and return the number of intervals due at `now`.
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        let mut ticks = 0;
        while now >= self.next_due {
            self.next_due += self.interval;
            ticks += 1;
        }
        ticks
    }
}
