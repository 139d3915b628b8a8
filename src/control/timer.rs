//! Repeating, cancellable deadline timer.
//!
//! The timer does not sleep; the event loop asks for the earliest deadline,
//! waits for it, then lets the controller fire whatever is due. All methods
//! take `now` explicitly so the controller can be driven by a test clock.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Armed {
    deadline: Instant,
    period: Duration,
}

/// A timer that repeats with a fixed period until stopped.
///
/// Equality ignores how many times the timer has been started, so two timers
/// compare equal when they are armed identically (or both stopped).
#[derive(Clone, Copy, Debug, Default)]
pub struct Timer {
    armed: Option<Armed>,
    starts: u64,
}

impl Timer {
    /// A stopped timer.
    pub const fn new() -> Self {
        Self {
            armed: None,
            starts: 0,
        }
    }

    /// (Re)arms the timer to fire `period` after `now` and every `period`
    /// after that. A zero period fires on the next poll.
    pub fn start(&mut self, period: Duration, now: Instant) {
        self.armed = Some(Armed {
            deadline: now + period,
            period,
        });
        self.starts += 1;
    }

    /// Disarms the timer; stopping a stopped timer does nothing.
    pub fn stop(&mut self) {
        self.armed = None;
    }

    pub fn is_active(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|armed| armed.deadline)
    }

    pub fn period(&self) -> Option<Duration> {
        self.armed.map(|armed| armed.period)
    }

    /// Number of times the timer has been started, identifies one arming.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| deadline <= now)
    }

    /// Consumes one expiry if the timer is due and schedules the next one.
    ///
    /// Expiries missed while the loop was busy are coalesced into this one.
    pub fn fire(&mut self, now: Instant) -> bool {
        let Some(armed) = self.armed.as_mut() else {
            return false;
        };
        if armed.deadline > now {
            return false;
        }
        let next = armed.deadline + armed.period;
        armed.deadline = if next > now { next } else { now + armed.period };
        true
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.armed == other.armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_start_and_fire() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.start(50 * MS, t0);
        assert!(timer.is_active());
        assert!(!timer.fire(t0 + 49 * MS));
        assert!(timer.fire(t0 + 50 * MS));
        assert_eq!(timer.deadline(), Some(t0 + 100 * MS));
        assert!(!timer.fire(t0 + 50 * MS));
    }

    #[test]
    fn test_missed_expiries_are_coalesced() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.start(50 * MS, t0);
        assert!(timer.fire(t0 + 420 * MS));
        assert_eq!(timer.deadline(), Some(t0 + 470 * MS));
    }

    #[test]
    fn test_zero_period_is_due_immediately() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.start(Duration::ZERO, t0);
        assert!(timer.is_due(t0));
        assert!(timer.fire(t0));
        assert!(timer.is_due(t0));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.stop();
        assert_eq!(timer, Timer::new());

        timer.start(2000 * MS, t0);
        timer.stop();
        let stopped = timer;
        timer.stop();
        assert_eq!(timer, stopped);
        assert_eq!(timer.starts(), stopped.starts());
        assert!(!timer.is_active());
        assert!(!timer.fire(t0 + 5000 * MS));
    }

    #[test]
    fn test_equality_ignores_identity() {
        let t0 = Instant::now();
        let mut a = Timer::new();
        let mut b = Timer::new();
        a.start(50 * MS, t0);
        a.start(50 * MS, t0);
        b.start(50 * MS, t0);
        assert_eq!(a, b);
        assert_ne!(a.starts(), b.starts());
    }
}
