//! Time sources for order timestamping.
//!
//! The engine stamps `ts_received`/`ts_executed` from a [`Clock`] when the
//! caller supplies none. Injecting the clock at construction keeps
//! timestamping deterministic in tests and replays.

use std::cell::Cell;
use std::rc::Rc;

use chrono::Utc;
use tickmatch_types::Nanos;

/// Monotonic nanosecond time source.
pub trait Clock {
    /// "Now" in nanoseconds since the UNIX epoch. Never goes backwards
    /// across calls on the same clock.
    fn now(&mut self) -> Nanos;
}

/// Wall clock, clamped so a system time step backwards cannot produce a
/// decreasing timestamp.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Nanos,
}

impl Clock for SystemClock {
    #[allow(clippy::cast_sign_loss)]
    fn now(&mut self) -> Nanos {
        let wall = Utc::now()
            .timestamp_nanos_opt()
            .map_or(0, |ns| ns.max(0) as Nanos);
        self.last = self.last.max(wall);
        self.last
    }
}

/// Hand-driven clock for deterministic tests and historical replays.
/// Clones share the underlying time, so a test can keep a handle while
/// the engine owns the boxed clock.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<Nanos>>);

impl ManualClock {
    #[must_use]
    pub fn starting_at(now: Nanos) -> Self {
        Self(Rc::new(Cell::new(now)))
    }

    pub fn set(&self, now: Nanos) {
        self.0.set(now);
    }

    pub fn advance(&self, delta: Nanos) {
        self.0.set(self.0.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> Nanos {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let mut clock = SystemClock::default();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(a > 0);
    }

    #[test]
    fn manual_clock_is_shared_across_clones() {
        let clock = ManualClock::starting_at(100);
        let mut held_by_engine = clock.clone();
        assert_eq!(held_by_engine.now(), 100);
        clock.advance(50);
        assert_eq!(held_by_engine.now(), 150);
        clock.set(7);
        assert_eq!(held_by_engine.now(), 7);
    }
}
