use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic time source for reaction-time capture.
pub trait Clock {
    type Timestamp: Copy;
    fn now(&self) -> Self::Timestamp;
    /// Milliseconds elapsed since `since`.
    fn elapsed_ms(&self, since: Self::Timestamp) -> f64;
}

/// Wall-clock implementation over `Instant`, nanosecond timestamps.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed_ms(&self, since: u64) -> f64 {
        self.now().saturating_sub(since) as f64 / 1e6
    }
}

/// Deterministic clock for tests; time moves only when advanced explicitly.
/// Clones share the same underlying time, so a test can keep a handle while
/// a session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ns: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ns.set(self.now_ns.get() + ms * 1_000_000);
    }
}

impl Clock for ManualClock {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.now_ns.get()
    }

    fn elapsed_ms(&self, since: u64) -> f64 {
        self.now_ns.get().saturating_sub(since) as f64 / 1e6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_in_milliseconds() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance_ms(250);
        assert_eq!(clock.elapsed_ms(start), 250.0);
        clock.advance_ms(250);
        assert_eq!(clock.elapsed_ms(start), 500.0);
    }

    #[test]
    fn monotonic_clock_never_runs_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(clock.elapsed_ms(a) >= 0.0);
    }
}
