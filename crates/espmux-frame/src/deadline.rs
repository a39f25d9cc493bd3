use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source polled by the reassembly loops.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Called while waiting for the port to produce bytes.
    fn idle(&self) {}
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn idle(&self) {
        (**self).idle()
    }
}

/// Wall-clock time. Yields to the scheduler while idle.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn idle(&self) {
        std::thread::yield_now();
    }
}

/// Clock that moves forward a fixed step every time it is read.
///
/// Makes deadlines count polls instead of wall time, so replaying a capture
/// (or a test) behaves the same regardless of machine speed.
#[derive(Debug, Clone)]
pub struct StepClock {
    origin: Instant,
    elapsed: Cell<Duration>,
    step: Duration,
}

impl StepClock {
    /// One millisecond per reading.
    pub fn new() -> Self {
        Self::with_step(Duration::from_millis(1))
    }

    pub fn with_step(step: Duration) -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
            step,
        }
    }

    /// Time that has passed on this clock.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StepClock {
    fn now(&self) -> Instant {
        let elapsed = self.elapsed.get();
        self.elapsed.set(elapsed + self.step);
        self.origin + elapsed
    }
}

/// Time budget for one reassembly attempt.
///
/// A zero budget is "immediate": the attempt may only look at bytes already
/// waiting and never waits for more.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start a budget of `timeout_ms` milliseconds now.
    pub fn start<C: Clock + ?Sized>(clock: &C, timeout_ms: u32) -> Self {
        Self {
            start: clock.now(),
            budget: Duration::from_millis(u64::from(timeout_ms)),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn is_immediate(&self) -> bool {
        self.budget.is_zero()
    }

    /// True once the budget is spent. Immediate deadlines never expire; the
    /// loops stop them when the port runs dry instead.
    pub fn expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        !self.is_immediate() && clock.now().saturating_duration_since(self.start) >= self.budget
    }

    /// Budget left, zero once expired.
    pub fn remaining<C: Clock + ?Sized>(&self, clock: &C) -> Duration {
        self.budget
            .saturating_sub(clock.now().saturating_duration_since(self.start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_clock_advances_per_reading() {
        let clock = StepClock::with_step(Duration::from_millis(2));
        let a = clock.now();
        let b = clock.now();
        assert_eq!(b - a, Duration::from_millis(2));
        assert_eq!(clock.elapsed(), Duration::from_millis(4));
    }

    #[test]
    fn deadline_expires_after_budget() {
        let clock = StepClock::new();
        let deadline = Deadline::start(&clock, 3);
        // start took t=0; readings at t=1, t=2 are inside the budget.
        assert!(!deadline.expired(&clock));
        assert!(!deadline.expired(&clock));
        assert!(deadline.expired(&clock));
    }

    #[test]
    fn immediate_deadline_never_expires() {
        let clock = StepClock::new();
        let deadline = Deadline::start(&clock, 0);
        assert!(deadline.is_immediate());
        for _ in 0..100 {
            assert!(!deadline.expired(&clock));
        }
        assert_eq!(deadline.remaining(&clock), Duration::ZERO);
    }

    #[test]
    fn remaining_shrinks() {
        let clock = StepClock::with_step(Duration::from_millis(10));
        let deadline = Deadline::start(&clock, 50);
        assert_eq!(deadline.remaining(&clock), Duration::from_millis(40));
        assert_eq!(deadline.budget(), Duration::from_millis(50));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        clock.idle();
        assert!(clock.now() >= a);
    }
}
