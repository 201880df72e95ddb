use std::time::{Duration, Instant};

/// Monotonic time source for the generation deadline.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&mut self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now(&mut self) -> Duration {
        (**self).now()
    }
}

/// Wall clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Deterministic clock: every reading advances time by a fixed step.
///
/// The loop reads the clock once at start and once before every iteration,
/// so a limit of `(n + 1) * step` yields exactly `n` iterations.
#[derive(Debug, Clone)]
pub struct TickClock {
    current: Duration,
    step: Duration,
}

impl TickClock {
    pub fn new(step: Duration) -> Self {
        Self {
            current: Duration::ZERO,
            step,
        }
    }
}

impl Clock for TickClock {
    fn now(&mut self) -> Duration {
        let reading = self.current;
        self.current += self.step;
        reading
    }
}

/// Wall-clock deadline of a run. Read-only once the loop starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationBudget {
    start: Duration,
    limit: Duration,
}

impl GenerationBudget {
    pub fn new(start: Duration, limit: Duration) -> Self {
        Self { start, limit }
    }

    pub fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.start)
    }

    pub fn exhausted(&self, now: Duration) -> bool {
        self.elapsed(now) >= self.limit
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}
