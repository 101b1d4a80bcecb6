use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

/// Time source for order expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = match self.elapsed.lock() {
            Ok(elapsed) => elapsed,
            Err(poisoned) => poisoned.into_inner(),
        };
        *elapsed += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = match self.elapsed.lock() {
            Ok(elapsed) => *elapsed,
            Err(poisoned) => *poisoned.into_inner(),
        };
        self.start + elapsed
    }
}
