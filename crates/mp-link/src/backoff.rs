//! Exponential backoff with jitter for (re)connecting to the vehicle.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
    attempts: u32,
    max_attempts: Option<u32>,
    jitter_ratio: f64,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        let max = max.max(base);
        Self {
            base,
            max,
            current: base,
            attempts: 0,
            max_attempts: None,
            jitter_ratio: 0.2,
        }
    }

    /// Give up after `attempts` failures.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.current = self.base;
        self.attempts = 0;
    }

    /// Record a failure and return how long to wait before retrying, or
    /// `None` once the attempt budget is spent.
    pub fn fail(&mut self) -> Option<Duration> {
        self.attempts += 1;
        if self.max_attempts.is_some_and(|max| self.attempts >= max) {
            return None;
        }
        let delay = add_jitter(self.current, self.jitter_ratio);
        self.current = self.current.saturating_mul(2).min(self.max);
        Some(delay)
    }
}

fn add_jitter(delay: Duration, ratio: f64) -> Duration {
    if !(0.0..=1.0).contains(&ratio) {
        return delay;
    }
    let jitter_ms_max = (delay.as_millis() as f64 * ratio) as u64;
    if jitter_ms_max == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms_max))
}
