use std::time::Duration;

use rand::Rng;

/// Attempt limit and capped exponential backoff shared by every retry loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryBudget {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait before the first retry, doubled on every further attempt
    pub base_wait_secs: f64,
    /// Upper bound of the unjittered wait
    pub cap_secs: f64,
}

impl RetryBudget {
    pub const DEFAULT_CAP_SECS: f64 = 300.0;

    pub fn new(max_attempts: u32, base_wait_secs: f64) -> Self {
        Self {
            max_attempts,
            base_wait_secs,
            cap_secs: Self::DEFAULT_CAP_SECS,
        }
    }

    /// `min(cap, base * 2^attempt)` in seconds. Negative or NaN bases count as zero.
    fn raw_secs(&self, attempt: u32) -> f64 {
        let base = self.base_wait_secs.max(0.0);
        // 2^1023 is the largest finite power, keeps `0 * 2^n` at zero
        let exp = attempt.min(1023) as i32;
        (base * 2f64.powi(exp)).min(self.cap_secs)
    }

    /// Unjittered wait for an attempt
    pub fn ceiling(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.raw_secs(attempt))
    }

    /// Jittered wait for an attempt, `floor(raw * U[0.5, 1.5))` whole seconds
    pub fn wait(&self, attempt: u32) -> Duration {
        self.wait_with(&mut rand::rng(), attempt)
    }

    pub fn wait_with<R: Rng + ?Sized>(&self, rng: &mut R, attempt: u32) -> Duration {
        let jitter: f64 = rng.random_range(0.5..1.5);
        Duration::from_secs((self.raw_secs(attempt) * jitter).floor() as u64)
    }
}
