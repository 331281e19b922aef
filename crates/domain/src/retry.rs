use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Liveness probe retry policy
///
/// The delay before retry `i` (0-based) is `base_delay + i` seconds, so the
/// wait grows linearly: `base, base+1s, base+2s, ...`. At least one probe is
/// always issued, even with `attempts == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    pub fn from_secs(attempts: u32, base_delay_secs: u64) -> Self {
        Self::new(attempts, Duration::from_secs(base_delay_secs))
    }

    /// Total number of probes, including the first one
    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Number of probes issued after the first one fails
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// Delay slept before retry `index`, saturating at `Duration::MAX`
    pub fn delay_for(&self, index: u32) -> Duration {
        self.base_delay
            .saturating_add(Duration::from_secs(u64::from(index)))
    }

    /// All retry delays in order
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.retries()).map(|i| self.delay_for(i))
    }
}
