//! Exponential backoff between polls of one feed.

use crate::error::FeedError;
use std::time::Duration;

/// Delay policy for a single feed.
///
/// With `k` consecutive failures the next poll waits
/// `min(nominal * multiplier^k, max)`. One success resets `k`.
#[derive(Debug, Clone)]
pub struct Backoff {
    nominal: Duration,
    max: Duration,
    multiplier: u32,
    failures: u32,
    retry_after: Option<Duration>,
}

impl Backoff {
    /// Create a policy for a feed polled every `nominal`.
    ///
    /// The cap never drops below `nominal`, and a multiplier of zero is
    /// treated as one.
    pub fn new(nominal: Duration, multiplier: u32, max: Duration) -> Self {
        Self {
            nominal,
            max: max.max(nominal),
            multiplier: multiplier.max(1),
            failures: 0,
            retry_after: None,
        }
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// How long to wait before the next poll.
    pub fn next_delay(&self) -> Duration {
        if self.failures == 0 {
            return self.nominal;
        }
        let scaled = self
            .multiplier
            .checked_pow(self.failures)
            .and_then(|factor| self.nominal.checked_mul(factor))
            .unwrap_or(self.max);
        let delay = scaled.min(self.max);
        match self.retry_after {
            Some(hint) => delay.max(hint).min(self.max),
            None => delay,
        }
    }

    /// Record a successful poll.
    pub fn on_success(&mut self) {
        self.failures = 0;
        self.retry_after = None;
    }

    /// Record a failed poll.
    pub fn on_failure(&mut self, err: &FeedError) {
        self.failures = self.failures.saturating_add(1);
        self.retry_after = err.retry_after();
    }
}
