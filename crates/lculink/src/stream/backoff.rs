// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use rand::Rng;

/// Upper bound (exclusive) of the random jitter added to each delay.
pub const DEFAULT_JITTER: Duration = Duration::from_millis(200);

/// Capped exponential reconnect backoff with additive jitter.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
    jitter: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max, current: base.min(max), jitter: DEFAULT_JITTER }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before the next attempt; doubles the following one up to `max`.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay + self.sample_jitter()
    }

    /// Back to `base` after a successful connect.
    pub fn reset(&mut self) {
        self.current = self.base.min(self.max);
    }

    /// Delay the next call to [`Backoff::next_delay`] starts from, before jitter.
    pub fn current(&self) -> Duration {
        self.current
    }

    fn sample_jitter(&self) -> Duration {
        let cap = self.jitter.as_millis() as u64;
        if cap == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..cap))
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
