// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry + circuit-breaker pipeline applied to every outbound request.
//!
//! Retry is the outer stage: each attempt first asks the breaker for a
//! permit, so an open circuit fails fast with [`ErrorKind::CircuitOpen`]
//! and that outcome is never retried.
//!
//! [`ErrorKind::CircuitOpen`]: crate::error::ErrorKind::CircuitOpen

use std::collections::VecDeque;
use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use tracing::{info, warn};

use crate::config::ResilienceConfig;
use crate::error::{is_transient_status, LcuError};

/// Outcome types the pipeline can classify.
pub trait Classify {
    /// Whether a successful transport call still counts as a failure.
    fn is_transient(&self) -> bool;

    /// Short label for retry logs.
    fn describe(&self) -> String;
}

impl Classify for reqwest::Response {
    fn is_transient(&self) -> bool {
        is_transient_status(self.status().as_u16())
    }

    fn describe(&self) -> String {
        self.status().to_string()
    }
}

pub struct ResiliencePipeline {
    config: ResilienceConfig,
    breaker: CircuitBreaker,
}

impl ResiliencePipeline {
    pub fn new(config: ResilienceConfig) -> Self {
        let breaker = CircuitBreaker::new(&config);
        Self { config, breaker }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run `attempt` with retries and the circuit breaker.
    ///
    /// A retryable outcome that survives every retry is returned as-is
    /// (the last response or error) so callers can inspect it.
    pub async fn execute<T, F, Fut>(&self, mut attempt: F) -> Result<T, LcuError>
    where
        T: Classify,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LcuError>>,
    {
        let mut retries = 0u32;
        loop {
            let permit = self.breaker.try_acquire()?;
            let outcome = attempt().await;
            let failed = match &outcome {
                Ok(value) => value.is_transient(),
                Err(e) => e.is_retryable(),
            };
            permit.record(failed);

            if !failed || retries >= self.config.max_retry_attempts {
                return outcome;
            }

            retries += 1;
            let delay = retry_delay(self.config.retry_base_delay, retries);
            let reason = match &outcome {
                Ok(value) => value.describe(),
                Err(e) => e.kind().to_string(),
            };
            warn!(attempt = retries, reason = %reason, delay_ms = delay.as_millis() as u64, "http retry");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)` plus up to
/// half of that again as jitter.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let exp = base.saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
    let jitter_cap = (exp.as_millis() as u64 / 2).max(1);
    exp + Duration::from_millis(rand::rng().random_range(0..jitter_cap))
}

// -- Circuit breaker ----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::Open => f.write_str("open"),
            Self::HalfOpen => f.write_str("half-open"),
        }
    }
}

struct BreakerInner {
    state: CircuitState,
    samples: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Failure-ratio circuit breaker over a sliding sampling window.
pub struct CircuitBreaker {
    failure_ratio: f64,
    minimum_throughput: u32,
    sampling_window: Duration,
    break_duration: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(config: &ResilienceConfig) -> Self {
        Self {
            failure_ratio: config.failure_ratio,
            minimum_throughput: config.minimum_throughput,
            sampling_window: config.sampling_window,
            break_duration: config.break_duration,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                samples: VecDeque::new(),
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Ask to run one request. Fails fast while the circuit is open; once the
    /// break elapses exactly one caller gets a probe permit.
    pub fn try_acquire(&self) -> Result<Permit<'_>, LcuError> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Ok(Permit::new(self, false)),
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or(Duration::MAX);
                if elapsed < self.break_duration {
                    return Err(LcuError::circuit_open());
                }
                info!("http circuit half-open");
                inner.state = CircuitState::HalfOpen;
                inner.probe_in_flight = true;
                Ok(Permit::new(self, true))
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    return Err(LcuError::circuit_open());
                }
                inner.probe_in_flight = true;
                Ok(Permit::new(self, true))
            }
        }
    }

    fn record(&self, probe: bool, failed: bool) {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        if probe {
            inner.probe_in_flight = false;
            if failed {
                warn!("http circuit re-opened after failed probe");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
            } else {
                info!("http circuit closed");
                inner.state = CircuitState::Closed;
                inner.opened_at = None;
                inner.samples.clear();
            }
            return;
        }

        // Late results from requests admitted before the circuit opened.
        if inner.state != CircuitState::Closed {
            return;
        }

        inner.samples.push_back((now, failed));
        while let Some(&(at, _)) = inner.samples.front() {
            if now.duration_since(at) > self.sampling_window {
                inner.samples.pop_front();
            } else {
                break;
            }
        }

        let total = inner.samples.len();
        if total < self.minimum_throughput as usize {
            return;
        }
        let failures = inner.samples.iter().filter(|(_, f)| *f).count();
        let ratio = failures as f64 / total as f64;
        if ratio >= self.failure_ratio {
            warn!(failures, total, ratio, "http circuit opened");
            inner.state = CircuitState::Open;
            inner.opened_at = Some(now);
            inner.samples.clear();
        }
    }
}

/// Admission for one request. Must be settled with [`Permit::record`];
/// a probe permit dropped unsettled counts as a failed probe.
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self { breaker, probe, settled: false }
    }

    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn record(mut self, failed: bool) {
        self.settled = true;
        self.breaker.record(self.probe, failed);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.record(true, true);
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
