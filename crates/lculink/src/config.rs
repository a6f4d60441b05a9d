// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Configuration for the LCU HTTP client and event stream.
///
/// All options are fixed for the lifetime of the clients built from them.
#[derive(Debug, Clone, clap::Args)]
pub struct LcuConfig {
    /// Accept the LCU's self-signed certificate on HTTP requests (loopback only).
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, env = "LCU_ACCEPT_SELF_SIGNED")]
    pub accept_self_signed: bool,

    /// Accept the LCU's self-signed certificate on the WebSocket (loopback only).
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, env = "LCU_WS_ACCEPT_SELF_SIGNED")]
    pub ws_accept_self_signed: bool,

    /// Base delay for WebSocket reconnect backoff, in milliseconds.
    #[arg(long, default_value_t = 1000, env = "LCU_BASE_RETRY_DELAY_MS")]
    pub base_retry_delay_ms: u64,

    /// Maximum HTTP retry attempts (excluding the initial try).
    #[arg(long, default_value_t = 3, env = "LCU_MAX_RETRY_ATTEMPTS")]
    pub max_retry_attempts: u32,

    /// Per-request HTTP timeout in milliseconds.
    #[arg(long, default_value_t = 10000, env = "LCU_HTTP_TIMEOUT_MS")]
    pub http_timeout_ms: u64,

    /// How long the circuit stays open once tripped, in milliseconds.
    #[arg(long, default_value_t = 10000, env = "LCU_CIRCUIT_BREAK_MS")]
    pub circuit_break_ms: u64,

    /// Sampling window for the circuit failure ratio, in milliseconds.
    #[arg(long, default_value_t = 30000, env = "LCU_CIRCUIT_SAMPLING_MS")]
    pub circuit_sampling_ms: u64,

    /// Minimum requests within the window before the circuit can open.
    #[arg(long, default_value_t = 20, env = "LCU_CIRCUIT_MIN_THROUGHPUT")]
    pub circuit_min_throughput: u32,

    /// Failure ratio (0..1) at or above which the circuit opens.
    #[arg(long, default_value_t = 0.5, env = "LCU_CIRCUIT_FAILURE_RATIO")]
    pub circuit_failure_ratio: f64,

    /// Upper bound for WebSocket reconnect backoff, in milliseconds.
    #[arg(long, default_value_t = 10000, env = "LCU_WS_MAX_BACKOFF_MS")]
    pub ws_max_backoff_ms: u64,

    /// Silence after which the watchdog forces a reconnect, in milliseconds.
    #[arg(long, default_value_t = 45000, env = "LCU_WS_SILENCE_THRESHOLD_MS")]
    pub ws_silence_threshold_ms: u64,

    /// Watchdog tick interval in milliseconds.
    #[arg(long, default_value_t = 5000, env = "LCU_WS_WATCHDOG_MS")]
    pub ws_watchdog_interval_ms: u64,

    /// Largest WebSocket message or frame the transport will buffer, in bytes.
    /// Anything bigger ends the connection, which is then reopened at once.
    #[arg(long, default_value_t = 16 * 1024 * 1024, env = "LCU_WS_TRANSPORT_MAX_BYTES")]
    pub ws_transport_max_bytes: usize,

    /// Process-scan attempts while waiting for the client to write its lockfile.
    #[arg(long, default_value_t = 20, env = "LCU_LOCKFILE_WAIT_ATTEMPTS")]
    pub lockfile_wait_attempts: u32,

    /// Delay between lockfile wait attempts, in milliseconds.
    #[arg(long, default_value_t = 250, env = "LCU_LOCKFILE_WAIT_MS")]
    pub lockfile_wait_interval_ms: u64,
}

impl Default for LcuConfig {
    fn default() -> Self {
        Self {
            accept_self_signed: true,
            ws_accept_self_signed: true,
            base_retry_delay_ms: 1000,
            max_retry_attempts: 3,
            http_timeout_ms: 10000,
            circuit_break_ms: 10000,
            circuit_sampling_ms: 30000,
            circuit_min_throughput: 20,
            circuit_failure_ratio: 0.5,
            ws_max_backoff_ms: 10000,
            ws_silence_threshold_ms: 45000,
            ws_watchdog_interval_ms: 5000,
            ws_transport_max_bytes: 16 * 1024 * 1024,
            lockfile_wait_attempts: 20,
            lockfile_wait_interval_ms: 250,
        }
    }
}

impl LcuConfig {
    pub fn base_retry_delay(&self) -> Duration {
        Duration::from_millis(self.base_retry_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn ws_max_backoff(&self) -> Duration {
        Duration::from_millis(self.ws_max_backoff_ms)
    }

    pub fn ws_silence_threshold(&self) -> Duration {
        Duration::from_millis(self.ws_silence_threshold_ms)
    }

    pub fn ws_watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.ws_watchdog_interval_ms)
    }

    pub fn lockfile_wait_interval(&self) -> Duration {
        Duration::from_millis(self.lockfile_wait_interval_ms)
    }

    /// Retry and circuit-breaker settings for the HTTP pipeline.
    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig {
            max_retry_attempts: self.max_retry_attempts,
            retry_base_delay: HTTP_RETRY_BASE_DELAY,
            failure_ratio: self.circuit_failure_ratio.clamp(0.01, 0.99),
            minimum_throughput: self.circuit_min_throughput.max(2),
            sampling_window: Duration::from_millis(self.circuit_sampling_ms),
            break_duration: Duration::from_millis(self.circuit_break_ms),
        }
    }
}

/// Base delay of the HTTP retry stage (doubles per attempt).
pub const HTTP_RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Immutable settings for one resilience pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceConfig {
    pub max_retry_attempts: u32,
    pub retry_base_delay: Duration,
    pub failure_ratio: f64,
    pub minimum_throughput: u32,
    pub sampling_window: Duration,
    pub break_duration: Duration,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
