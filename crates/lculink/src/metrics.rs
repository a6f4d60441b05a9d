// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metrics sink injected into the stream and HTTP clients.
//!
//! The core only emits values; exporting them is left to the embedder.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

pub trait MetricsSink: Send + Sync {
    fn connection_opened(&self) {}
    fn connection_closed(&self) {}
    fn reconnect(&self) {}
    fn message_received(&self) {}
    fn parse_failure(&self) {}
    fn http_request(&self) {}
    fn http_failure(&self) {}
    fn http_latency(&self, _elapsed: Duration) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {}

/// In-process counters, readable through [`AtomicMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    active_connections: AtomicI64,
    reconnects: AtomicU64,
    messages: AtomicU64,
    parse_failures: AtomicU64,
    http_requests: AtomicU64,
    http_failures: AtomicU64,
    http_latency_us_total: AtomicU64,
    http_latency_samples: AtomicU64,
}

/// Point-in-time copy of [`AtomicMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub active_connections: i64,
    pub reconnects: u64,
    pub messages: u64,
    pub parse_failures: u64,
    pub http_requests: u64,
    pub http_failures: u64,
    pub http_latency_us_total: u64,
    pub http_latency_samples: u64,
}

impl MetricsSnapshot {
    /// Mean HTTP latency, if any request completed.
    pub fn mean_http_latency(&self) -> Option<Duration> {
        if self.http_latency_samples == 0 {
            return None;
        }
        Some(Duration::from_micros(self.http_latency_us_total / self.http_latency_samples))
    }
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_connections: self.active_connections.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            http_requests: self.http_requests.load(Ordering::Relaxed),
            http_failures: self.http_failures.load(Ordering::Relaxed),
            http_latency_us_total: self.http_latency_us_total.load(Ordering::Relaxed),
            http_latency_samples: self.http_latency_samples.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSink for AtomicMetrics {
    fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    fn reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    fn message_received(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    fn parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn http_failure(&self) {
        self.http_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn http_latency(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.http_latency_us_total.fetch_add(micros, Ordering::Relaxed);
        self.http_latency_samples.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
