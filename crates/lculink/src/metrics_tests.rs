// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn counters_accumulate() {
    let metrics = AtomicMetrics::new();
    metrics.connection_opened();
    metrics.reconnect();
    metrics.message_received();
    metrics.message_received();
    metrics.parse_failure();
    metrics.connection_closed();
    metrics.connection_opened();

    let snap = metrics.snapshot();
    assert_eq!(snap.active_connections, 1);
    assert_eq!(snap.reconnects, 1);
    assert_eq!(snap.messages, 2);
    assert_eq!(snap.parse_failures, 1);
}

#[test]
fn mean_latency_over_samples() {
    let metrics = AtomicMetrics::new();
    assert_eq!(metrics.snapshot().mean_http_latency(), None);

    metrics.http_latency(Duration::from_millis(10));
    metrics.http_latency(Duration::from_millis(30));
    assert_eq!(metrics.snapshot().mean_http_latency(), Some(Duration::from_millis(20)));
}

#[test]
fn snapshot_serializes() -> anyhow::Result<()> {
    let metrics = AtomicMetrics::new();
    metrics.http_request();
    metrics.http_failure();
    let value = serde_json::to_value(metrics.snapshot())?;
    assert_eq!(value["http_requests"], 1);
    assert_eq!(value["http_failures"], 1);
    Ok(())
}

#[test]
fn noop_sink_accepts_everything() {
    let sink: &dyn MetricsSink = &NoopMetrics;
    sink.connection_opened();
    sink.http_latency(Duration::from_secs(1));
}
