// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use crate::metrics::AtomicMetrics;

use super::envelope::{EventType, MAX_MESSAGE_BYTES};
use super::*;

fn stream_with(metrics: Arc<AtomicMetrics>) -> anyhow::Result<EventStream> {
    let config = LcuConfig::default();
    let resolver = Arc::new(
        CredentialResolver::new(&config)
            .without_override()
            .with_install_candidates(vec![])
            .with_wait(0, Duration::from_millis(1)),
    );
    let http = Arc::new(LcuHttpClient::new(&config, Arc::clone(&resolver), metrics.clone())?);
    Ok(EventStream::new(&config, resolver, http, metrics)?)
}

const SESSION_FRAME: &str =
    r#"[8,"OnJsonApiEvent",{"uri":"/lol-gameflow/v1/session","eventType":"Update","data":{"phase":"Lobby"}}]"#;

#[test]
fn state_round_trips_through_u8() {
    for state in [ConnectionState::Disconnected, ConnectionState::Connecting, ConnectionState::Connected] {
        assert_eq!(ConnectionState::from_u8(state as u8), state);
    }
    assert_eq!(ConnectionState::from_u8(42), ConnectionState::Disconnected);
}

#[test]
fn request_carries_wamp_and_basic_auth() -> anyhow::Result<()> {
    let creds = Credentials::new(51234, "secret", "https");
    let request = build_request(&creds)?;

    assert_eq!(request.uri().to_string(), "wss://127.0.0.1:51234/");
    assert_eq!(request.headers().get(SEC_WEBSOCKET_PROTOCOL).map(|v| v.as_bytes()), Some(&b"wamp"[..]));
    let auth = request.headers().get(AUTHORIZATION).map(|v| v.to_str()).transpose()?;
    assert_eq!(auth, Some(creds.authorization_header().as_str()));
    Ok(())
}

#[tokio::test]
async fn frame_flows_raw_then_message_then_hub() -> anyhow::Result<()> {
    let metrics = Arc::new(AtomicMetrics::new());
    let stream = stream_with(Arc::clone(&metrics))?;
    let order = Arc::new(Mutex::new(Vec::new()));

    let o = Arc::clone(&order);
    let _raw = stream.on_raw_message(move |_| o.lock().push("raw"));
    let o = Arc::clone(&order);
    let _msg = stream.on_message(move |_| o.lock().push("message"));
    let o = Arc::clone(&order);
    let _hub = stream.subscribe("/lol-gameflow/v1/session", move |env| {
        assert_eq!(env.event_type, EventType::Update);
        o.lock().push("hub");
    });

    stream.inject_frame(SESSION_FRAME);

    assert_eq!(*order.lock(), vec!["raw", "message", "hub"]);
    assert_eq!(metrics.snapshot().messages, 1);
    assert_eq!(metrics.snapshot().parse_failures, 0);
    Ok(())
}

#[tokio::test]
async fn malformed_frame_counts_parse_failure_but_reaches_raw() -> anyhow::Result<()> {
    let metrics = Arc::new(AtomicMetrics::new());
    let stream = stream_with(Arc::clone(&metrics))?;
    let raw = Arc::new(AtomicU64::new(0));
    let r = Arc::clone(&raw);
    let _raw = stream.on_raw_message(move |_| {
        r.fetch_add(1, Ordering::SeqCst);
    });
    let _all = stream.subscribe_pattern(Regex::new(".*")?, |_| {});

    stream.inject_frame("[5,\"OnJsonApiEvent\"]");
    stream.inject_frame("not json");

    assert_eq!(raw.load(Ordering::SeqCst), 2);
    let snap = metrics.snapshot();
    assert_eq!(snap.parse_failures, 2);
    assert_eq!(snap.messages, 0);
    Ok(())
}

#[tokio::test]
async fn oversized_message_counted_once_without_events() -> anyhow::Result<()> {
    let metrics = Arc::new(AtomicMetrics::new());
    let stream = stream_with(Arc::clone(&metrics))?;
    let seen = Arc::new(AtomicU64::new(0));
    let s = Arc::clone(&seen);
    let _raw = stream.on_raw_message(move |_| {
        s.fetch_add(1, Ordering::SeqCst);
    });

    let big = format!(
        r#"[8,"OnJsonApiEvent",{{"uri":"/big","eventType":"Update","data":"{}"}}]"#,
        "x".repeat(MAX_MESSAGE_BYTES + 1024)
    );
    stream.inner.on_data(big.as_bytes());
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(metrics.snapshot().parse_failures, 1);

    stream.inner.on_data(SESSION_FRAME.as_bytes());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.snapshot().parse_failures, 1);
    assert_eq!(metrics.snapshot().messages, 1);
    Ok(())
}

#[tokio::test]
async fn disposed_listener_is_not_called() -> anyhow::Result<()> {
    let stream = stream_with(Arc::new(AtomicMetrics::new()))?;
    let hits = Arc::new(AtomicU64::new(0));
    let h = Arc::clone(&hits);
    let sub = stream.on_message(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    stream.inject_frame(SESSION_FRAME);
    sub.dispose();
    stream.inject_frame(SESSION_FRAME);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn typed_subscription_without_snapshot() -> anyhow::Result<()> {
    let stream = stream_with(Arc::new(AtomicMetrics::new()))?;
    let phases = Arc::new(Mutex::new(Vec::new()));
    let p = Arc::clone(&phases);
    let _sub = stream.subscribe_typed(
        "/lol-gameflow/v1/session",
        move |v: serde_json::Value| p.lock().push(v),
        false,
    );

    stream.inject_frame(SESSION_FRAME);
    assert_eq!(*phases.lock(), vec![json!({"phase": "Lobby"})]);
    Ok(())
}

#[tokio::test]
async fn never_started_stream_times_out_waiting() -> anyhow::Result<()> {
    let stream = stream_with(Arc::new(AtomicMetrics::new()))?;
    assert!(!stream.wait_until_connected(Duration::from_millis(20)).await);
    assert_eq!(stream.state(), ConnectionState::Disconnected);
    assert!(stream.last_message_at().is_none());
    Ok(())
}

#[test]
fn connect_outside_runtime_does_not_start() -> anyhow::Result<()> {
    let stream = stream_with(Arc::new(AtomicMetrics::new()))?;
    stream.connect();
    assert!(stream.task.lock().is_none());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        stream.connect();
        assert!(stream.task.lock().is_some());
        stream.shutdown().await;
    });
    Ok(())
}

#[tokio::test]
async fn shutdown_without_client_returns_promptly() -> anyhow::Result<()> {
    let stream = stream_with(Arc::new(AtomicMetrics::new()))?;
    stream.connect();
    stream.connect();

    tokio::time::timeout(Duration::from_secs(5), stream.shutdown()).await?;
    assert_eq!(stream.state(), ConnectionState::Disconnected);
    assert!(!stream.is_connected());
    Ok(())
}
