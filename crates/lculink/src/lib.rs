// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lculink: resilient client for the League Client Update (LCU) API.
//!
//! Credentials come from the client's lockfile, live events from its WAMP
//! WebSocket, and REST calls go through retry and a circuit breaker.

pub mod config;
pub mod credential;
pub mod error;
pub mod gameflow;
pub mod http;
pub mod hub;
pub mod metrics;
pub mod observe;
pub mod stream;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tracing::{info, warn};

use crate::config::LcuConfig;
use crate::credential::resolver::CredentialResolver;
use crate::error::LcuError;
use crate::http::client::LcuHttpClient;
use crate::http::game::GameHttpClient;
use crate::metrics::{AtomicMetrics, MetricsSink};
use crate::stream::EventStream;

/// Every client wired to one resolver and one metrics sink.
pub struct Lcu {
    pub resolver: Arc<CredentialResolver>,
    pub http: Arc<LcuHttpClient>,
    pub game: GameHttpClient,
    pub stream: EventStream,
    pub metrics: Arc<AtomicMetrics>,
}

impl Lcu {
    pub fn new(config: &LcuConfig) -> Result<Self, LcuError> {
        Self::with_resolver(config, CredentialResolver::new(config))
    }

    pub fn with_resolver(config: &LcuConfig, resolver: CredentialResolver) -> Result<Self, LcuError> {
        let metrics = Arc::new(AtomicMetrics::new());
        let sink: Arc<dyn MetricsSink> = metrics.clone();
        let resolver = Arc::new(resolver);
        let http = Arc::new(LcuHttpClient::new(config, Arc::clone(&resolver), Arc::clone(&sink))?);
        let game = GameHttpClient::new(config, Arc::clone(&sink))?;
        let stream = EventStream::new(config, Arc::clone(&resolver), Arc::clone(&http), sink)?;
        Ok(Self { resolver, http, game, stream, metrics })
    }
}

/// How long the binary waits for the first connection before logging.
const FIRST_CONNECT_WAIT: Duration = Duration::from_secs(30);

/// Perform one GET and print the JSON body.
pub async fn get_once(config: &LcuConfig, path: &str) -> anyhow::Result<()> {
    let lcu = Lcu::new(config)?;
    let body: Option<serde_json::Value> = lcu.http.get(path).await?;
    println!("{}", serde_json::to_string_pretty(&body.unwrap_or_default())?);
    Ok(())
}

/// Follow the event stream, logging every event and gameflow phase change,
/// until Ctrl-C.
pub async fn run(config: LcuConfig) -> anyhow::Result<()> {
    let lcu = Lcu::new(&config)?;

    let _events = lcu.stream.on_message(|env| {
        info!(uri = %env.uri, event_type = %env.event_type, "event");
    });
    let _reconnects = lcu.stream.on_reconnected(|| info!("subscribed to OnJsonApiEvent"));

    let mut phases = std::pin::pin!(gameflow::phase_changes(&lcu.stream));
    if !lcu.stream.connect_and_wait(FIRST_CONNECT_WAIT).await {
        warn!("not connected yet; still retrying in the background");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = phases.next() => match change {
                Some(change) => info!(phase = %change.phase, "gameflow phase"),
                None => break,
            },
        }
    }

    info!("shutting down");
    lcu.stream.shutdown().await;
    info!(metrics = ?lcu.metrics.snapshot(), "stopped");
    Ok(())
}
