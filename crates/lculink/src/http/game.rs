// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the in-game Live Client Data API on port 2999.
//!
//! That API needs no credentials, so nothing here touches the lockfile.

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::LcuConfig;
use crate::error::LcuError;
use crate::http::policy::ResiliencePipeline;
use crate::http::{build_client, read_json};
use crate::metrics::MetricsSink;

/// Fixed address of the in-game API.
pub const GAME_BASE_URL: &str = "https://127.0.0.1:2999";

pub struct GameHttpClient {
    client: reqwest::Client,
    base_url: String,
    pipeline: ResiliencePipeline,
    metrics: Arc<dyn MetricsSink>,
}

impl GameHttpClient {
    pub fn new(config: &LcuConfig, metrics: Arc<dyn MetricsSink>) -> Result<Self, LcuError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: GAME_BASE_URL.to_owned(),
            pipeline: ResiliencePipeline::new(config.resilience()),
            metrics,
        })
    }

    /// Point the client at another base address (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, LcuError> {
        let resp = self.send(Method::GET, path, None).await?;
        read_json(resp).await
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, LcuError> {
        let url = self.target(path)?;
        self.metrics.http_request();
        let started = Instant::now();

        let result = self
            .pipeline
            .execute(|| {
                let mut req = self.client.request(method.clone(), url.as_str());
                if let Some(body) = body {
                    req = req.json(body);
                }
                async move { req.send().await.map_err(LcuError::from) }
            })
            .await;

        self.metrics.http_latency(started.elapsed());
        match &result {
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), path, "game http ←");
                if !resp.status().is_success() {
                    self.metrics.http_failure();
                }
            }
            Err(_) => self.metrics.http_failure(),
        }
        result
    }

    /// Join a relative path onto the base; absolute URLs must stay on it.
    pub fn target(&self, path: &str) -> Result<String, LcuError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let on_base = path
                .strip_prefix(self.base_url.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'));
            if !on_base {
                return Err(LcuError::bad_request(format!(
                    "{path} is outside the game API at {}",
                    self.base_url
                )));
            }
            return Ok(path.to_owned());
        }
        let sep = if path.starts_with('/') { "" } else { "/" };
        Ok(format!("{}{sep}{path}", self.base_url))
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod tests;
