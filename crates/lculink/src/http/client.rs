// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated HTTP client for the LCU REST API.

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::LcuConfig;
use crate::credential::resolver::CredentialResolver;
use crate::error::LcuError;
use crate::http::policy::ResiliencePipeline;
use crate::http::{build_client, read_json};
use crate::metrics::MetricsSink;

/// LCU client. Credentials are resolved fresh for every attempt, so a
/// client restart (new port and token) is picked up by the next retry.
pub struct LcuHttpClient {
    client: reqwest::Client,
    resolver: Arc<CredentialResolver>,
    pipeline: ResiliencePipeline,
    metrics: Arc<dyn MetricsSink>,
    cancel: CancellationToken,
}

impl LcuHttpClient {
    pub fn new(
        config: &LcuConfig,
        resolver: Arc<CredentialResolver>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, LcuError> {
        Ok(Self {
            client: build_client(config)?,
            resolver,
            pipeline: ResiliencePipeline::new(config.resilience()),
            metrics,
            cancel: CancellationToken::new(),
        })
    }

    /// Bound credential waits to `cancel` instead of a private token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn pipeline(&self) -> &ResiliencePipeline {
        &self.pipeline
    }

    /// GET `path` and decode the JSON body. An empty body yields `None`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, LcuError> {
        let resp = self.send(Method::GET, path, None).await?;
        read_json(resp).await
    }

    /// Send a JSON-bodied request and decode the response.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<Option<T>, LcuError> {
        let resp = self.send(method, path, Some(body)).await?;
        read_json(resp).await
    }

    /// Send a request through authentication and the resilience pipeline.
    ///
    /// The response is returned whatever its status; only transport and
    /// breaker failures are errors.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, LcuError> {
        self.metrics.http_request();
        let started = Instant::now();
        debug!(%method, path, "lcu http →");

        let result = self.pipeline.execute(|| self.attempt(method.clone(), path, body)).await;

        let elapsed = started.elapsed();
        self.metrics.http_latency(elapsed);
        match &result {
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), path, elapsed_ms = elapsed.as_millis() as u64, "lcu http ←");
                if !resp.status().is_success() {
                    self.metrics.http_failure();
                }
            }
            Err(_) => self.metrics.http_failure(),
        }
        result
    }

    async fn attempt(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, LcuError> {
        let creds = self.resolver.resolve(&self.cancel).await?;
        let mut req = self
            .client
            .request(method, creds.resolve_url(path))
            .header(AUTHORIZATION, creds.authorization_header());
        if let Some(body) = body {
            req = req.json(body);
        }
        Ok(req.send().await?)
    }
}
