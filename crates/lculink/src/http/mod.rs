// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound HTTP: the authenticated LCU client, the in-game client, and the
//! retry + circuit-breaker pipeline both share.

pub mod client;
pub mod game;
pub mod policy;
pub mod tls;

use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::LcuConfig;
use crate::error::LcuError;

/// Characters of a failed response body echoed into logs and errors.
pub const PREVIEW_CHARS: usize = 120;

/// Build a reqwest client carrying the shared TLS policy and timeout.
pub(crate) fn build_client(config: &LcuConfig) -> Result<reqwest::Client, LcuError> {
    let tls = tls::client_config(config.accept_self_signed)?;
    let client = reqwest::Client::builder()
        .use_preconfigured_tls(tls)
        .timeout(config.http_timeout())
        .build()?;
    Ok(client)
}

/// Decode a JSON response body.
///
/// Non-2xx statuses become errors carrying a body preview. An empty body
/// decodes to `None`.
pub(crate) async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<Option<T>, LcuError> {
    let status = resp.status();
    let path = resp.url().path().to_owned();
    let bytes = resp.bytes().await?;

    if !status.is_success() {
        let body = String::from_utf8_lossy(&bytes);
        let preview = preview(&body, PREVIEW_CHARS);
        warn!(status = status.as_u16(), path = %path, body = %preview, "http request failed");
        return Err(LcuError::from_status(status.as_u16(), format!("{path}: {preview}")));
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| LcuError::decode(format!("{path}: {e}")))
}

/// First `max` characters of `text`, on a char boundary.
pub fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
