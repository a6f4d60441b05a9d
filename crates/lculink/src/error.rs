// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories surfaced by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No lockfile source yielded parseable credentials.
    CredentialResolution,
    /// Transport-level failure opening or maintaining a connection.
    Connection,
    /// Accumulated WebSocket message exceeded the size cap.
    FrameTooLarge,
    /// Malformed frame or response body.
    Decode,
    /// A subscriber callback panicked.
    DispatchCallback,
    /// Retryable HTTP outcome (429 / 5xx) after retries were exhausted.
    HttpTransient,
    /// The circuit breaker is open; the request was not attempted.
    CircuitOpen,
    /// Non-2xx outcome that is not retryable.
    HttpFatal,
    /// Invalid request target or configuration.
    BadRequest,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialResolution => "CREDENTIAL_RESOLUTION",
            Self::Connection => "CONNECTION",
            Self::FrameTooLarge => "FRAME_TOO_LARGE",
            Self::Decode => "DECODE",
            Self::DispatchCallback => "DISPATCH_CALLBACK",
            Self::HttpTransient => "HTTP_TRANSIENT",
            Self::CircuitOpen => "CIRCUIT_OPEN",
            Self::HttpFatal => "HTTP_FATAL",
            Self::BadRequest => "BAD_REQUEST",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by credential resolution, the HTTP clients and the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcuError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
}

impl LcuError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), status: None }
    }

    pub fn credential_resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialResolution, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn circuit_open() -> Self {
        Self::new(ErrorKind::CircuitOpen, "circuit is open; request not attempted")
    }

    /// Build an HTTP error from a non-success status, classifying it as
    /// transient (429 / 5xx) or fatal.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = if is_transient_status(status) {
            ErrorKind::HttpTransient
        } else {
            ErrorKind::HttpFatal
        };
        Self { kind, message: message.into(), status: Some(status) }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status code, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Whether the resilience pipeline treats this outcome as retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Connection | ErrorKind::HttpTransient)
    }
}

impl fmt::Display for LcuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({status}): {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for LcuError {}

impl From<reqwest::Error> for LcuError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::decode(err.to_string());
        }
        if err.is_builder() {
            return Self::bad_request(err.to_string());
        }
        Self::connection(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for LcuError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::Capacity(e) => Self::new(ErrorKind::FrameTooLarge, e.to_string()),
            WsError::Url(e) => Self::bad_request(e.to_string()),
            other => Self::connection(other.to_string()),
        }
    }
}

/// 429 and every 5xx are retried; everything else passes through.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || status >= 500
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
