// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAMP event frames and the per-message size cap.
//!
//! The LCU publishes `[8, "OnJsonApiEvent", {"uri", "eventType", "data"}]`.
//! Only the third element is used.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LcuError;

/// Frame sent after connecting to receive every JSON API event.
pub const SUBSCRIBE_FRAME: &str = r#"[5,"OnJsonApiEvent"]"#;

/// Largest message decoded; bigger ones are dropped without closing the
/// connection.
pub const MAX_MESSAGE_BYTES: usize = 2 * 1024 * 1024;

/// One resource change published by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub uri: String,
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    pub data: Value,
}

impl Envelope {
    pub fn new(uri: impl Into<String>, event_type: EventType, data: Value) -> Self {
        Self { uri: uri.into(), event_type, data }
    }
}

/// Change kind. Unrecognized values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Create,
    Update,
    Delete,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Create" => Self::Create,
            "Update" => Self::Update,
            "Delete" => Self::Delete,
            _ => Self::Other(s),
        }
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        match t {
            EventType::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode an event frame: a JSON array of at least three elements whose
/// third element is the envelope object.
pub fn decode_envelope(text: &str) -> Result<Envelope, LcuError> {
    let frame: Value = serde_json::from_str(text).map_err(|e| LcuError::decode(e.to_string()))?;
    let Value::Array(mut items) = frame else {
        return Err(LcuError::decode("frame is not a JSON array"));
    };
    if items.len() < 3 {
        return Err(LcuError::decode(format!("frame has {} elements, expected 3", items.len())));
    }
    let payload = items.swap_remove(2);
    if !payload.is_object() {
        return Err(LcuError::decode("event payload is not an object"));
    }
    serde_json::from_value(payload).map_err(|e| LcuError::decode(e.to_string()))
}

/// A complete message as text, or its size when it exceeds `max`.
///
/// tungstenite delivers whole messages, so this only enforces the cap and
/// tolerates binary frames carrying JSON.
pub fn message_text(bytes: &[u8], max: usize) -> Result<Cow<'_, str>, usize> {
    if bytes.len() > max {
        return Err(bytes.len());
    }
    Ok(String::from_utf8_lossy(bytes))
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
