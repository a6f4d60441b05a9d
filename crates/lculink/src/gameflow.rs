// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gameflow phase notifications.

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::observe::{distinct_until_changed, observe};
use crate::stream::EventStream;

pub const GAMEFLOW_SESSION_URI: &str = "/lol-gameflow/v1/session";

/// Reported when the gameflow phase differs from the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChanged {
    pub phase: String,
}

/// `phase` of a gameflow session, or `"Unknown"`.
pub fn phase_of(session: &Value) -> String {
    session.get("phase").and_then(Value::as_str).unwrap_or("Unknown").to_owned()
}

/// Map session payloads to phase changes, skipping repeats.
pub fn phase_changes_from<S>(sessions: S) -> impl Stream<Item = PhaseChanged>
where
    S: Stream<Item = Value>,
{
    distinct_until_changed(sessions.map(|s| phase_of(&s))).map(|phase| PhaseChanged { phase })
}

/// Phase changes from the live stream, seeded with the current session.
pub fn phase_changes(stream: &EventStream) -> impl Stream<Item = PhaseChanged> {
    phase_changes_from(observe::<Value>(stream, GAMEFLOW_SESSION_URI, true))
}

#[cfg(test)]
#[path = "gameflow_tests.rs"]
mod tests;
