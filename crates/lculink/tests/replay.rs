// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replays a recorded event session through the stream without a network.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use regex::Regex;

use lculink::config::LcuConfig;
use lculink::credential::resolver::CredentialResolver;
use lculink::gameflow::{phase_changes_from, PhaseChanged, GAMEFLOW_SESSION_URI};
use lculink::observe::observe;
use lculink::Lcu;

const RECORDING: &str = include_str!("fixtures/gameflow.jsonl");

fn offline_lcu() -> anyhow::Result<Lcu> {
    let config = LcuConfig { lockfile_wait_attempts: 0, ..LcuConfig::default() };
    let resolver = CredentialResolver::new(&config).without_override().with_install_candidates(vec![]);
    Ok(Lcu::with_resolver(&config, resolver)?)
}

#[tokio::test]
async fn recorded_session_yields_distinct_phases() -> anyhow::Result<()> {
    let lcu = offline_lcu()?;
    let sessions = observe::<serde_json::Value>(&lcu.stream, GAMEFLOW_SESSION_URI, false);
    let phases = phase_changes_from(sessions);

    for line in RECORDING.lines().filter(|l| !l.trim().is_empty()) {
        lcu.stream.inject_frame(line);
    }

    let got: Vec<PhaseChanged> =
        tokio::time::timeout(Duration::from_secs(2), phases.take(4).collect()).await?;
    let names: Vec<&str> = got.iter().map(|p| p.phase.as_str()).collect();
    assert_eq!(names, vec!["Lobby", "ChampSelect", "InProgress", "EndOfGame"]);
    Ok(())
}

#[tokio::test]
async fn recorded_session_metrics_and_pattern_routing() -> anyhow::Result<()> {
    let lcu = offline_lcu()?;
    let champ_select = Arc::new(AtomicU32::new(0));
    let hits = Arc::clone(&champ_select);
    let _sub = lcu.stream.subscribe_pattern(Regex::new(r"^/lol-champ-select/")?, move |_| {
        hits.fetch_add(1, Ordering::SeqCst);
    });

    for line in RECORDING.lines().filter(|l| !l.trim().is_empty()) {
        lcu.stream.inject_frame(line);
    }

    assert_eq!(champ_select.load(Ordering::SeqCst), 2);
    let snap = lcu.metrics.snapshot();
    assert_eq!(snap.messages, 9);
    assert_eq!(snap.parse_failures, 1);
    Ok(())
}

#[tokio::test]
async fn dropping_observation_unsubscribes() -> anyhow::Result<()> {
    let lcu = offline_lcu()?;
    let sessions = observe::<serde_json::Value>(&lcu.stream, GAMEFLOW_SESSION_URI, false);
    assert_eq!(lcu.stream.hub().len(), 1);
    drop(sessions);
    assert!(lcu.stream.hub().is_empty());
    Ok(())
}
