// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lockfile resolution with a cached path.
//!
//! Resolution order, first success wins:
//! 1. `LCU_LOCKFILE` override
//! 2. previously resolved path (re-validated by parsing)
//! 3. running client processes
//! 4. well-known install locations
//! 5. a short active wait repeating (3) while the client starts up

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::LcuConfig;
use crate::credential::discover::{
    candidates_from_processes, Platform, PlatformLayout, ProcessScanner, SystemProcessScanner,
};
use crate::credential::{read_lockfile, Credentials, LOCKFILE_ENV};
use crate::error::LcuError;

/// Where the explicit lockfile override comes from.
#[derive(Debug, Clone)]
enum Override {
    /// Read `LCU_LOCKFILE` on every resolution.
    Env,
    Fixed(PathBuf),
    Disabled,
}

/// Resolves current LCU credentials. Cheap to share behind an `Arc`.
pub struct CredentialResolver {
    override_source: Override,
    cached_path: Mutex<Option<PathBuf>>,
    scanner: Arc<dyn ProcessScanner>,
    layout: &'static PlatformLayout,
    install_candidates: Vec<PathBuf>,
    wait_attempts: u32,
    wait_interval: Duration,
}

impl CredentialResolver {
    pub fn new(config: &LcuConfig) -> Self {
        let layout = Platform::current().layout();
        Self {
            override_source: Override::Env,
            cached_path: Mutex::new(None),
            scanner: Arc::new(SystemProcessScanner),
            layout,
            install_candidates: layout.install_candidates(),
            wait_attempts: config.lockfile_wait_attempts,
            wait_interval: config.lockfile_wait_interval(),
        }
    }

    /// Use `path` as the explicit override instead of reading `LCU_LOCKFILE`.
    pub fn with_lockfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_source = Override::Fixed(path.into());
        self
    }

    /// Ignore `LCU_LOCKFILE` entirely.
    pub fn without_override(mut self) -> Self {
        self.override_source = Override::Disabled;
        self
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn ProcessScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_install_candidates(mut self, candidates: Vec<PathBuf>) -> Self {
        self.install_candidates = candidates;
        self
    }

    pub fn with_wait(mut self, attempts: u32, interval: Duration) -> Self {
        self.wait_attempts = attempts;
        self.wait_interval = interval;
        self
    }

    /// The last lockfile path that produced valid credentials.
    pub fn cached_path(&self) -> Option<PathBuf> {
        self.cached_path.lock().clone()
    }

    /// Resolve fresh credentials.
    ///
    /// The lockfile is re-read on every call; only its path is cached.
    /// Cancelling `cancel` ends the startup wait early.
    pub async fn resolve(&self, cancel: &CancellationToken) -> Result<Credentials, LcuError> {
        if let Some(path) = self.override_path() {
            if path.is_file() {
                if let Some(creds) = read_lockfile(&path) {
                    self.remember(path);
                    return Ok(creds);
                }
            }
        }

        let cached = self.cached_path.lock().clone();
        if let Some(path) = cached {
            if let Some(creds) = read_lockfile(&path) {
                return Ok(creds);
            }
            debug!(path = %path.display(), "cached lockfile no longer valid");
            self.cached_path.lock().take();
        }

        if let Some(creds) = self.try_processes().await {
            return Ok(creds);
        }

        for path in &self.install_candidates {
            if let Some(creds) = read_lockfile(path) {
                self.remember(path.clone());
                return Ok(creds);
            }
        }

        for attempt in 0..self.wait_attempts {
            if cancel.is_cancelled() {
                break;
            }
            if let Some(creds) = self.try_processes().await {
                debug!(attempt, "lockfile appeared during startup wait");
                return Ok(creds);
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.wait_interval) => {}
            }
        }

        Err(LcuError::credential_resolution(format!(
            "LCU lockfile not found; start the League Client or set {LOCKFILE_ENV}"
        )))
    }

    fn override_path(&self) -> Option<PathBuf> {
        match &self.override_source {
            Override::Env => std::env::var(LOCKFILE_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            Override::Fixed(path) => Some(path.clone()),
            Override::Disabled => None,
        }
    }

    async fn try_processes(&self) -> Option<Credentials> {
        let scanner = Arc::clone(&self.scanner);
        let layout = self.layout;
        let candidates =
            tokio::task::spawn_blocking(move || candidates_from_processes(scanner.as_ref(), layout))
                .await
                .unwrap_or_default();
        self.first_valid(&candidates)
    }

    fn first_valid(&self, candidates: &[PathBuf]) -> Option<Credentials> {
        candidates.iter().find_map(|path| {
            let creds = read_lockfile(path)?;
            self.remember(path.clone());
            Some(creds)
        })
    }

    fn remember(&self, path: PathBuf) {
        let mut cached = self.cached_path.lock();
        if cached.as_deref() != Some(Path::new(&path)) {
            debug!(path = %path.display(), "lockfile resolved");
            *cached = Some(path);
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
