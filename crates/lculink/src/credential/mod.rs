// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LCU credentials: the lockfile format and where to find it.
//!
//! The League Client writes `name:pid:port:token:protocol` to a `lockfile`
//! next to its executable while it runs. Port and token change on every
//! client restart, so credentials are re-read on each use and only the
//! lockfile *path* is ever cached.

pub mod discover;
pub mod resolver;

use std::io::BufRead;
use std::path::Path;

use base64::Engine;

/// Fixed basic-auth username expected by the LCU.
pub const AUTH_USERNAME: &str = "riot";

/// Environment variable holding an absolute lockfile path override.
pub const LOCKFILE_ENV: &str = "LCU_LOCKFILE";

/// Connection parameters advertised by a running client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app: String,
    pub pid: Option<u32>,
    pub port: u16,
    pub token: String,
    pub protocol: String,
}

impl Credentials {
    pub fn new(port: u16, token: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self { app: String::new(), pid: None, port, token: token.into(), protocol: protocol.into() }
    }

    /// Loopback base address, e.g. `https://127.0.0.1:54321`.
    pub fn base_url(&self) -> String {
        format!("{}://127.0.0.1:{}", self.protocol, self.port)
    }

    /// Event feed address: `wss://` for https clients, `ws://` otherwise.
    pub fn ws_url(&self) -> String {
        let scheme = if self.protocol.eq_ignore_ascii_case("http") { "ws" } else { "wss" };
        format!("{scheme}://127.0.0.1:{}/", self.port)
    }

    /// Base64 of `riot:<token>`.
    pub fn basic_auth_value(&self) -> String {
        base64::engine::general_purpose::STANDARD
            .encode(format!("{AUTH_USERNAME}:{}", self.token))
    }

    /// Full `Authorization` header value.
    pub fn authorization_header(&self) -> String {
        format!("Basic {}", self.basic_auth_value())
    }

    /// Resolve `target` against the base address. Absolute URLs pass through.
    pub fn resolve_url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_owned();
        }
        let base = self.base_url();
        if target.starts_with('/') {
            format!("{base}{target}")
        } else {
            format!("{base}/{target}")
        }
    }
}

/// Parse the first lockfile line: `name:pid:port:token:protocol`.
///
/// Returns `None` (never panics) when fewer than four `:` delimiters are
/// present or the port is not a valid `u16`. Safe to call on arbitrary text.
pub fn parse_lockfile_line(line: &str) -> Option<Credentials> {
    let mut parts = line.trim_end_matches(['\r', '\n']).splitn(5, ':');
    let app = parts.next()?;
    let pid = parts.next()?;
    let port = parts.next()?;
    let token = parts.next()?;
    let protocol = parts.next()?;

    let port: u16 = port.parse().ok()?;

    Some(Credentials {
        app: app.to_owned(),
        pid: pid.parse().ok(),
        port,
        token: token.to_owned(),
        protocol: protocol.to_owned(),
    })
}

/// Read and parse the first line of a lockfile. I/O errors become `None`.
pub fn read_lockfile(path: &Path) -> Option<Credentials> {
    let file = std::fs::File::open(path).ok()?;
    let mut line = String::new();
    std::io::BufReader::new(file).read_line(&mut line).ok()?;
    parse_lockfile_line(&line)
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
