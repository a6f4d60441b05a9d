// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform-specific lockfile discovery.
//!
//! Each platform contributes a [`PlatformLayout`]: where the lockfile sits
//! relative to a running client executable, and a list of well-known install
//! locations. Process enumeration lives behind [`ProcessScanner`] so the
//! resolver can be driven by fakes in tests.

use std::path::{Path, PathBuf};

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// Executable names (without `.exe`) that indicate a running League Client.
pub const CLIENT_PROCESS_NAMES: &[&str] = &["LeagueClientUx", "LeagueClient", "RiotClientServices"];

const LOCKFILE_NAME: &str = "lockfile";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    pub fn layout(self) -> &'static PlatformLayout {
        LAYOUTS.iter().find(|l| l.platform == self).unwrap_or(&OTHER_LAYOUT)
    }
}

/// Lockfile placement rules for one platform.
pub struct PlatformLayout {
    pub platform: Platform,
    install_candidates: fn() -> Vec<PathBuf>,
    near_executable: fn(&Path) -> Vec<PathBuf>,
}

impl PlatformLayout {
    /// Well-known install locations, in priority order.
    pub fn install_candidates(&self) -> Vec<PathBuf> {
        (self.install_candidates)()
    }

    /// Candidate lockfile paths for a client running from `exe`.
    pub fn lockfiles_near(&self, exe: &Path) -> Vec<PathBuf> {
        match exe.parent() {
            Some(dir) => (self.near_executable)(dir),
            None => Vec::new(),
        }
    }
}

static LAYOUTS: [PlatformLayout; 3] = [
    PlatformLayout {
        platform: Platform::Windows,
        install_candidates: windows_install_candidates,
        near_executable: sibling_lockfile,
    },
    PlatformLayout {
        platform: Platform::MacOs,
        install_candidates: macos_install_candidates,
        near_executable: macos_bundle_lockfiles,
    },
    PlatformLayout {
        platform: Platform::Linux,
        install_candidates: wine_install_candidates,
        near_executable: sibling_lockfile,
    },
];

static OTHER_LAYOUT: PlatformLayout = PlatformLayout {
    platform: Platform::Other,
    install_candidates: Vec::new,
    near_executable: sibling_lockfile,
};

/// `...\League of Legends\lockfile`
fn sibling_lockfile(dir: &Path) -> Vec<PathBuf> {
    vec![dir.join(LOCKFILE_NAME)]
}

/// `League of Legends.app/Contents/LoL/lockfile`, found one or two levels up
/// from the executable inside the bundle. The Ux helper runs from a nested
/// `.app` inside `Contents/LoL`, so the nearest `LoL` ancestor is tried too.
fn macos_bundle_lockfiles(dir: &Path) -> Vec<PathBuf> {
    let mut out = sibling_lockfile(dir);
    let mut ancestor = dir.parent();
    for _ in 0..2 {
        let Some(up) = ancestor else { break };
        out.push(up.join("LoL").join(LOCKFILE_NAME));
        ancestor = up.parent();
    }
    if let Some(lol) = dir.ancestors().find(|a| a.file_name().is_some_and(|n| n == "LoL")) {
        out.push(lol.join(LOCKFILE_NAME));
    }
    let mut seen = Vec::with_capacity(out.len());
    out.retain(|p| {
        let fresh = !seen.contains(p);
        if fresh {
            seen.push(p.clone());
        }
        fresh
    });
    out
}

fn windows_install_candidates() -> Vec<PathBuf> {
    let suffix = Path::new("Riot Games").join("League of Legends").join(LOCKFILE_NAME);
    let mut out = vec![PathBuf::from(r"C:\Riot Games\League of Legends").join(LOCKFILE_NAME)];
    for var in ["ProgramFiles", "ProgramFiles(x86)"] {
        if let Ok(dir) = std::env::var(var) {
            out.push(PathBuf::from(dir).join(&suffix));
        }
    }
    out
}

fn macos_install_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/Applications/League of Legends.app/Contents/LoL/lockfile"),
        PathBuf::from("/Applications/Riot Games/League of Legends.app/Contents/LoL/lockfile"),
    ]
}

fn wine_install_candidates() -> Vec<PathBuf> {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => vec![PathBuf::from(home)
            .join(".wine/drive_c/Riot Games/League of Legends")
            .join(LOCKFILE_NAME)],
        _ => Vec::new(),
    }
}

// -- Process scanning ---------------------------------------------------------

/// A running process as seen by a [`ProcessScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub name: String,
    pub exe: PathBuf,
}

impl ProcessInfo {
    /// Whether this process is one of the League Client executables.
    pub fn is_client(&self) -> bool {
        is_client_process(&self.name)
    }
}

/// Case-insensitive match against [`CLIENT_PROCESS_NAMES`], ignoring `.exe`.
pub fn is_client_process(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let stem = lower.strip_suffix(".exe").unwrap_or(&lower);
    CLIENT_PROCESS_NAMES.iter().any(|known| known.eq_ignore_ascii_case(stem))
}

/// Enumerates running processes. Implementations must not fail: processes
/// that cannot be inspected are skipped.
pub trait ProcessScanner: Send + Sync {
    fn running(&self) -> Vec<ProcessInfo>;
}

/// Scanner backed by `sysinfo`. Only executable paths are refreshed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessScanner;

impl ProcessScanner for SystemProcessScanner {
    fn running(&self) -> Vec<ProcessInfo> {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
        );
        system.processes().values().filter_map(process_info).collect()
    }
}

/// Processes whose executable cannot be read (other users, kernel threads)
/// are skipped. The name comes from the executable path because Linux
/// truncates `comm` to 15 bytes.
fn process_info(process: &sysinfo::Process) -> Option<ProcessInfo> {
    let exe = process.exe()?.to_path_buf();
    let name = match exe.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => process.name().to_string_lossy().into_owned(),
    };
    Some(ProcessInfo { name, exe })
}

/// Candidate lockfile paths derived from running client processes.
pub fn candidates_from_processes(
    scanner: &dyn ProcessScanner,
    layout: &PlatformLayout,
) -> Vec<PathBuf> {
    scanner
        .running()
        .into_iter()
        .filter(ProcessInfo::is_client)
        .flat_map(|p| layout.lockfiles_near(&p.exe))
        .filter(|path| path.is_file())
        .collect()
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
