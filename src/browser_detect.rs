//! Chrome/Chromium Detection
//!
//! Locates a Chromium-family executable for rendered retrieval. Checks
//! `PATH` first, then the usual install locations on macOS and Windows.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Executable names tried on `PATH`, most specific first.
const CANDIDATES: [&str; 6] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
    "brave-browser",
];

#[cfg(target_os = "macos")]
const INSTALL_PATHS: [&str; 3] = [
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "windows")]
const INSTALL_PATHS: [&str; 2] = [
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const INSTALL_PATHS: [&str; 0] = [];

/// Find a Chrome-compatible executable, if any.
#[must_use]
pub fn find_chrome() -> Option<PathBuf> {
    find_chrome_in(CANDIDATES.iter().map(|name| which::which(name).ok()))
        .or_else(|| INSTALL_PATHS.iter().map(Path::new).find(|p| p.exists()).map(Path::to_path_buf))
}

fn find_chrome_in(mut lookups: impl Iterator<Item = Option<PathBuf>>) -> Option<PathBuf> {
    lookups.find_map(|found| found)
}

/// What the `diagnose` command reports.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSupport {
    /// Whether the binary was built with the `rendered` feature.
    pub compiled: bool,
    pub chrome: Option<PathBuf>,
}

impl RenderSupport {
    #[must_use]
    pub fn detect() -> Self {
        Self {
            compiled: cfg!(feature = "rendered"),
            chrome: find_chrome(),
        }
    }

    /// Rendered retrieval will actually run.
    #[must_use]
    pub fn usable(&self) -> bool {
        self.compiled && self.chrome.is_some()
    }
}
