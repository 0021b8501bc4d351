//! Rendered retrieval through headless Chrome.
//!
//! `headless_chrome` is synchronous, so every session runs inside
//! `spawn_blocking`. A semaphore caps concurrent browser sessions; each
//! browser is launched and dropped within a single `load`, so no session
//! outlives the URL it was opened for.
//!
//! The blocking side cannot be cancelled by dropping the future, so it
//! carries its own deadline and a cancel flag, both checked between steps.
//! Once either trips, the browser is dropped and its process killed.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use super::{FetchMethod, PageSource, RawPage, SourceError};

/// Wait after navigation so client-side rendering can settle.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(2);

const CHROME_ARGS: [&str; 6] = [
    "--disable-blink-features=AutomationControlled",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-extensions",
    "--mute-audio",
    "--window-size=1920,1080",
];

/// Headless Chrome page source.
pub struct BrowserSource {
    sessions: Arc<Semaphore>,
    chrome_path: Option<PathBuf>,
    settle: Duration,
}

impl BrowserSource {
    /// `max_sessions` browsers may run at once (minimum 1).
    #[must_use]
    pub fn new(max_sessions: usize, chrome_path: Option<PathBuf>) -> Self {
        Self {
            sessions: Arc::new(Semaphore::new(max_sessions.max(1))),
            chrome_path,
            settle: DEFAULT_SETTLE,
        }
    }

    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

#[async_trait]
impl PageSource for BrowserSource {
    fn method(&self) -> FetchMethod {
        FetchMethod::Rendered
    }

    #[instrument(skip(self))]
    async fn load(&self, url: &str, timeout: Duration) -> Result<RawPage, SourceError> {
        let budget = Budget::new(timeout);
        let _cancel = CancelOnDrop(budget.cancelled.clone());
        let permit = self
            .sessions
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let url = url.to_string();
        let chrome_path = self.chrome_path.clone();
        let settle = self.settle;

        let rendered = tokio::task::spawn_blocking(move || {
            let result = render(&url, &budget, settle, chrome_path);
            drop(permit);
            result
        })
        .await
        .map_err(|e| SourceError::Unavailable(format!("browser task failed: {e}")))?;

        rendered.map(|body| RawPage { status: None, body })
    }
}

/// Time left for one rendered load, shared with the blocking session.
struct Budget {
    deadline: Instant,
    cancelled: Arc<AtomicBool>,
}

impl Budget {
    fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn remaining(&self) -> Result<Duration, SourceError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(SourceError::Timeout);
        }
        let left = self.deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(SourceError::Timeout);
        }
        Ok(left)
    }
}

/// Flags the session as abandoned when the awaiting future goes away.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn render(
    url: &str,
    budget: &Budget,
    settle: Duration,
    chrome_path: Option<PathBuf>,
) -> Result<String, SourceError> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .path(chrome_path)
        .idle_browser_timeout(budget.remaining()?)
        .args(CHROME_ARGS.iter().map(OsStr::new).collect())
        .build()
        .map_err(|e| SourceError::Unavailable(format!("invalid launch options: {e}")))?;

    let browser =
        Browser::new(options).map_err(|e| SourceError::Unavailable(format!("launch failed: {e}")))?;

    let result = drive(&browser, url, budget, settle);
    if matches!(result, Err(SourceError::Timeout)) {
        warn!("Render budget exhausted, closing browser");
    }
    // Dropping the last handle kills the Chrome process.
    drop(browser);
    result
}

fn drive(browser: &Browser, url: &str, budget: &Budget, settle: Duration) -> Result<String, SourceError> {
    let tab = browser
        .new_tab()
        .map_err(|e| SourceError::Unavailable(format!("new tab failed: {e}")))?;
    tab.set_default_timeout(budget.remaining()?);

    debug!("Navigating headless tab");
    tab.navigate_to(url)
        .map_err(|e| SourceError::Unavailable(format!("navigation failed: {e}")))?;

    tab.set_default_timeout(budget.remaining()?);
    if let Err(e) = tab.wait_until_navigated() {
        warn!(error = %e, "Navigation did not complete in time");
        return Err(SourceError::Timeout);
    }

    std::thread::sleep(settle.min(budget.remaining()?));
    budget.remaining()?;

    tab.get_content()
        .map_err(|e| SourceError::Unavailable(format!("reading content failed: {e}")))
}
