//! Page retrieval with one-step escalation.
//!
//! A fetch walks an explicit [`Stage`] machine:
//!
//! ```text
//! Static ──(non-200 | timeout | undersized body)──▶ Rendered ──▶ Failed
//!   │                                                  │
//!   └────────────── 404 ──▶ NotFound ◀──────────────────┘
//! ```
//!
//! With `prefer_rendered` the order is reversed (`Rendered` first, one
//! static fallback). At most two attempts are made per URL; nothing is
//! retried beyond that.

pub mod http;

#[cfg(feature = "rendered")]
pub mod browser;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::site::PlatformProfile;

pub use http::HttpSource;

#[cfg(feature = "rendered")]
pub use browser::BrowserSource;

/// Default minimum body size for a static response to count as a real page.
pub const DEFAULT_MIN_BODY_BYTES: usize = 1024;

/// How a page was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    Static,
    Rendered,
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMethod::Static => f.write_str("static"),
            FetchMethod::Rendered => f.write_str("rendered"),
        }
    }
}

/// A successfully retrieved page.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub html: String,
    pub method: FetchMethod,
    pub status: Option<u16>,
    pub elapsed: Duration,
}

/// Terminal retrieval failure for one URL.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("page not found (HTTP 404): {url}")]
    NotFound { url: String },

    #[error("{method} retrieval timed out after {after:?}")]
    Timeout { method: FetchMethod, after: Duration },

    #[error("{method} retrieval failed: {reason}")]
    Failed {
        method: FetchMethod,
        status: Option<u16>,
        reason: String,
    },
}

/// What a [`PageSource`] handed back. `status` is `None` for rendered sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub status: Option<u16>,
    pub body: String,
}

impl RawPage {
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: Some(200),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }
}

/// Transport-level failure reported by a [`PageSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("timed out")]
    Timeout,

    #[error("{0}")]
    Unavailable(String),
}

/// A way of turning a URL into markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    fn method(&self) -> FetchMethod;

    /// Load `url`, giving up after `timeout`.
    async fn load(&self, url: &str, timeout: Duration) -> Result<RawPage, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Static,
    Rendered,
    Failed,
}

impl Stage {
    fn method(self) -> Option<FetchMethod> {
        match self {
            Stage::Static => Some(FetchMethod::Static),
            Stage::Rendered => Some(FetchMethod::Rendered),
            Stage::Failed => None,
        }
    }
}

/// Minimum spacing between requests to the same host.
#[derive(Debug, Default)]
pub struct HostThrottle {
    interval: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl HostThrottle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until this host's next request slot. Slots are reserved under the lock
    /// so concurrent callers queue up instead of firing together.
    pub async fn wait(&self, url: &str) {
        if self.interval.is_zero() {
            return;
        }
        let Some(host) = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        else {
            return;
        };

        let slot = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots.get(&host).copied().map_or(now, |s| s.max(now));
            slots.insert(host, slot + self.interval);
            slot
        };

        tokio::time::sleep_until(slot.into()).await;
    }
}

/// Escalating retrieval over a static source and an optional rendered one.
pub struct Retrieval {
    static_source: Arc<dyn PageSource>,
    rendered_source: Option<Arc<dyn PageSource>>,
    min_body_bytes: usize,
    throttle: HostThrottle,
}

impl Retrieval {
    #[must_use]
    pub fn new(static_source: Arc<dyn PageSource>) -> Self {
        Self {
            static_source,
            rendered_source: None,
            min_body_bytes: DEFAULT_MIN_BODY_BYTES,
            throttle: HostThrottle::default(),
        }
    }

    #[must_use]
    pub fn with_rendered(mut self, source: Arc<dyn PageSource>) -> Self {
        self.rendered_source = Some(source);
        self
    }

    #[must_use]
    pub fn with_min_body_bytes(mut self, bytes: usize) -> Self {
        self.min_body_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_host_interval(mut self, interval: Duration) -> Self {
        self.throttle = HostThrottle::new(interval);
        self
    }

    #[must_use]
    pub fn has_rendered(&self) -> bool {
        self.rendered_source.is_some()
    }

    fn source(&self, method: FetchMethod) -> Option<&Arc<dyn PageSource>> {
        match method {
            FetchMethod::Static => Some(&self.static_source),
            FetchMethod::Rendered => self.rendered_source.as_ref(),
        }
    }

    /// The stage after a failed attempt. Each method is tried at most once.
    fn escalate(&self, tried: &[FetchMethod]) -> Stage {
        let next = match tried {
            [FetchMethod::Static] if self.has_rendered() => Stage::Rendered,
            [FetchMethod::Rendered] => Stage::Static,
            _ => Stage::Failed,
        };
        if next != Stage::Failed {
            debug!(from = ?tried, to = ?next, "Escalating retrieval");
        }
        next
    }

    /// Fetch `url` for `profile`.
    ///
    /// Each attempt gets `timeout`, clamped to `deadline` when one is given.
    /// A 404 ends the fetch immediately.
    #[instrument(skip(self, profile), fields(platform = profile.name()))]
    pub async fn fetch(
        &self,
        url: &str,
        profile: &PlatformProfile,
        timeout: Duration,
        prefer_rendered: bool,
        deadline: Option<Instant>,
    ) -> Result<FetchResult, FetchError> {
        let mut stage = if prefer_rendered && self.has_rendered() {
            Stage::Rendered
        } else {
            Stage::Static
        };
        let mut tried: Vec<FetchMethod> = Vec::with_capacity(2);
        let mut last_timeout: Option<FetchError> = None;
        let mut last_failure: Option<FetchError> = None;

        while let Some(method) = stage.method() {
            let Some(source) = self.source(method) else {
                break;
            };
            tried.push(method);

            // The throttle may sleep; the budget is whatever is left after it.
            self.throttle.wait(url).await;
            let budget = match deadline {
                Some(d) => timeout.min(d.saturating_duration_since(Instant::now())),
                None => timeout,
            };
            if budget.is_zero() {
                warn!(%method, "Deadline passed before attempt");
                last_timeout = Some(FetchError::Timeout {
                    method,
                    after: Duration::ZERO,
                });
                break;
            }

            let started = Instant::now();
            let outcome = tokio::time::timeout(budget, source.load(url, budget))
                .await
                .unwrap_or(Err(SourceError::Timeout));
            let elapsed = started.elapsed();

            match outcome {
                Ok(page) if page.status == Some(404) => {
                    info!(%method, "Page not found, not escalating");
                    return Err(FetchError::NotFound {
                        url: url.to_string(),
                    });
                }
                Ok(page) => match self.judge(method, &page) {
                    Ok(()) => {
                        info!(%method, status = ?page.status, bytes = page.body.len(), ?elapsed, "Page retrieved");
                        return Ok(FetchResult {
                            html: page.body,
                            method,
                            status: page.status,
                            elapsed,
                        });
                    }
                    Err(reason) => {
                        debug!(%method, %reason, "Attempt rejected");
                        last_failure = Some(FetchError::Failed {
                            method,
                            status: page.status,
                            reason,
                        });
                    }
                },
                Err(SourceError::Timeout) => {
                    debug!(%method, ?budget, "Attempt timed out");
                    last_timeout = Some(FetchError::Timeout {
                        method,
                        after: budget,
                    });
                }
                Err(SourceError::Unavailable(reason)) => {
                    debug!(%method, %reason, "Attempt failed");
                    last_failure = Some(FetchError::Failed {
                        method,
                        status: None,
                        reason,
                    });
                }
            }

            stage = self.escalate(&tried);
        }

        let err = last_failure.or(last_timeout).unwrap_or(FetchError::Failed {
            method: FetchMethod::Static,
            status: None,
            reason: "no retrieval source available".to_string(),
        });
        warn!(error = %err, attempts = tried.len(), "Retrieval failed");
        Err(err)
    }

    /// Static pages must be HTTP 200 and larger than the script-shell threshold;
    /// rendered pages only need markup.
    fn judge(&self, method: FetchMethod, page: &RawPage) -> Result<(), String> {
        match method {
            FetchMethod::Static => {
                if page.status != Some(200) {
                    return Err(match page.status {
                        Some(code) => format!("HTTP {code}"),
                        None => "no HTTP status".to_string(),
                    });
                }
                if page.body.len() <= self.min_body_bytes {
                    return Err(format!(
                        "body of {} bytes is below the {} byte threshold",
                        page.body.len(),
                        self.min_body_bytes
                    ));
                }
                Ok(())
            }
            FetchMethod::Rendered => {
                if page.status.is_some_and(|s| s != 200) {
                    return Err(format!("HTTP {}", page.status.unwrap_or_default()));
                }
                if page.body.trim().is_empty() {
                    return Err("rendered page is empty".to_string());
                }
                Ok(())
            }
        }
    }
}
