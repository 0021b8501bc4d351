//! Batch orchestration over many URLs.
//!
//! Every URL runs in isolation: a failure (typed error or extraction panic)
//! becomes a [`UrlOutcome::Failure`] and the batch moves on. Outcomes keep
//! input order at any concurrency.

use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::ErrorKind;
use crate::pipeline::{Diagnostics, Engine};
use crate::record::PatentRecord;

/// Batch scheduling knobs.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// URLs in flight at once; `1` is sequential.
    pub concurrency: usize,
    /// Fetches not started by this instant fail with `Timeout`.
    pub deadline: Option<Instant>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            deadline: None,
        }
    }
}

/// Result for one input URL.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UrlOutcome {
    Success {
        url: String,
        record: Box<PatentRecord>,
        diagnostics: Diagnostics,
    },
    Failure {
        url: String,
        kind: ErrorKind,
        message: String,
    },
}

impl UrlOutcome {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            UrlOutcome::Success { url, .. } | UrlOutcome::Failure { url, .. } => url,
        }
    }

    #[must_use]
    pub fn record(&self) -> Option<&PatentRecord> {
        match self {
            UrlOutcome::Success { record, .. } => Some(record),
            UrlOutcome::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            UrlOutcome::Success { .. } => None,
            UrlOutcome::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Ordered outcomes plus aggregate counts.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<UrlOutcome>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchResult {
    pub fn records(&self) -> impl Iterator<Item = &PatentRecord> {
        self.outcomes.iter().filter_map(UrlOutcome::record)
    }

    pub fn failures(&self) -> impl Iterator<Item = &UrlOutcome> {
        self.outcomes.iter().filter(|o| o.error_kind().is_some())
    }
}

impl Engine {
    /// Run every URL through the pipeline and collect per-URL outcomes.
    #[instrument(skip_all, fields(urls = urls.len(), concurrency = options.concurrency))]
    pub async fn run_batch(&self, urls: &[String], options: &BatchOptions) -> BatchResult {
        let started_at = Utc::now();
        let deadline = options.deadline;

        let outcomes: Vec<UrlOutcome> = stream::iter(urls)
            .map(|url| async move {
                match self.process(url, deadline).await {
                    Ok(extraction) => UrlOutcome::Success {
                        url: url.clone(),
                        record: Box::new(extraction.record),
                        diagnostics: extraction.diagnostics,
                    },
                    Err(err) => {
                        warn!(url = %url, kind = %err.kind(), error = %err, "URL failed");
                        UrlOutcome::Failure {
                            url: url.clone(),
                            kind: err.kind(),
                            message: err.to_string(),
                        }
                    }
                }
            })
            .buffered(options.concurrency.max(1))
            .collect()
            .await;

        let succeeded = outcomes.iter().filter(|o| o.record().is_some()).count();
        let attempted = outcomes.len();
        let failed = attempted - succeeded;
        info!(attempted, succeeded, failed, "Batch complete");

        BatchResult {
            outcomes,
            attempted,
            succeeded,
            failed,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Parse a newline-delimited URL list.
///
/// Only blank lines and `#` comments are skipped. Everything else is kept
/// as-is so the resolver can report it, unsupported or not.
#[must_use]
pub fn read_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
