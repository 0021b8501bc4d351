//! Error types shared across the extraction pipeline.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::fetch::FetchError;

/// Misconfiguration that aborts a run before any URL is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid selector `{css}` in {platform} profile: {reason}")]
    Selector {
        platform: &'static str,
        css: &'static str,
        reason: String,
    },

    #[error("invalid pattern `{pattern}` in {platform} profile: {source}")]
    Pattern {
        platform: &'static str,
        pattern: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("no platform profiles loaded")]
    NoProfiles,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure of a single URL's pipeline run. Always recoverable at batch level.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unsupported platform: {url}")]
    Unsupported { url: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no title or page text recoverable from {url}")]
    EmptyDocument { url: String },

    #[error("extraction task failed: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Stable error kind used in batch summaries.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Unsupported { .. } => ErrorKind::Unsupported,
            PipelineError::Fetch(FetchError::NotFound { .. }) => ErrorKind::NotFound,
            PipelineError::Fetch(FetchError::Timeout { .. }) => ErrorKind::Timeout,
            PipelineError::Fetch(FetchError::Failed { .. }) => ErrorKind::RetrievalFailed,
            PipelineError::EmptyDocument { .. } => ErrorKind::EmptyDocument,
            PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Per-URL failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unsupported,
    NotFound,
    Timeout,
    RetrievalFailed,
    EmptyDocument,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::RetrievalFailed => "RetrievalFailed",
            ErrorKind::EmptyDocument => "EmptyDocument",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::fetch::FetchMethod;

    #[test]
    fn kinds_follow_fetch_failures() {
        let not_found = PipelineError::from(FetchError::NotFound {
            url: "https://patents.google.com/patent/X".into(),
        });
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let timeout = PipelineError::from(FetchError::Timeout {
            method: FetchMethod::Static,
            after: Duration::from_secs(5),
        });
        assert_eq!(timeout.kind(), ErrorKind::Timeout);

        let failed = PipelineError::from(FetchError::Failed {
            method: FetchMethod::Rendered,
            status: Some(503),
            reason: "HTTP 503".into(),
        });
        assert_eq!(failed.kind(), ErrorKind::RetrievalFailed);
    }

    #[test]
    fn kind_display_matches_summary_labels() {
        assert_eq!(ErrorKind::NotFound.to_string(), "NotFound");
        assert_eq!(ErrorKind::EmptyDocument.to_string(), "EmptyDocument");
        assert_eq!(
            serde_json::to_string(&ErrorKind::RetrievalFailed).unwrap(),
            "\"retrieval_failed\""
        );
    }
}
