//! Run configuration loaded from `~/.config/patscrape/config.toml`.
//!
//! Every key is optional; a missing file means all defaults. CLI flags are
//! applied on top by the binary.
//!
//! ```toml
//! output_dir = "patents"
//!
//! [fetch]
//! timeout_secs = 30
//! min_body_bytes = 1024
//! force_rendered = false
//!
//! [caps]
//! abstract = 2000
//! description = 2000
//! claims = 5000
//! full_text = 15000
//!
//! [batch]
//! concurrency = 1
//! rendered_sessions = 1
//! host_interval_ms = 0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::extract::FieldName;
use crate::fetch::http::DEFAULT_USER_AGENT;
use crate::fetch::DEFAULT_MIN_BODY_BYTES;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub caps: FieldCaps,
    pub batch: BatchConfig,
    /// Directory receiving one `<slug>.json` per record.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            caps: FieldCaps::default(),
            batch: BatchConfig::default(),
            output_dir: PathBuf::from("patents"),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Static bodies at or below this size are treated as script shells.
    pub min_body_bytes: usize,
    /// Start with the rendered source instead of plain HTTP.
    pub force_rendered: bool,
    pub user_agent: String,
    /// Chrome/Chromium executable; searched on `PATH` when unset.
    pub chrome_path: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            min_body_bytes: DEFAULT_MIN_BODY_BYTES,
            force_rendered: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_path: None,
        }
    }
}

/// Maximum characters kept per text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldCaps {
    #[serde(rename = "abstract")]
    pub abstract_text: usize,
    pub description: usize,
    pub claims: usize,
    pub full_text: usize,
}

impl Default for FieldCaps {
    fn default() -> Self {
        Self {
            abstract_text: 2000,
            description: 2000,
            claims: 5000,
            full_text: 15000,
        }
    }
}

impl FieldCaps {
    /// Cap for a text field; metadata fields are uncapped.
    #[must_use]
    pub fn cap_for(&self, field: FieldName) -> Option<usize> {
        match field {
            FieldName::Abstract => Some(self.abstract_text),
            FieldName::Description => Some(self.description),
            FieldName::Claims => Some(self.claims),
            FieldName::FullText => Some(self.full_text),
            FieldName::Title | FieldName::Status | FieldName::Year => None,
        }
    }
}

/// Batch scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// URLs processed at once. `1` is strictly sequential.
    pub concurrency: usize,
    /// Headless browser sessions allowed at once.
    pub rendered_sessions: usize,
    /// Minimum gap between two requests to the same host.
    pub host_interval_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            rendered_sessions: 1,
            host_interval_ms: 0,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    /// Load and validate a specific file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject settings that would make every fetch fail or stall.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch.timeout_secs must be at least 1".into()));
        }
        if self.batch.concurrency == 0 {
            return Err(ConfigError::Invalid("batch.concurrency must be at least 1".into()));
        }
        if self.batch.rendered_sessions == 0 {
            return Err(ConfigError::Invalid(
                "batch.rendered_sessions must be at least 1".into(),
            ));
        }
        for field in [
            FieldName::Abstract,
            FieldName::Description,
            FieldName::Claims,
            FieldName::FullText,
        ] {
            if self.caps.cap_for(field) == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "caps.{} must be at least 1",
                    field.as_str()
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    #[must_use]
    pub fn host_interval(&self) -> Duration {
        Duration::from_millis(self.batch.host_interval_ms)
    }
}

/// Return the path to the config file.
#[must_use]
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("patscrape")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.caps.claims, 5000);
        assert_eq!(config.fetch.min_body_bytes, 1024);
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
output_dir = "/tmp/out"

[caps]
abstract = 500

[batch]
concurrency = 4
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.caps.abstract_text, 500);
        assert_eq!(config.caps.description, 2000);
        assert_eq!(config.batch.concurrency, 4);
        assert_eq!(config.batch.rendered_sessions, 1);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn caps_apply_to_text_fields_only() {
        let caps = FieldCaps::default();
        assert_eq!(caps.cap_for(FieldName::FullText), Some(15000));
        assert_eq!(caps.cap_for(FieldName::Title), None);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch]\nconcurrency = 0").unwrap();
        let err = Config::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fetch\ntimeout_secs = ").unwrap();
        let err = Config::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::from_path(Path::new("/nonexistent/patscrape.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
