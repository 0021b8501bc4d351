//! `patscrape` - Resilient patent page extraction
//!
//! # Features
//!
//! - **Platform profiles**: Google Patents, USPTO and Espacenet selector tables
//! - **Escalating retrieval**: static HTTP first, headless Chrome on demand
//! - **Fallback selectors**: every field degrades through an ordered chain
//! - **Claims**: ordinal numbering preserved exactly as published
//!
//! # Example
//!
//! ```rust,no_run
//! use patscrape::{BatchOptions, Config, Engine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = Engine::from_config(&Config::default())?;
//!     let urls = vec!["https://patents.google.com/patent/US9000000B2/en".to_string()];
//!     let batch = engine.run_batch(&urls, &BatchOptions::default()).await;
//!     println!("{}/{} extracted", batch.succeeded, batch.attempted);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod browser_detect;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod record;
pub mod search;
pub mod site;

pub use batch::{BatchOptions, BatchResult, UrlOutcome};
pub use config::{Config, FieldCaps};
pub use error::{ConfigError, ErrorKind, PipelineError};
pub use extract::claims::{ClaimItem, ClaimSet};
pub use extract::{ExtractedField, FieldName};
pub use fetch::{FetchError, FetchMethod, FetchResult, PageSource, RawPage, Retrieval, SourceError};
pub use pipeline::{Diagnostics, Engine, Extraction, FieldReport};
pub use record::{PatentRecord, PatentStatus, Year};
pub use site::{Platform, PlatformProfile, PlatformResolver, Resolution};

/// Version of patscrape
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
