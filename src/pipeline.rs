//! Per-URL pipeline: resolve, fetch, clean, extract, assemble.
//!
//! Parsing and extraction are CPU-bound and run on the blocking pool, which
//! also turns a panic inside extraction into an ordinary per-URL failure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, FieldCaps};
use crate::content::normalize::normalize;
use crate::error::{ConfigError, PipelineError};
use crate::extract::claims::locate_claims;
use crate::extract::{resolve_field, FieldName, Page};
use crate::fetch::{FetchMethod, HttpSource, Retrieval};
use crate::record::{assemble, PatentRecord, RecordFields};
use crate::site::{PlatformProfile, PlatformResolver, Resolution};

/// How one field was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub field: FieldName,
    /// Selector rank that produced the value; `None` when absent.
    pub rank: Option<usize>,
    pub selector: Option<&'static str>,
    pub truncated: bool,
}

/// Per-URL diagnostics, kept beside (not inside) the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub platform: &'static str,
    pub method: FetchMethod,
    pub status: Option<u16>,
    pub elapsed_ms: u64,
    pub fields: Vec<FieldReport>,
}

impl Diagnostics {
    #[must_use]
    pub fn field(&self, field: FieldName) -> Option<&FieldReport> {
        self.fields.iter().find(|r| r.field == field)
    }

    /// Fields resolved by something other than their primary selector.
    pub fn fallbacks(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|r| r.rank.is_some_and(|rank| rank > 0))
    }
}

/// A record plus how it was extracted.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: PatentRecord,
    pub diagnostics: Diagnostics,
}

/// Owns compiled profiles and retrieval; shared by every URL in a run.
pub struct Engine {
    resolver: Arc<PlatformResolver>,
    retrieval: Retrieval,
    caps: FieldCaps,
    timeout: Duration,
    prefer_rendered: bool,
}

impl Engine {
    #[must_use]
    pub fn new(resolver: PlatformResolver, retrieval: Retrieval, caps: FieldCaps, timeout: Duration) -> Self {
        Self {
            resolver: Arc::new(resolver),
            retrieval,
            caps,
            timeout,
            prefer_rendered: false,
        }
    }

    /// Build the production engine: all platforms, reqwest, and headless Chrome
    /// when the `rendered` feature is compiled in.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let resolver = PlatformResolver::new()?;

        let http = HttpSource::new(&config.fetch.user_agent)?;
        #[allow(unused_mut)]
        let mut retrieval = Retrieval::new(Arc::new(http))
            .with_min_body_bytes(config.fetch.min_body_bytes)
            .with_host_interval(config.host_interval());

        #[cfg(feature = "rendered")]
        {
            let chrome = config
                .fetch
                .chrome_path
                .clone()
                .or_else(crate::browser_detect::find_chrome);
            debug!(chrome = ?chrome, "Rendered retrieval enabled");
            retrieval = retrieval.with_rendered(Arc::new(crate::fetch::BrowserSource::new(
                config.batch.rendered_sessions,
                chrome,
            )));
        }

        if config.fetch.force_rendered && !retrieval.has_rendered() {
            warn!("Rendered retrieval requested but not compiled in; using static HTTP only");
        }

        Ok(Self::new(resolver, retrieval, config.caps, config.timeout())
            .prefer_rendered(config.fetch.force_rendered))
    }

    #[must_use]
    pub fn prefer_rendered(mut self, prefer: bool) -> Self {
        self.prefer_rendered = prefer;
        self
    }

    #[must_use]
    pub fn resolver(&self) -> &PlatformResolver {
        &self.resolver
    }

    /// Run the full pipeline for one URL.
    #[instrument(skip(self, deadline))]
    pub async fn process(&self, url: &str, deadline: Option<Instant>) -> Result<Extraction, PipelineError> {
        let profile = match self.resolver.resolve(url) {
            Resolution::Supported(profile) => profile,
            Resolution::Unsupported => {
                return Err(PipelineError::Unsupported {
                    url: url.to_string(),
                })
            }
        };
        let platform = profile.platform();

        let fetched = self
            .retrieval
            .fetch(url, profile, self.timeout, self.prefer_rendered, deadline)
            .await?;

        let resolver = Arc::clone(&self.resolver);
        let caps = self.caps;
        let owned_url = url.to_string();
        let html = fetched.html;

        let extracted = tokio::task::spawn_blocking(move || {
            let profile = resolver
                .profile(platform)
                .ok_or_else(|| PipelineError::Internal(format!("profile for {} vanished", platform.name())))?;
            extract_document(&owned_url, &html, profile, &caps)
        })
        .await
        .map_err(|e| PipelineError::Internal(join_failure(e)))?;

        let (record, fields) = extracted?;
        let diagnostics = Diagnostics {
            platform: platform.name(),
            method: fetched.method,
            status: fetched.status,
            elapsed_ms: u64::try_from(fetched.elapsed.as_millis()).unwrap_or(u64::MAX),
            fields,
        };
        log_diagnostics(&diagnostics);

        info!(slug = %record.slug, claims = record.claims.len(), method = %fetched.method, "Record assembled");
        Ok(Extraction { record, diagnostics })
    }
}

/// Extract a record from already-fetched markup. Pure and deterministic.
pub fn extract_document(
    url: &str,
    html: &str,
    profile: &PlatformProfile,
    caps: &FieldCaps,
) -> Result<(PatentRecord, Vec<FieldReport>), PipelineError> {
    let page = Page::parse(html, profile);
    let mut reports = Vec::with_capacity(FieldName::ALL.len());

    let mut text_field = |field: FieldName| -> Option<String> {
        let resolved = resolve_field(&page, profile, field);
        let cap = caps.cap_for(field).unwrap_or(usize::MAX);
        let normalized = resolved.value.as_deref().map(|v| normalize(v, cap));
        let truncated = normalized.as_ref().is_some_and(|n| n.truncated);
        let value = normalized.map(|n| n.text).filter(|t| !t.is_empty());

        reports.push(FieldReport {
            field,
            rank: value.as_ref().and(resolved.rank),
            selector: value.as_ref().and(resolved.selector),
            truncated,
        });
        value
    };

    let title = text_field(FieldName::Title);
    let status = text_field(FieldName::Status);
    let year = text_field(FieldName::Year);
    let abstract_text = text_field(FieldName::Abstract);
    let description = text_field(FieldName::Description);
    let full_text = text_field(FieldName::FullText);

    let (claims, claims_rank) = locate_claims(page.cleaned(), profile);
    let (claims, claims_truncated) = claims.capped(caps.claims);
    let claim_candidates = profile.candidates(FieldName::Claims);
    reports.push(FieldReport {
        field: FieldName::Claims,
        rank: claims_rank,
        selector: claims_rank.map(|r| claim_candidates.get(r).map_or("heading", |c| c.css)),
        truncated: claims_truncated,
    });

    let fields = RecordFields {
        title,
        status,
        year,
        abstract_text,
        description,
        full_text,
    };
    let record = assemble(url, profile.platform(), fields, claims)?;
    Ok((record, reports))
}

fn log_diagnostics(diagnostics: &Diagnostics) {
    for report in &diagnostics.fields {
        match report.rank {
            Some(rank) => debug!(
                field = report.field.as_str(),
                rank,
                selector = report.selector.unwrap_or_default(),
                truncated = report.truncated,
                "Field resolved"
            ),
            None => debug!(field = report.field.as_str(), "Field absent"),
        }
    }
    let fallbacks = diagnostics.fallbacks().count();
    if fallbacks > 0 {
        info!(platform = diagnostics.platform, fallbacks, "Fields recovered via fallback selectors");
    }
}

fn join_failure(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("extraction panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("extraction panicked: {msg}")
    } else {
        "extraction panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fetch::tests::Scripted;
    use crate::fetch::{RawPage, SourceError};
    use crate::site::Platform;

    const PAGE: &str = r#"<html><head>
        <meta name="DC.title" content="Glucose   biosensor with enzyme layer">
        </head><body>
        <nav>Home | Search</nav>
        <article>
          <span itemprop="status">Active</span>
          <time itemprop="filingDate" datetime="2016-03-02">Mar 2, 2016</time>
          <section itemprop="abstract"><div class="abstract">An amperometric glucose biosensor with a stabilised enzyme layer.</div></section>
          <section itemprop="description"><p>The invention relates to biosensors used for continuous glucose monitoring in clinical settings and at home.</p></section>
          <section itemprop="claims">
            <div class="claim" num="00001">1. A biosensor comprising an electrode.</div>
            <div class="claim" num="00002">2. The biosensor of claim 1 wherein the electrode is carbon.</div>
          </section>
        </article>
        <footer>Privacy</footer>
        </body></html>"#;

    fn google_profile(resolver: &PlatformResolver) -> &PlatformProfile {
        resolver.profile(Platform::GooglePatents).unwrap()
    }

    #[test]
    fn extracts_full_record() {
        let resolver = PlatformResolver::new().unwrap();
        let (record, reports) = extract_document(
            "https://patents.google.com/patent/US1",
            PAGE,
            google_profile(&resolver),
            &FieldCaps::default(),
        )
        .unwrap();

        assert_eq!(record.title.as_deref(), Some("Glucose biosensor with enzyme layer"));
        assert_eq!(record.status, crate::record::PatentStatus::Granted);
        assert_eq!(record.year, crate::record::Year::Known(2016));
        assert_eq!(record.claims.ordinals(), vec![1, 2]);
        assert_eq!(record.slug, "granted_2016_glucose_biosensor_enzyme");
        assert!(!record.full_text.unwrap().contains("Privacy"));
        assert_eq!(reports.len(), FieldName::ALL.len());
        assert!(reports.iter().all(|r| !r.truncated));
    }

    #[test]
    fn caps_are_reported_as_truncation() {
        let resolver = PlatformResolver::new().unwrap();
        let caps = FieldCaps {
            abstract_text: 30,
            description: 2000,
            claims: 20,
            full_text: 15000,
        };
        let (record, reports) = extract_document(
            "https://patents.google.com/patent/US1",
            PAGE,
            google_profile(&resolver),
            &caps,
        )
        .unwrap();

        assert!(record.abstract_text.unwrap().chars().count() <= 30);
        assert!(record.claims.to_text().chars().count() <= 20);
        let truncated: Vec<FieldName> = reports.iter().filter(|r| r.truncated).map(|r| r.field).collect();
        assert_eq!(truncated, vec![FieldName::Abstract, FieldName::Claims]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let resolver = PlatformResolver::new().unwrap();
        let profile = google_profile(&resolver);
        let caps = FieldCaps::default();
        let first = extract_document("https://patents.google.com/patent/US1", PAGE, profile, &caps).unwrap();
        let second = extract_document("https://patents.google.com/patent/US1", PAGE, profile, &caps).unwrap();
        assert_eq!(first, second);
    }

    fn engine_with(page: Result<RawPage, SourceError>) -> Engine {
        let source = Scripted::new(FetchMethod::Static, page);
        Engine::new(
            PlatformResolver::new().unwrap(),
            Retrieval::new(source).with_min_body_bytes(64),
            FieldCaps::default(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn process_reports_diagnostics() {
        let engine = engine_with(Ok(RawPage::ok(PAGE)));
        let extraction = engine
            .process("https://patents.google.com/patent/US1/en", None)
            .await
            .unwrap();

        assert_eq!(extraction.diagnostics.platform, "google_patents");
        assert_eq!(extraction.diagnostics.method, FetchMethod::Static);
        let title = extraction.diagnostics.field(FieldName::Title).unwrap();
        assert_eq!(title.rank, Some(0));
    }

    #[tokio::test]
    async fn unsupported_url_never_fetches() {
        let engine = engine_with(Ok(RawPage::ok(PAGE)));
        let err = engine.process("https://example.com/patent/1", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn page_without_title_or_text_is_empty_document() {
        let shell = format!("<html><head><script>{}</script></head><body></body></html>", "x".repeat(200));
        let engine = engine_with(Ok(RawPage::ok(shell)));
        let err = engine
            .process("https://patents.uspto.gov/patent/1", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyDocument);
    }
}
