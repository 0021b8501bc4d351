//! End-to-end pipeline tests over HTML fixtures.
//!
//! A fixture-backed [`PageSource`] stands in for the network so the real
//! platform resolver, cleaner, field resolver and claims assembler all run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use patscrape::{
    BatchOptions, Engine, ErrorKind, FetchMethod, FieldCaps, FieldName, PageSource, PatentStatus,
    PlatformResolver, RawPage, Retrieval, SourceError, Year,
};

const WELL_FORMED: &str = "https://patents.google.com/patent/US9000001B2/en";
const MISSING: &str = "https://patents.google.com/patent/US9000002B2/en";
const FALLBACK: &str = "https://patents.google.com/patent/US9000003A1/en";
const USPTO: &str = "https://patents.uspto.gov/patent/7000000";
const ESPACENET: &str = "https://worldwide.espacenet.com/patent/search?q=pn%3DEP1000000A1";

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {path}: {e}"))
}

/// Serves fixtures by URL; anything else is a 404.
struct FixtureSource {
    pages: HashMap<&'static str, String>,
    calls: AtomicUsize,
}

impl FixtureSource {
    fn new() -> Arc<Self> {
        let pages = HashMap::from([
            (WELL_FORMED, fixture("google_well_formed.html")),
            (FALLBACK, fixture("google_fallback_claims.html")),
            (USPTO, fixture("uspto_patent.html")),
            (ESPACENET, fixture("espacenet_patent.html")),
        ]);
        Arc::new(Self {
            pages,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PageSource for FixtureSource {
    fn method(&self) -> FetchMethod {
        FetchMethod::Static
    }

    async fn load(&self, url: &str, _timeout: Duration) -> Result<RawPage, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match self.pages.get(url) {
            Some(html) => RawPage::ok(html.clone()),
            None => RawPage::with_status(404, "<html><body>Not Found</body></html>"),
        })
    }
}

fn engine(source: Arc<FixtureSource>) -> Engine {
    Engine::new(
        PlatformResolver::new().unwrap(),
        Retrieval::new(source),
        FieldCaps::default(),
        Duration::from_secs(5),
    )
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| (*u).to_string()).collect()
}

#[tokio::test]
async fn mixed_batch_isolates_failures() {
    let engine = engine(FixtureSource::new());
    let batch = engine
        .run_batch(&urls(&[WELL_FORMED, MISSING, FALLBACK]), &BatchOptions::default())
        .await;

    assert_eq!(batch.attempted, 3);
    assert_eq!(batch.succeeded, 2);
    assert_eq!(batch.failed, 1);

    let failed: Vec<_> = batch.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].url(), MISSING);
    assert_eq!(failed[0].error_kind(), Some(ErrorKind::NotFound));

    let fallback = batch.outcomes[2].record().unwrap();
    assert_eq!(fallback.claims.ordinals(), vec![1, 2, 3]);
}

#[tokio::test]
async fn well_formed_google_record() {
    let engine = engine(FixtureSource::new());
    let record = engine.process(WELL_FORMED, None).await.unwrap().record;

    assert_eq!(record.title.as_deref(), Some("Glucose biosensor with stabilised enzyme layer"));
    assert_eq!(record.status, PatentStatus::Granted);
    assert_eq!(record.year, Year::Known(2016));
    assert_eq!(record.slug, "granted_2016_glucose_biosensor_stabilised");
    assert_eq!(record.claims.ordinals(), vec![1, 2, 4]);
    assert!(record.abstract_text.unwrap().starts_with("An amperometric glucose biosensor"));

    let full = record.full_text.unwrap();
    for boilerplate in ["Advanced search", "uses cookies", "Privacy", "Similar documents"] {
        assert!(!full.contains(boilerplate), "{boilerplate} leaked into full text");
    }
}

#[tokio::test]
async fn fallback_selectors_are_reported() {
    let engine = engine(FixtureSource::new());
    let extraction = engine.process(FALLBACK, None).await.unwrap();
    let record = &extraction.record;

    assert_eq!(record.title.as_deref(), Some("Continuous analyte monitoring patch"));
    assert_eq!(record.status, PatentStatus::Pending);
    assert_eq!(record.year, Year::Known(2021));
    assert_eq!(record.slug, "pending_2021_continuous_analyte_monitoring");
    assert!(!record.full_text.as_deref().unwrap().contains("Sponsored"));

    let claims = extraction.diagnostics.field(FieldName::Claims).unwrap();
    assert_eq!(claims.rank, Some(3));
    assert_eq!(claims.selector, Some("div.claims"));
    assert!(extraction.diagnostics.fallbacks().count() >= 3);
}

#[tokio::test]
async fn uspto_and_espacenet_profiles() {
    let engine = engine(FixtureSource::new());

    let uspto = engine.process(USPTO, None).await.unwrap().record;
    assert_eq!(uspto.platform, "uspto");
    assert_eq!(uspto.status, PatentStatus::Granted);
    assert_eq!(uspto.year, Year::Known(2008));
    assert_eq!(uspto.claims.ordinals(), vec![1, 2, 3]);
    assert_eq!(
        uspto.claims.items()[1].text,
        "The method of claim 1, further comprising storing a calibration curve."
    );
    assert!(!uspto.full_text.unwrap().contains("Trademark Office"));

    let epo = engine.process(ESPACENET, None).await.unwrap().record;
    assert_eq!(epo.platform, "espacenet");
    assert_eq!(epo.title.as_deref(), Some("Implantable oxygen sensor"));
    assert_eq!(epo.year, Year::Known(1999));
    assert_eq!(epo.claims.ordinals(), vec![1, 2, 5]);
    assert_eq!(epo.slug, "granted_1999_implantable_oxygen_sensor");
}

#[tokio::test]
async fn same_fixture_yields_identical_records() {
    let engine = engine(FixtureSource::new());
    let first = engine.process(WELL_FORMED, None).await.unwrap().record;
    let second = engine.process(WELL_FORMED, None).await.unwrap().record;
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn concurrent_batch_keeps_input_order() {
    let source = FixtureSource::new();
    let engine = engine(source.clone());
    let input = urls(&[ESPACENET, MISSING, WELL_FORMED, "https://example.com/x", USPTO, FALLBACK]);

    let batch = engine
        .run_batch(
            &input,
            &BatchOptions {
                concurrency: 4,
                deadline: None,
            },
        )
        .await;

    let order: Vec<&str> = batch.outcomes.iter().map(|o| o.url()).collect();
    assert_eq!(order, input.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(batch.succeeded, 4);
    assert_eq!(batch.outcomes[3].error_kind(), Some(ErrorKind::Unsupported));
    // unsupported URLs never reach the source
    assert_eq!(source.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn expired_deadline_fails_remaining_urls_with_timeout() {
    let engine = engine(FixtureSource::new());
    let batch = engine
        .run_batch(
            &urls(&[WELL_FORMED, FALLBACK]),
            &BatchOptions {
                concurrency: 1,
                deadline: Some(std::time::Instant::now()),
            },
        )
        .await;

    assert_eq!(batch.failed, 2);
    assert!(batch
        .outcomes
        .iter()
        .all(|o| o.error_kind() == Some(ErrorKind::Timeout)));
}
