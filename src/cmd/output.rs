use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use patscrape::{BatchResult, PatentRecord, UrlOutcome};

/// `<dir>/<slug>.json`, or `<slug>_2.json`, `<slug>_3.json`, … when taken.
pub fn unique_path(dir: &Path, slug: &str) -> PathBuf {
    let first = dir.join(format!("{slug}.json"));
    if !first.exists() {
        return first;
    }
    (2u32..)
        .map(|n| dir.join(format!("{slug}_{n}.json")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

pub fn write_record(path: &Path, record: &PatentRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(record)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Write every successful record; returns `(url, path)` per file written.
pub fn write_batch(
    dir: &Path,
    batch: &BatchResult,
    explicit: Option<&Path>,
) -> Result<Vec<(String, PathBuf)>> {
    let mut written = Vec::new();
    for outcome in &batch.outcomes {
        let UrlOutcome::Success { url, record, .. } = outcome else {
            continue;
        };
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => unique_path(dir, &record.slug),
        };
        write_record(&path, record)?;
        written.push((url.clone(), path));
    }
    Ok(written)
}

pub fn print_summary(batch: &BatchResult, written: &[(String, PathBuf)]) {
    for outcome in &batch.outcomes {
        match outcome {
            UrlOutcome::Success { url, diagnostics, .. } => {
                let path = written
                    .iter()
                    .find(|(u, _)| u == url)
                    .map(|(_, p)| p.display().to_string())
                    .unwrap_or_default();
                let fallbacks = diagnostics.fallbacks().count();
                println!("✅ {url} -> {path} ({}, {fallbacks} fallback fields)", diagnostics.method);
            }
            UrlOutcome::Failure { url, kind, message } => {
                println!("❌ {url} [{kind}] {message}");
            }
        }
    }
    println!(
        "\nAttempted: {}  Succeeded: {}  Failed: {}",
        batch.attempted, batch.succeeded, batch.failed
    );
}
