use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use patscrape::search::{LinkCollector, SearchQuery};

/// Collect search links into `output`. Returns `false` if nothing was found.
pub async fn cmd_links(keyword: &str, start_year: i32, end_year: i32, output: &Path) -> Result<bool> {
    let query = SearchQuery::new(keyword, start_year, end_year)?;
    let collector = LinkCollector::new()?;

    println!("🔍 Searching Google Patents for \"{keyword}\" ({start_year}-{end_year})");
    let links = collector.collect(&query).await;
    if links.is_empty() {
        eprintln!("No patents found");
        return Ok(false);
    }

    let mut body = String::new();
    for link in &links {
        writeln!(body, "{link}")?;
    }
    std::fs::write(output, body).with_context(|| format!("failed to write {}", output.display()))?;
    println!("💾 Saved {} links to {}", links.len(), output.display());
    Ok(true)
}
