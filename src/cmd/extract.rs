use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use patscrape::batch::read_url_list;
use patscrape::{BatchOptions, Config, Engine};

use super::output::{print_summary, write_batch};

/// Extract one URL. Returns `false` if it failed.
pub async fn cmd_fetch(config: &Config, url: &str, output: Option<PathBuf>) -> Result<bool> {
    let engine = Engine::from_config(config).context("failed to initialize extraction engine")?;
    let batch = engine
        .run_batch(&[url.to_string()], &BatchOptions::default())
        .await;

    let written = write_batch(&config.output_dir, &batch, output.as_deref())?;
    print_summary(&batch, &written);
    Ok(batch.failed == 0)
}

/// Extract every URL in `links_file`. Returns `false` if any URL failed.
pub async fn cmd_batch(config: &Config, links_file: &Path, deadline_secs: Option<u64>) -> Result<bool> {
    let text = std::fs::read_to_string(links_file)
        .with_context(|| format!("failed to read {}", links_file.display()))?;
    let urls = read_url_list(&text);
    if urls.is_empty() {
        bail!("no URLs in {}", links_file.display());
    }

    let engine = Engine::from_config(config).context("failed to initialize extraction engine")?;
    let options = BatchOptions {
        concurrency: config.batch.concurrency,
        deadline: deadline_secs.map(|s| Instant::now() + Duration::from_secs(s)),
    };
    println!("📄 {} URLs from {}", urls.len(), links_file.display());

    let batch = engine.run_batch(&urls, &options).await;
    let written = write_batch(&config.output_dir, &batch, None)?;
    print_summary(&batch, &written);
    Ok(batch.failed == 0)
}
