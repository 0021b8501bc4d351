//! Integration tests for basic CLI behavior.
//!
//! Nothing here touches the network: every command either fails validation
//! or resolves URLs to unsupported platforms before fetching.

#![allow(deprecated)] // Command::cargo_bin is deprecated upstream

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: get a Command for the `patscrape` binary.
fn patscrape() -> Command {
    Command::cargo_bin("patscrape").expect("binary 'patscrape' should be built")
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    patscrape()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: patscrape"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("links"))
        .stdout(predicate::str::contains("diagnose"));
}

#[test]
fn version_flag_shows_semver() {
    patscrape()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^patscrape \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn no_args_shows_error_and_usage() {
    patscrape()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: patscrape"));
}

#[test]
fn invalid_subcommand_fails() {
    patscrape()
        .arg("scrape-everything")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ─── Subcommand help ─────────────────────────────────────────────────────────

#[test]
fn fetch_help_lists_run_flags() {
    patscrape()
        .args(["fetch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--rendered"))
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--output"));
}

#[test]
fn batch_help_lists_concurrency() {
    patscrape()
        .args(["batch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--concurrency"))
        .stdout(predicate::str::contains("--deadline"));
}

// ─── Behavior without network ────────────────────────────────────────────────

#[test]
fn unsupported_url_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    patscrape()
        .args(["fetch", "https://example.com/patent/US1", "--output-dir"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[Unsupported]"))
        .stdout(predicate::str::contains("Attempted: 1  Succeeded: 0  Failed: 1"));
}

#[test]
fn batch_reports_every_url() {
    let dir = tempfile::tempdir().unwrap();
    let links = dir.path().join("links.txt");
    std::fs::write(
        &links,
        "https://example.com/a\n\nnot a url\nhttps://example.org/b\n",
    )
    .unwrap();

    patscrape()
        .arg("batch")
        .arg(&links)
        .arg("--output-dir")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("3 URLs"))
        .stdout(predicate::str::contains("not a url [Unsupported]"))
        .stdout(predicate::str::contains("Attempted: 3  Succeeded: 0  Failed: 3"));
}

#[test]
fn batch_without_urls_fails() {
    let dir = tempfile::tempdir().unwrap();
    let links = dir.path().join("empty.txt");
    std::fs::write(&links, "\n# nothing here\n").unwrap();

    patscrape()
        .arg("batch")
        .arg(&links)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no URLs in"));
}

#[test]
fn links_rejects_inverted_year_range() {
    patscrape()
        .args(["links", "glucose", "2020", "2010"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("start year 2020 is after end year 2010"));
}

#[test]
fn links_rejects_non_numeric_year() {
    patscrape()
        .args(["links", "glucose", "twenty", "2010"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn diagnose_reports_render_support() {
    patscrape()
        .arg("diagnose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rendered retrieval compiled in"));
}

#[test]
fn diagnose_json_is_parseable() {
    let output = patscrape().args(["diagnose", "--json"]).output().unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report["compiled"].is_boolean());
}

#[test]
fn malformed_config_aborts_before_processing() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[batch]\nconcurrency = 0\n").unwrap();

    patscrape()
        .args(["--config"])
        .arg(&config)
        .args(["fetch", "https://patents.google.com/patent/US1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency must be at least 1"));
}
