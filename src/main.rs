//! `patscrape` CLI - Extract structured records from patent pages

mod cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use patscrape::Config;

use cmd::RunArgs;

#[derive(Parser)]
#[command(name = "patscrape")]
#[command(about = "Resilient patent page extractor for Google Patents, USPTO and Espacenet")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ~/.config/patscrape/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one patent page into <slug>.json
    Fetch {
        /// Patent page URL
        url: String,

        /// Write the record to this path instead of <output-dir>/<slug>.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Extract every URL in a newline-delimited links file
    Batch {
        /// File with one URL per line
        links_file: PathBuf,

        /// URLs processed concurrently
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Stop starting new fetches after this many seconds
        #[arg(long)]
        deadline: Option<u64>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Collect Google Patents links for a keyword and filing-year range
    Links {
        /// Search keyword
        keyword: String,

        /// First year (inclusive)
        start_year: i32,

        /// Last year (inclusive)
        end_year: i32,

        /// Output file, one URL per line
        #[arg(short, long, default_value = "patents_links.txt")]
        output: PathBuf,
    },

    /// Report whether rendered retrieval is available
    Diagnose {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Config::load().context("failed to load default config"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let all_ok = match cli.command {
        Commands::Fetch { url, output, run } => {
            let config = run.apply(load_config(cli.config.as_ref())?);
            cmd::extract::cmd_fetch(&config, &url, output).await?
        }
        Commands::Batch {
            links_file,
            concurrency,
            deadline,
            run,
        } => {
            let mut config = run.apply(load_config(cli.config.as_ref())?);
            if let Some(n) = concurrency {
                config.batch.concurrency = n;
            }
            cmd::extract::cmd_batch(&config, &links_file, deadline).await?
        }
        Commands::Links {
            keyword,
            start_year,
            end_year,
            output,
        } => cmd::links::cmd_links(&keyword, start_year, end_year, &output).await?,
        Commands::Diagnose { json } => cmd::diagnose::cmd_diagnose(json)?,
    };

    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}
