pub mod diagnose;
pub mod extract;
pub mod links;
pub mod output;

use std::path::PathBuf;

use clap::Args;

use patscrape::Config;

/// Flags shared by `fetch` and `batch`; each overrides the config file.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Per-attempt timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Start with headless Chrome instead of plain HTTP
    #[arg(long)]
    pub rendered: bool,

    /// Directory for <slug>.json records
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,
}

impl RunArgs {
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(secs) = self.timeout {
            config.fetch.timeout_secs = secs;
        }
        if self.rendered {
            config.fetch.force_rendered = true;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        config
    }
}
