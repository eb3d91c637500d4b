//! CLI for the vdm media download manager.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use vdm_core::config;
use vdm_core::fetcher::YtDlpFetcher;
use vdm_core::job::DownloadMode;
use vdm_core::orchestrator::Orchestrator;
use vdm_core::registry::JobRegistry;

use commands::{run_download, run_metadata};

/// Top-level CLI for the vdm media download manager.
#[derive(Debug, Parser)]
#[command(name = "vdm")]
#[command(about = "vdm: background media download manager built on yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a single video; Ctrl-C cancels the job.
    Download {
        /// Video page URL.
        url: String,
        /// Destination directory (default: config download_dir, else cwd).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Download a whole playlist as one job.
    Playlist {
        /// Playlist URL.
        url: String,
        /// Destination directory (default: config download_dir, else cwd).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Print media metadata as JSON without downloading.
    Metadata {
        /// Video or playlist URL.
        url: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let registry = Arc::new(JobRegistry::new());
        let fetcher = Arc::new(YtDlpFetcher::from_config(&cfg));
        let orchestrator = Orchestrator::new(registry, fetcher);

        match cli.command {
            CliCommand::Download { url, dir } => {
                run_download(&orchestrator, &cfg, &url, dir, DownloadMode::Single).await?;
            }
            CliCommand::Playlist { url, dir } => {
                run_download(&orchestrator, &cfg, &url, dir, DownloadMode::Collection).await?;
            }
            CliCommand::Metadata { url } => run_metadata(&orchestrator, &url).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
