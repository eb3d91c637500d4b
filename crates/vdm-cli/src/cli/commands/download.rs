//! `vdm download <url>` / `vdm playlist <url>` – submit a job and follow it.
//!
//! Submits through the orchestrator, then polls the registry and renders a
//! progress line until the job reaches a terminal state. Ctrl-C requests
//! cancellation and keeps waiting for the job to wind down.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use vdm_core::config::VdmConfig;
use vdm_core::job::{DownloadMode, JobSnapshot, JobState};
use vdm_core::orchestrator::Orchestrator;
use vdm_core::registry::CancelOutcome;

pub async fn run_download(
    orch: &Orchestrator,
    cfg: &VdmConfig,
    url: &str,
    dir: Option<PathBuf>,
    mode: DownloadMode,
) -> Result<()> {
    let dir = match dir.or_else(|| cfg.download_dir.clone()) {
        Some(d) => d,
        None => std::env::current_dir()?,
    };

    let id = match mode {
        DownloadMode::Single => orch.submit_single(url, &dir)?,
        DownloadMode::Collection => orch.submit_collection(url, &dir)?,
    };
    println!("Submitted job {id}");

    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                match orch.request_cancel(&id) {
                    CancelOutcome::Accepted => {
                        println!("\nCancellation requested, waiting for the job to stop...");
                    }
                    CancelOutcome::AlreadyTerminal => {}
                    CancelOutcome::NotFound => anyhow::bail!("job {id} not found"),
                }
            }
            _ = ticker.tick() => {
                let Some(snap) = orch.get_status(&id) else {
                    anyhow::bail!("job {id} disappeared from registry");
                };
                render_progress(&snap);
                if snap.state.is_terminal() {
                    println!();
                    return finish(&snap);
                }
            }
        }
    }
}

fn render_progress(snap: &JobSnapshot) {
    let total = snap
        .progress
        .bytes_total
        .map(|t| format!("{t}"))
        .unwrap_or_else(|| "?".to_string());
    print!(
        "\r{:<12} {:>6.2}%  {} / {} bytes",
        snap.state.as_str(),
        snap.progress.percent,
        snap.progress.bytes_downloaded,
        total
    );
    let _ = std::io::stdout().flush();
}

fn finish(snap: &JobSnapshot) -> Result<()> {
    match snap.state {
        JobState::Completed => {
            if let Some(ref loc) = snap.output_location {
                println!("Completed: {}", loc.display());
            } else {
                println!("Completed.");
            }
            Ok(())
        }
        JobState::Cancelled => {
            println!("Cancelled.");
            Ok(())
        }
        JobState::Error => {
            let msg = snap.error_message.as_deref().unwrap_or("unknown error");
            anyhow::bail!("download failed: {msg}");
        }
        JobState::Pending | JobState::Downloading => unreachable!("terminal state expected"),
    }
}
