//! Job orchestration: submit → background execution unit → terminal state.
//!
//! One tokio task per in-flight job. The blocking fetch collaborator runs in
//! `spawn_blocking` so long network-bound work never stalls status or cancel
//! calls, which only touch the registry. Every execution unit funnels its
//! outcome through exactly one terminal `set_state`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use url::Url;

use crate::fetcher::{self, FetchError, FetchSpec, MediaFetcher, ProgressSample};
use crate::job::{DownloadMode, DownloadRequest, JobId, JobSnapshot, JobState, Progress};
use crate::progress;
use crate::registry::{CancelOutcome, JobRegistry};

/// Error message stored on jobs that ended because the user cancelled.
const CANCELLED_MESSAGE: &str = "cancelled by user";

/// Cap for stored error messages (single line, truncated).
const MAX_ERROR_LEN: usize = 300;

/// Request rejected synchronously at submit time; no job is created.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("output directory must not be empty")]
    EmptyOutputDir,
}

/// Creates jobs, launches their execution units, and exposes the
/// status/cancel/list surface. Must be used from within a tokio runtime.
pub struct Orchestrator {
    registry: Arc<JobRegistry>,
    fetcher: Arc<dyn MediaFetcher>,
}

impl Orchestrator {
    pub fn new(registry: Arc<JobRegistry>, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self { registry, fetcher }
    }

    /// Submits a single-item download. Returns as soon as the job is
    /// registered and its execution unit is spawned.
    pub fn submit_single(&self, url: &str, output_dir: &Path) -> Result<JobId, SubmitError> {
        self.submit(url, output_dir, DownloadMode::Single)
    }

    /// Submits a collection (playlist) download as one aggregate job.
    pub fn submit_collection(&self, url: &str, output_dir: &Path) -> Result<JobId, SubmitError> {
        self.submit(url, output_dir, DownloadMode::Collection)
    }

    fn submit(
        &self,
        url: &str,
        output_dir: &Path,
        mode: DownloadMode,
    ) -> Result<JobId, SubmitError> {
        validate_url(url)?;
        if output_dir.as_os_str().is_empty() {
            return Err(SubmitError::EmptyOutputDir);
        }

        let request = DownloadRequest {
            url: url.to_string(),
            output_dir: output_dir.to_path_buf(),
            mode,
        };
        let id = self.registry.create(request);
        tracing::info!(job_id = %id, url, "job submitted");

        let registry = Arc::clone(&self.registry);
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(run_job(registry, fetcher, id));
        Ok(id)
    }

    pub fn get_status(&self, id: &JobId) -> Option<JobSnapshot> {
        self.registry.get(id)
    }

    pub fn request_cancel(&self, id: &JobId) -> CancelOutcome {
        self.registry.request_cancel(id)
    }

    pub fn list_all(&self) -> Vec<JobSnapshot> {
        self.registry.list_all()
    }

    pub fn remove(&self, id: &JobId) -> bool {
        self.registry.remove(id)
    }

    /// Metadata query for a URL; runs outside the job lifecycle.
    pub async fn extract_metadata(&self, url: &str) -> Result<serde_json::Value> {
        let fetcher = Arc::clone(&self.fetcher);
        let url = url.to_string();
        let info = tokio::task::spawn_blocking(move || fetcher.extract_metadata(&url))
            .await
            .context("metadata task join")??;
        Ok(info)
    }
}

fn validate_url(url: &str) -> Result<(), SubmitError> {
    if url.trim().is_empty() {
        return Err(SubmitError::InvalidUrl("empty".to_string()));
    }
    let parsed = Url::parse(url).map_err(|e| SubmitError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SubmitError::UnsupportedScheme(other.to_string())),
    }
}

/// Execution unit for one job. Runs until it writes the job's terminal state.
async fn run_job(registry: Arc<JobRegistry>, fetcher: Arc<dyn MediaFetcher>, id: JobId) {
    let Some(job) = registry.get(&id) else {
        return;
    };
    let Some(cancel) = registry.cancel_token(&id) else {
        return;
    };

    if let Err(e) = tokio::fs::create_dir_all(&job.output_dir).await {
        registry.set_state(
            &id,
            JobState::Error,
            Some(one_line(&format!(
                "create output directory {}: {}",
                job.output_dir.display(),
                e
            ))),
        );
        return;
    }

    registry.set_state(&id, JobState::Downloading, None);

    let spec = FetchSpec {
        url: job.url.clone(),
        output_template: fetcher::output_template(&job.output_dir, job.mode),
        mode: job.mode,
    };

    let result = {
        let registry = Arc::clone(&registry);
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            // Progress callback: normalize and store. Infallible, so a bad
            // sample can never abort the fetch underneath it.
            let mut last = Progress::default();
            let mut on_progress = |sample: ProgressSample| {
                last = progress::apply_sample(last, &sample);
                registry.update_progress(&id, last);
            };
            fetcher.fetch(&spec, &mut on_progress, &cancel)
        })
        .await
    };

    // Exactly one terminal transition per job, classified here.
    match result {
        Ok(Ok(outcome)) => {
            // A cancel request that raced a finished download loses: the job
            // completed, and completed it stays.
            registry.set_output(&id, outcome.output_location.clone());
            registry.set_state(&id, JobState::Completed, None);
            tracing::info!(job_id = %id, output = %outcome.output_location.display(), "job completed");
        }
        Ok(Err(FetchError::Aborted)) => {
            registry.set_state(&id, JobState::Cancelled, Some(CANCELLED_MESSAGE.to_string()));
            tracing::info!(job_id = %id, "job cancelled");
        }
        Ok(Err(FetchError::Failed(msg))) => {
            // Tie-break: a failure while cancellation was pending reads as
            // cancelled, so callers see the state they asked for.
            if cancel.is_cancelled() {
                registry.set_state(&id, JobState::Cancelled, Some(CANCELLED_MESSAGE.to_string()));
                tracing::info!(job_id = %id, error = %msg, "job cancelled (failure during pending cancel)");
            } else {
                registry.set_state(&id, JobState::Error, Some(one_line(&msg)));
                tracing::warn!(job_id = %id, error = %msg, "job failed");
            }
        }
        Err(join_err) => {
            registry.set_state(
                &id,
                JobState::Error,
                Some(one_line(&format!("fetch task failed: {}", join_err))),
            );
            tracing::error!(job_id = %id, error = %join_err, "fetch task panicked or was aborted");
        }
    }
}

/// First line of `msg`, trimmed and capped, never empty.
fn one_line(msg: &str) -> String {
    let line = msg.lines().next().unwrap_or("").trim();
    let truncated: String = line.chars().take(MAX_ERROR_LEN).collect();
    if truncated.is_empty() {
        "unknown error".to_string()
    } else {
        truncated
    }
}
