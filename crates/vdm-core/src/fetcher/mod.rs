//! Media-fetch collaborator contract.
//!
//! The orchestration core does not download anything itself; it hands a
//! `FetchSpec` to a `MediaFetcher`, receives raw progress samples through a
//! callback, and passes a cancel token the fetcher must poll at each progress
//! boundary. `fetch` is a blocking call and is always invoked from
//! `spawn_blocking`.

mod ytdlp;

pub use ytdlp::{output_template, YtDlpFetcher};

use std::path::PathBuf;

use crate::control::CancelToken;
use crate::job::DownloadMode;

/// Phase reported with a raw progress sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    Downloading,
    /// Terminal sample; the tracker forces percent to 100.0 on this.
    Finished,
}

/// Raw progress sample as emitted by the fetch collaborator.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSample {
    pub status: SampleStatus,
    pub bytes_downloaded: u64,
    pub bytes_total: Option<u64>,
}

/// Fetch failure, with abort kept distinct from genuine failure so the
/// cancelled-vs-error tie-break stays reproducible.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("fetch aborted: cancellation requested")]
    Aborted,
    #[error("{0}")]
    Failed(String),
}

/// Everything the fetcher needs for one job.
#[derive(Debug, Clone)]
pub struct FetchSpec {
    pub url: String,
    /// Output path template (may contain fetcher-specific placeholders).
    pub output_template: PathBuf,
    pub mode: DownloadMode,
}

/// Successful fetch result.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Where the output landed (resolved path, or the template for
    /// collection jobs that wrote multiple files).
    pub output_location: PathBuf,
}

/// External media retrieval engine (url → bytes on disk).
///
/// Implementations must invoke `on_progress` zero or more times, check
/// `cancel` at least at every progress emission, and return
/// `FetchError::Aborted` (not `Failed`) when they stop because the token was
/// set.
pub trait MediaFetcher: Send + Sync {
    fn fetch(
        &self,
        spec: &FetchSpec,
        on_progress: &mut dyn FnMut(ProgressSample),
        cancel: &CancelToken,
    ) -> Result<FetchOutcome, FetchError>;

    /// Side-effect-free metadata query for a URL, outside the job lifecycle.
    fn extract_metadata(&self, url: &str) -> Result<serde_json::Value, FetchError>;
}
