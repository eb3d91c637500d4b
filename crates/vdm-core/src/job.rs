//! Job model: identity, lifecycle state, request, and snapshot types.

use std::path::PathBuf;

use uuid::Uuid;

/// Job identifier. Generated once at creation, never reused.
pub type JobId = Uuid;

/// Lifecycle state of a job.
///
/// Transitions are `Pending → Downloading → {Completed | Error | Cancelled}`.
/// The three terminal states admit no further transitions; the registry
/// enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Downloading,
    Completed,
    Error,
    Cancelled,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Downloading => "downloading",
            JobState::Completed => "completed",
            JobState::Error => "error",
            JobState::Cancelled => "cancelled",
        }
    }

    /// True for `Completed`, `Error`, and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Error | JobState::Cancelled
        )
    }
}

/// Whether a request targets one item or a whole collection (playlist).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    Single,
    Collection,
}

/// What the caller asked for: target URL, destination directory, and mode.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub mode: DownloadMode,
}

/// Normalized download progress for one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Percent complete in [0.0, 100.0], rounded to 2 decimal places.
    pub percent: f64,
    /// Bytes written so far.
    pub bytes_downloaded: u64,
    /// Total size in bytes, if the collaborator reported one.
    pub bytes_total: Option<u64>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            percent: 0.0,
            bytes_downloaded: 0,
            bytes_total: None,
        }
    }
}

/// Immutable point-in-time copy of one job, as returned to callers.
/// Never aliases the registry's internal record.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: JobId,
    pub url: String,
    pub output_dir: PathBuf,
    pub mode: DownloadMode,
    pub state: JobState,
    pub progress: Progress,
    /// Set only when the job ended in `Error` or `Cancelled`.
    pub error_message: Option<String>,
    /// Resolved output path/template, set on completion.
    pub output_location: Option<PathBuf>,
    /// Monotonic false→true; a cancel request on a live job sets this.
    pub cancel_requested: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Downloading.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Error.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
    }

    #[test]
    fn state_names() {
        assert_eq!(JobState::Pending.as_str(), "pending");
        assert_eq!(JobState::Downloading.as_str(), "downloading");
        assert_eq!(JobState::Completed.as_str(), "completed");
        assert_eq!(JobState::Error.as_str(), "error");
        assert_eq!(JobState::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn default_progress_is_zero() {
        let p = Progress::default();
        assert_eq!(p.percent, 0.0);
        assert_eq!(p.bytes_downloaded, 0);
        assert!(p.bytes_total.is_none());
    }
}
