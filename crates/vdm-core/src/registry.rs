//! Concurrency-safe job registry: the single source of truth for job state.
//!
//! One canonical record per job id behind a `RwLock`-protected map. Execution
//! units and callers mutate records only through these accessors; readers get
//! point-in-time snapshots, never references into the map. All mutators are
//! atomic per record, and no mutator can move a job out of a terminal state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use uuid::Uuid;

use crate::control::CancelToken;
use crate::job::{DownloadRequest, JobId, JobSnapshot, JobState, Progress};

/// Result of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Flag set; the job will observe it at its next progress boundary.
    Accepted,
    /// Job already finished; nothing to do.
    AlreadyTerminal,
    /// No such job id.
    NotFound,
}

struct JobRecord {
    request: DownloadRequest,
    state: JobState,
    progress: Progress,
    error_message: Option<String>,
    output_location: Option<PathBuf>,
    cancel: CancelToken,
}

impl JobRecord {
    fn snapshot(&self, id: JobId) -> JobSnapshot {
        JobSnapshot {
            id,
            url: self.request.url.clone(),
            output_dir: self.request.output_dir.clone(),
            mode: self.request.mode,
            state: self.state,
            progress: self.progress,
            error_message: self.error_message.clone(),
            output_location: self.output_location.clone(),
            cancel_requested: self.cancel.is_cancelled(),
        }
    }
}

/// In-memory store of all known jobs, keyed by id.
///
/// Constructed explicitly (typically once per process) and shared by
/// reference; there is no global instance. Jobs are never removed
/// automatically — see [`JobRegistry::remove`].
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh id and inserts the job in `Pending` state.
    pub fn create(&self, request: DownloadRequest) -> JobId {
        let mut jobs = self.jobs.write().unwrap();
        let mut id = Uuid::new_v4();
        while jobs.contains_key(&id) {
            id = Uuid::new_v4();
        }
        jobs.insert(
            id,
            JobRecord {
                request,
                state: JobState::Pending,
                progress: Progress::default(),
                error_message: None,
                output_location: None,
                cancel: CancelToken::new(),
            },
        );
        id
    }

    /// Point-in-time copy of one job, or None if the id is unknown.
    pub fn get(&self, id: &JobId) -> Option<JobSnapshot> {
        self.jobs.read().unwrap().get(id).map(|r| r.snapshot(*id))
    }

    /// Snapshots of all known jobs. Order is not significant.
    pub fn list_all(&self) -> Vec<JobSnapshot> {
        self.jobs
            .read()
            .unwrap()
            .iter()
            .map(|(id, r)| r.snapshot(*id))
            .collect()
    }

    /// The cancel token shared with the job's execution unit.
    pub fn cancel_token(&self, id: &JobId) -> Option<CancelToken> {
        self.jobs.read().unwrap().get(id).map(|r| r.cancel.clone())
    }

    /// Stores a progress snapshot. No-op on unknown ids and on jobs that
    /// already reached a terminal state.
    pub fn update_progress(&self, id: &JobId, progress: Progress) {
        if let Some(record) = self.jobs.write().unwrap().get_mut(id) {
            if !record.state.is_terminal() {
                record.progress = progress;
            }
        }
    }

    /// Transitions a job to `state`, recording `error` for terminal
    /// error/cancelled states. Returns false (and changes nothing) if the id
    /// is unknown or the job is already terminal.
    pub fn set_state(&self, id: &JobId, state: JobState, error: Option<String>) -> bool {
        let mut jobs = self.jobs.write().unwrap();
        let Some(record) = jobs.get_mut(id) else {
            return false;
        };
        if record.state.is_terminal() {
            tracing::debug!(job_id = %id, from = record.state.as_str(), to = state.as_str(),
                "ignoring transition out of terminal state");
            return false;
        }
        record.state = state;
        record.error_message = error;
        true
    }

    /// Records the resolved output location (called before completion).
    pub fn set_output(&self, id: &JobId, location: PathBuf) {
        if let Some(record) = self.jobs.write().unwrap().get_mut(id) {
            if !record.state.is_terminal() {
                record.output_location = Some(location);
            }
        }
    }

    /// Sets the job's cancel flag. Idempotent; a second call on a live job is
    /// still `Accepted`.
    pub fn request_cancel(&self, id: &JobId) -> CancelOutcome {
        let jobs = self.jobs.read().unwrap();
        let Some(record) = jobs.get(id) else {
            return CancelOutcome::NotFound;
        };
        if record.state.is_terminal() {
            return CancelOutcome::AlreadyTerminal;
        }
        record.cancel.request();
        tracing::info!(job_id = %id, "cancellation requested");
        CancelOutcome::Accepted
    }

    /// Removes a job record. Manual only; the registry never prunes.
    pub fn remove(&self, id: &JobId) -> bool {
        self.jobs.write().unwrap().remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::DownloadMode;
    use std::path::Path;

    fn request() -> DownloadRequest {
        DownloadRequest {
            url: "https://example.com/watch?v=abc".to_string(),
            output_dir: Path::new("/tmp/out").to_path_buf(),
            mode: DownloadMode::Single,
        }
    }

    #[test]
    fn create_inserts_pending_job() {
        let reg = JobRegistry::new();
        let id = reg.create(request());
        let snap = reg.get(&id).unwrap();
        assert_eq!(snap.state, JobState::Pending);
        assert_eq!(snap.progress, Progress::default());
        assert!(!snap.cancel_requested);
        assert!(snap.error_message.is_none());
    }

    #[test]
    fn ids_are_unique() {
        let reg = JobRegistry::new();
        let a = reg.create(request());
        let b = reg.create(request());
        assert_ne!(a, b);
        assert_eq!(reg.list_all().len(), 2);
    }

    #[test]
    fn get_unknown_id_is_none() {
        let reg = JobRegistry::new();
        assert!(reg.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn terminal_state_is_sticky() {
        let reg = JobRegistry::new();
        let id = reg.create(request());
        assert!(reg.set_state(&id, JobState::Downloading, None));
        assert!(reg.set_state(&id, JobState::Completed, None));
        // Any further transition is refused.
        assert!(!reg.set_state(&id, JobState::Error, Some("late".into())));
        assert_eq!(reg.get(&id).unwrap().state, JobState::Completed);
        assert!(reg.get(&id).unwrap().error_message.is_none());
    }

    #[test]
    fn progress_updates_stop_after_terminal() {
        let reg = JobRegistry::new();
        let id = reg.create(request());
        reg.set_state(&id, JobState::Downloading, None);
        reg.update_progress(
            &id,
            Progress {
                percent: 40.0,
                bytes_downloaded: 40,
                bytes_total: Some(100),
            },
        );
        reg.set_state(&id, JobState::Cancelled, Some("cancelled by user".into()));
        reg.update_progress(
            &id,
            Progress {
                percent: 99.0,
                bytes_downloaded: 99,
                bytes_total: Some(100),
            },
        );
        assert_eq!(reg.get(&id).unwrap().progress.percent, 40.0);
    }

    #[test]
    fn cancel_semantics() {
        let reg = JobRegistry::new();
        let id = reg.create(request());
        assert_eq!(reg.request_cancel(&id), CancelOutcome::Accepted);
        // Idempotent while the job is live.
        assert_eq!(reg.request_cancel(&id), CancelOutcome::Accepted);
        assert!(reg.get(&id).unwrap().cancel_requested);
        assert!(reg.cancel_token(&id).unwrap().is_cancelled());

        reg.set_state(&id, JobState::Cancelled, Some("cancelled by user".into()));
        assert_eq!(reg.request_cancel(&id), CancelOutcome::AlreadyTerminal);
        assert_eq!(
            reg.request_cancel(&Uuid::new_v4()),
            CancelOutcome::NotFound
        );
    }

    #[test]
    fn remove_is_manual_only() {
        let reg = JobRegistry::new();
        let id = reg.create(request());
        reg.set_state(&id, JobState::Downloading, None);
        reg.set_state(&id, JobState::Completed, None);
        // Finishing never removes the record.
        assert!(reg.get(&id).is_some());
        assert!(reg.remove(&id));
        assert!(!reg.remove(&id));
        assert!(reg.get(&id).is_none());
    }

    #[test]
    fn snapshots_do_not_alias_registry_state() {
        let reg = JobRegistry::new();
        let id = reg.create(request());
        let before = reg.get(&id).unwrap();
        reg.set_state(&id, JobState::Downloading, None);
        assert_eq!(before.state, JobState::Pending);
    }
}
