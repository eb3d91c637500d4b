//! Progress normalization: raw fetch samples → percent/byte snapshot.
//!
//! Pure; never fails. Malformed samples leave the last-known-good snapshot in
//! place, and percent is clamped non-decreasing for the life of the job.

use crate::fetcher::{ProgressSample, SampleStatus};
use crate::job::Progress;

/// Folds one raw sample into the previous snapshot.
pub fn apply_sample(last: Progress, sample: &ProgressSample) -> Progress {
    match sample.status {
        SampleStatus::Finished => Progress {
            percent: 100.0,
            bytes_downloaded: sample.bytes_downloaded.max(last.bytes_downloaded),
            bytes_total: sample.bytes_total.or(last.bytes_total),
        },
        SampleStatus::Downloading => {
            let total = match sample.bytes_total.filter(|t| *t > 0) {
                Some(t) => t,
                // No usable total: keep the percent we had, track bytes.
                None => {
                    return Progress {
                        bytes_downloaded: sample.bytes_downloaded.max(last.bytes_downloaded),
                        ..last
                    };
                }
            };
            if sample.bytes_downloaded > total {
                // Inconsistent sample; ignore it entirely.
                return last;
            }
            let percent = round2(sample.bytes_downloaded as f64 / total as f64 * 100.0);
            Progress {
                percent: percent.max(last.percent),
                bytes_downloaded: sample.bytes_downloaded.max(last.bytes_downloaded),
                bytes_total: Some(total),
            }
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloading(done: u64, total: Option<u64>) -> ProgressSample {
        ProgressSample {
            status: SampleStatus::Downloading,
            bytes_downloaded: done,
            bytes_total: total,
        }
    }

    #[test]
    fn percent_is_rounded_to_two_decimals() {
        let p = apply_sample(Progress::default(), &downloading(1, Some(3)));
        assert_eq!(p.percent, 33.33);
        assert_eq!(p.bytes_downloaded, 1);
        assert_eq!(p.bytes_total, Some(3));
    }

    #[test]
    fn finished_forces_one_hundred() {
        let mid = apply_sample(Progress::default(), &downloading(10, Some(100)));
        let done = apply_sample(
            mid,
            &ProgressSample {
                status: SampleStatus::Finished,
                bytes_downloaded: 0,
                bytes_total: None,
            },
        );
        assert_eq!(done.percent, 100.0);
        // Byte counts from earlier samples survive the terminal sample.
        assert_eq!(done.bytes_downloaded, 10);
        assert_eq!(done.bytes_total, Some(100));
    }

    #[test]
    fn missing_total_keeps_last_percent() {
        let mid = apply_sample(Progress::default(), &downloading(50, Some(100)));
        let next = apply_sample(mid, &downloading(60, None));
        assert_eq!(next.percent, 50.0);
        assert_eq!(next.bytes_downloaded, 60);
        assert_eq!(next.bytes_total, Some(100));
    }

    #[test]
    fn percent_never_decreases() {
        let mid = apply_sample(Progress::default(), &downloading(70, Some(100)));
        // A shrunk sample (e.g. the collaborator restarted a fragment) must
        // not move percent backwards.
        let next = apply_sample(mid, &downloading(10, Some(100)));
        assert_eq!(next.percent, 70.0);
    }

    #[test]
    fn inconsistent_sample_is_ignored() {
        let mid = apply_sample(Progress::default(), &downloading(30, Some(100)));
        let next = apply_sample(mid, &downloading(500, Some(100)));
        assert_eq!(next, mid);
    }

    #[test]
    fn zero_total_is_treated_as_unknown() {
        let p = apply_sample(Progress::default(), &downloading(10, Some(0)));
        assert_eq!(p.percent, 0.0);
        assert_eq!(p.bytes_downloaded, 10);
    }
}
