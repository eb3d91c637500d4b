//! `MediaFetcher` backed by the yt-dlp binary.
//!
//! Spawns yt-dlp with `--newline` and a machine-readable progress template,
//! parses byte counts off stdout line by line, and checks the cancel token
//! between lines. On cancellation the child process is killed (best-effort
//! secondary mechanism; the token itself is the guaranteed path).

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::VdmConfig;
use crate::control::CancelToken;
use crate::job::DownloadMode;

use super::{FetchError, FetchOutcome, FetchSpec, MediaFetcher, ProgressSample, SampleStatus};

/// Progress lines come out as `dl <downloaded> <total> <estimate>`, with `NA`
/// for fields yt-dlp does not know yet.
const PROGRESS_TEMPLATE: &str =
    "download:dl %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s";

/// Fetcher that shells out to a yt-dlp binary.
pub struct YtDlpFetcher {
    binary: PathBuf,
    extra_args: Vec<String>,
}

impl YtDlpFetcher {
    pub fn new(binary: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            extra_args,
        }
    }

    pub fn from_config(cfg: &VdmConfig) -> Self {
        Self::new(cfg.ytdlp_bin.clone(), cfg.ytdlp_args.clone())
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--no-warnings");
        cmd.args(&self.extra_args);
        cmd
    }
}

impl MediaFetcher for YtDlpFetcher {
    fn fetch(
        &self,
        spec: &FetchSpec,
        on_progress: &mut dyn FnMut(ProgressSample),
        cancel: &CancelToken,
    ) -> Result<FetchOutcome, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Aborted);
        }

        let mut cmd = self.base_command();
        cmd.arg("--newline")
            .arg("--progress-template")
            .arg(PROGRESS_TEMPLATE)
            .arg(match spec.mode {
                DownloadMode::Single => "--no-playlist",
                DownloadMode::Collection => "--yes-playlist",
            })
            .arg("-o")
            .arg(&spec.output_template)
            .arg("--")
            .arg(&spec.url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            FetchError::Failed(format!("failed to spawn {}: {}", self.binary.display(), e))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::Failed("yt-dlp stdout not captured".to_string()))?;

        // Drain stderr on its own thread, keeping the last non-empty line for
        // the error message.
        let stderr_tail = child.stderr.take().map(|err| {
            std::thread::spawn(move || {
                let mut tail = String::new();
                for line in BufReader::new(err).lines().map_while(Result::ok) {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        tail = trimmed.to_string();
                    }
                }
                tail
            })
        });

        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };
            if let Some(sample) = parse_progress_line(&line) {
                on_progress(sample);
            }
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(FetchError::Aborted);
            }
        }

        let status = child
            .wait()
            .map_err(|e| FetchError::Failed(format!("wait for yt-dlp: {}", e)))?;
        let tail = stderr_tail
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if cancel.is_cancelled() {
            return Err(FetchError::Aborted);
        }
        if !status.success() {
            let msg = if tail.is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                tail
            };
            return Err(FetchError::Failed(msg));
        }

        on_progress(ProgressSample {
            status: SampleStatus::Finished,
            bytes_downloaded: 0,
            bytes_total: None,
        });
        Ok(FetchOutcome {
            output_location: spec.output_template.clone(),
        })
    }

    fn extract_metadata(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let output = self
            .base_command()
            .arg("-J")
            .arg("--skip-download")
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                FetchError::Failed(format!("failed to spawn {}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("yt-dlp metadata extraction failed");
            return Err(FetchError::Failed(tail.to_string()));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| FetchError::Failed(format!("unparseable yt-dlp metadata: {}", e)))
    }
}

/// Builds the output template yt-dlp receives for a job.
pub fn output_template(output_dir: &Path, mode: DownloadMode) -> PathBuf {
    match mode {
        DownloadMode::Single => output_dir.join("%(title)s - %(id)s.%(ext)s"),
        DownloadMode::Collection => output_dir
            .join("%(playlist)s")
            .join("%(playlist_index)s - %(title)s - %(id)s.%(ext)s"),
    }
}

/// Parses one `dl <downloaded> <total> <estimate>` progress line.
/// Returns None for anything else (yt-dlp info output, malformed fields).
fn parse_progress_line(line: &str) -> Option<ProgressSample> {
    let rest = line.trim().strip_prefix("dl ")?;
    let mut fields = rest.split_whitespace();
    let downloaded = parse_bytes(fields.next()?)?;
    let total = fields.next().and_then(parse_bytes);
    let estimate = fields.next().and_then(parse_bytes);
    Some(ProgressSample {
        status: SampleStatus::Downloading,
        bytes_downloaded: downloaded,
        bytes_total: total.or(estimate),
    })
}

/// yt-dlp renders unknown fields as "NA" and estimates as floats.
fn parse_bytes(field: &str) -> Option<u64> {
    if field == "NA" || field == "None" {
        return None;
    }
    if let Ok(n) = field.parse::<u64>() {
        return Some(n);
    }
    field.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_progress_line() {
        let s = parse_progress_line("dl 512 2048 NA").unwrap();
        assert_eq!(s.bytes_downloaded, 512);
        assert_eq!(s.bytes_total, Some(2048));
        assert_eq!(s.status, SampleStatus::Downloading);
    }

    #[test]
    fn falls_back_to_estimate_total() {
        let s = parse_progress_line("dl 100 NA 1536.7").unwrap();
        assert_eq!(s.bytes_downloaded, 100);
        assert_eq!(s.bytes_total, Some(1536));
    }

    #[test]
    fn unknown_total_is_none() {
        let s = parse_progress_line("dl 100 NA NA").unwrap();
        assert!(s.bytes_total.is_none());
    }

    #[test]
    fn ignores_non_progress_lines() {
        assert!(parse_progress_line("[youtube] abc: Downloading webpage").is_none());
        assert!(parse_progress_line("dl notanumber 5 5").is_none());
        assert!(parse_progress_line("").is_none());
    }

    #[test]
    fn single_and_collection_templates_differ() {
        let dir = Path::new("/tmp/media");
        let single = output_template(dir, DownloadMode::Single);
        let coll = output_template(dir, DownloadMode::Collection);
        assert!(single.to_string_lossy().contains("%(title)s"));
        assert!(coll.to_string_lossy().contains("%(playlist_index)s"));
        assert_ne!(single, coll);
    }
}
