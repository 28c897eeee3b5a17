//! Voice-sample chunking pipeline.
//!
//! Uploaded WAV samples that are too long or too large for downstream voice
//! training are cut into bounded-length chunks with an external media tool
//! (stream copy, no re-encode). The original file is kept under a backup name
//! so processing is non-destructive, and the backup name doubles as the record
//! that the file has already been handled.
//!
//! Naming convention inside the samples directory:
//! - `<base>.wav` - an unprocessed sample, candidate for splitting
//! - `<base>_chunk_<n>.wav` - chunk `n` (1-based) produced from `<base>.wav`
//! - `<base>_original.wav.bak` - the backed-up original after a split

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

pub mod media;
pub mod scanner;

pub use media::{FfmpegTool, MediaTool};

/// File extension of voice samples.
pub const SAMPLE_EXTENSION: &str = ".wav";
/// Marker embedded in chunk output names.
pub const CHUNK_MARKER: &str = "_chunk_";
/// Marker embedded in backed-up original names.
pub const BACKUP_MARKER: &str = "_original";

/// Errors that can occur while probing or splitting voice samples.
#[derive(Debug, Error)]
pub enum SplitError {
    /// I/O error while scanning, statting or renaming files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The external tool binary could not be started.
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran but exited unsuccessfully.
    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// The external tool exceeded the configured timeout and was killed.
    #[error("{tool} did not finish within {secs}s")]
    Timeout { tool: String, secs: u64 },

    /// The duration probe printed something that is not a number.
    #[error("unparseable duration from probe: {output:?}")]
    BadDuration { output: String },
}

/// Processing state of a sample file, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleState {
    /// A plain sample, candidate for splitting.
    Unprocessed,
    /// A chunk produced by a previous split.
    Chunked,
    /// An original that has already been split and renamed aside.
    BackedUp,
}

impl SampleState {
    /// Classify a file name by the chunk/backup naming convention.
    pub fn of(name: &str) -> Self {
        if name.contains(CHUNK_MARKER) {
            SampleState::Chunked
        } else if name.contains(BACKUP_MARKER) {
            SampleState::BackedUp
        } else {
            SampleState::Unprocessed
        }
    }
}

/// Thresholds deciding when and how a sample is split.
///
/// Both values are configuration inputs (`CHUNK_SECONDS`, `SIZE_THRESHOLD_MB`);
/// the defaults match the 30s/5MB production setup.
#[derive(Debug, Clone)]
pub struct SplitPolicy {
    /// Maximum length of one chunk, in seconds.
    pub chunk_seconds: f64,
    /// Samples larger than this are split even when short enough.
    pub size_threshold_mb: f64,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            chunk_seconds: 30.0,
            size_threshold_mb: 5.0,
        }
    }
}

impl SplitPolicy {
    /// Whether a sample with the given duration and size needs splitting.
    pub fn is_eligible(&self, duration_secs: f64, size_mb: f64) -> bool {
        duration_secs > self.chunk_seconds || size_mb > self.size_threshold_mb
    }

    /// Number of chunks needed to cover the given duration.
    pub fn chunk_count(&self, duration_secs: f64) -> u32 {
        (duration_secs / self.chunk_seconds).ceil() as u32
    }
}

/// One processed file in a split run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkJobResult {
    /// Name of the source sample that was split.
    pub file: String,
    /// Human-readable size of the original, e.g. "9.00MB".
    pub original_size: String,
    /// Human-readable duration of the original, e.g. "90.00 seconds".
    pub duration: String,
    /// Number of chunk files produced.
    pub chunks: u32,
    /// Path the original was renamed to.
    pub backup_path: String,
}

/// Aggregated result of one orchestrator run, returned to the HTTP caller.
///
/// `success: false` with a `message` is the normal empty-result signal when no
/// samples are present, not a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<Vec<ChunkJobResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SplitReport {
    fn no_samples() -> Self {
        Self {
            success: false,
            processed: None,
            message: Some("No voice samples found".to_string()),
        }
    }

    fn processed(results: Vec<ChunkJobResult>) -> Self {
        Self {
            success: true,
            processed: Some(results),
            message: None,
        }
    }
}

/// Sequences scanner, duration probe, chunk extraction and backup rename
/// across all eligible samples in the directory.
///
/// Files are processed one at a time and chunks are extracted in index order;
/// the external tool runs as a single blocking subprocess per chunk. A failed
/// probe or extraction skips that file only, leaving it in place so the next
/// run retries it.
pub struct SampleSplitter {
    dir: PathBuf,
    policy: SplitPolicy,
    tool: Arc<dyn MediaTool>,
}

impl SampleSplitter {
    pub fn new(dir: PathBuf, policy: SplitPolicy, tool: Arc<dyn MediaTool>) -> Self {
        Self { dir, policy, tool }
    }

    /// The samples directory this splitter operates on.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// List unprocessed sample names, creating the directory when absent.
    pub async fn list_unprocessed(&self) -> Result<Vec<String>, SplitError> {
        scanner::scan_samples(&self.dir).await
    }

    /// Run the full split pipeline once.
    ///
    /// Per-file failures are logged and skipped; only scan-level failures
    /// (an unreadable directory) abort the run.
    pub async fn run(&self) -> Result<SplitReport, SplitError> {
        info!("starting voice sample processing");

        let candidates = self.list_unprocessed().await?;
        if candidates.is_empty() {
            info!("no voice samples found to process");
            return Ok(SplitReport::no_samples());
        }
        info!(count = candidates.len(), "found voice samples to analyze");

        let mut results = Vec::new();
        for name in &candidates {
            match self.split_one(name).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => {
                    warn!(file = %name, error = %e, "skipping sample after failure");
                }
            }
        }

        info!(processed = results.len(), "voice sample processing finished");
        Ok(SplitReport::processed(results))
    }

    /// Probe one sample and, when it exceeds the policy thresholds, cut it
    /// into chunks and rename the original aside.
    ///
    /// Returns `Ok(None)` for samples that need no splitting.
    async fn split_one(&self, name: &str) -> Result<Option<ChunkJobResult>, SplitError> {
        let path = self.dir.join(name);

        let size_mb = fs::metadata(&path).await?.len() as f64 / (1024.0 * 1024.0);
        debug!(file = %name, size_mb, "analyzing sample");

        let duration = self.tool.probe_duration(&path).await?;
        debug!(file = %name, duration, "probed duration");

        if !self.policy.is_eligible(duration, size_mb) {
            debug!(file = %name, "no splitting needed");
            return Ok(None);
        }

        let base = name.strip_suffix(SAMPLE_EXTENSION).unwrap_or(name);
        let chunks = self.policy.chunk_count(duration);

        for i in 0..chunks {
            let start = f64::from(i) * self.policy.chunk_seconds;
            let chunk_name = format!("{base}{CHUNK_MARKER}{}{SAMPLE_EXTENSION}", i + 1);
            debug!(
                file = %name,
                chunk = i + 1,
                total = chunks,
                start,
                "extracting chunk"
            );
            self.tool
                .extract_segment(&path, start, self.policy.chunk_seconds, &self.dir.join(chunk_name))
                .await?;
        }

        // The backup name both preserves the original and drops it from
        // future scans.
        let backup = self
            .dir
            .join(format!("{base}{BACKUP_MARKER}{SAMPLE_EXTENSION}.bak"));
        fs::rename(&path, &backup).await?;
        info!(file = %name, chunks, backup = %backup.display(), "split sample and backed up original");

        Ok(Some(ChunkJobResult {
            file: name.to_string(),
            original_size: format!("{size_mb:.2}MB"),
            duration: format!("{duration:.2} seconds"),
            chunks,
            backup_path: backup.display().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use tempfile::TempDir;

    /// Scripted media tool: durations come from a table, extraction writes an
    /// empty file, and individual files can be told to fail.
    struct FakeTool {
        durations: HashMap<String, f64>,
        fail_probe: HashSet<String>,
        fail_extract_after: HashMap<String, u32>,
        extract_calls: Mutex<Vec<(String, f64, f64)>>,
    }

    impl FakeTool {
        fn new(durations: &[(&str, f64)]) -> Self {
            Self {
                durations: durations
                    .iter()
                    .map(|(n, d)| (n.to_string(), *d))
                    .collect(),
                fail_probe: HashSet::new(),
                fail_extract_after: HashMap::new(),
                extract_calls: Mutex::new(Vec::new()),
            }
        }

        fn file_name(path: &Path) -> String {
            path.file_name().unwrap().to_string_lossy().into_owned()
        }
    }

    #[async_trait]
    impl MediaTool for FakeTool {
        async fn probe_duration(&self, path: &Path) -> Result<f64, SplitError> {
            let name = Self::file_name(path);
            if self.fail_probe.contains(&name) {
                return Err(SplitError::BadDuration {
                    output: "N/A".to_string(),
                });
            }
            Ok(self.durations[&name])
        }

        async fn extract_segment(
            &self,
            src: &Path,
            start_secs: f64,
            len_secs: f64,
            dest: &Path,
        ) -> Result<(), SplitError> {
            let name = Self::file_name(src);
            let mut calls = self.extract_calls.lock();
            let prior = calls.iter().filter(|(n, _, _)| *n == name).count() as u32;
            if let Some(limit) = self.fail_extract_after.get(&name) {
                if prior >= *limit {
                    use std::os::unix::process::ExitStatusExt;
                    return Err(SplitError::ToolFailed {
                        tool: "ffmpeg".to_string(),
                        status: std::process::ExitStatus::from_raw(256),
                        stderr: "boom".to_string(),
                    });
                }
            }
            calls.push((name, start_secs, len_secs));
            std::fs::write(dest, b"").map_err(SplitError::Io)?;
            Ok(())
        }
    }

    fn splitter(dir: &Path, tool: FakeTool) -> SampleSplitter {
        SampleSplitter::new(dir.to_path_buf(), SplitPolicy::default(), Arc::new(tool))
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_sample_state_classification() {
        assert_eq!(SampleState::of("sample.wav"), SampleState::Unprocessed);
        assert_eq!(SampleState::of("sample_chunk_1.wav"), SampleState::Chunked);
        assert_eq!(
            SampleState::of("sample_original.wav.bak"),
            SampleState::BackedUp
        );
    }

    #[test]
    fn test_chunk_count_is_ceiling() {
        let policy = SplitPolicy::default();
        assert_eq!(policy.chunk_count(90.0), 3);
        assert_eq!(policy.chunk_count(90.5), 4);
        assert_eq!(policy.chunk_count(29.9), 1);
        assert_eq!(policy.chunk_count(30.0), 1);
        assert_eq!(policy.chunk_count(30.1), 2);
    }

    #[test]
    fn test_eligibility_thresholds() {
        let policy = SplitPolicy::default();
        assert!(!policy.is_eligible(10.0, 1.0));
        assert!(policy.is_eligible(31.0, 1.0));
        assert!(policy.is_eligible(10.0, 9.0));
        // At the thresholds exactly, no split
        assert!(!policy.is_eligible(30.0, 5.0));
    }

    #[tokio::test]
    async fn test_split_long_sample_into_chunks() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sample.wav"), b"riff").unwrap();

        let splitter = splitter(dir.path(), FakeTool::new(&[("sample.wav", 90.0)]));
        let report = splitter.run().await.unwrap();

        assert!(report.success);
        let processed = report.processed.unwrap();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].file, "sample.wav");
        assert_eq!(processed[0].chunks, 3);
        assert_eq!(processed[0].duration, "90.00 seconds");

        assert_eq!(
            names(dir.path()),
            vec![
                "sample_chunk_1.wav",
                "sample_chunk_2.wav",
                "sample_chunk_3.wav",
                "sample_original.wav.bak",
            ]
        );
    }

    #[tokio::test]
    async fn test_chunk_spans_cover_duration_in_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("talk.wav"), b"riff").unwrap();

        let tool = Arc::new(FakeTool::new(&[("talk.wav", 70.0)]));
        let splitter = SampleSplitter::new(
            dir.path().to_path_buf(),
            SplitPolicy::default(),
            tool.clone(),
        );
        splitter.run().await.unwrap();

        let calls = tool.extract_calls.lock().clone();
        let offsets: Vec<f64> = calls.iter().map(|(_, start, _)| *start).collect();
        assert_eq!(offsets, vec![0.0, 30.0, 60.0]);
        assert!(calls.iter().all(|(_, _, len)| *len == 30.0));
    }

    #[tokio::test]
    async fn test_short_sample_left_untouched() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("short.wav"), b"riff").unwrap();

        let splitter = splitter(dir.path(), FakeTool::new(&[("short.wav", 10.0)]));
        let report = splitter.run().await.unwrap();

        assert!(report.success);
        assert!(report.processed.unwrap().is_empty());
        assert_eq!(names(dir.path()), vec!["short.wav"]);
        assert_eq!(
            splitter.list_unprocessed().await.unwrap(),
            vec!["short.wav"]
        );
    }

    #[tokio::test]
    async fn test_empty_directory_reports_no_samples() {
        let dir = TempDir::new().unwrap();
        let splitter = splitter(dir.path(), FakeTool::new(&[]));

        let report = splitter.run().await.unwrap();
        assert!(!report.success);
        assert_eq!(report.message.as_deref(), Some("No voice samples found"));
        assert!(report.processed.is_none());
    }

    #[tokio::test]
    async fn test_rerun_after_split_is_idempotent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sample.wav"), b"riff").unwrap();

        let splitter = splitter(dir.path(), FakeTool::new(&[("sample.wav", 90.0)]));
        let first = splitter.run().await.unwrap();
        assert!(first.success);

        let second = splitter.run().await.unwrap();
        assert!(!second.success);
        assert_eq!(second.message.as_deref(), Some("No voice samples found"));
        // Chunks from the first run are still there, untouched.
        assert_eq!(names(dir.path()).len(), 4);
    }

    #[tokio::test]
    async fn test_probe_failure_skips_only_that_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.wav"), b"riff").unwrap();
        std::fs::write(dir.path().join("good.wav"), b"riff").unwrap();

        let mut tool = FakeTool::new(&[("good.wav", 90.0)]);
        tool.fail_probe.insert("bad.wav".to_string());

        let splitter = splitter(dir.path(), tool);
        let report = splitter.run().await.unwrap();

        assert!(report.success);
        let processed = report.processed.unwrap();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].file, "good.wav");

        // The failed file stays unprocessed and is retried next run.
        assert!(dir.path().join("bad.wav").exists());
        assert_eq!(splitter.list_unprocessed().await.unwrap(), vec!["bad.wav"]);
    }

    #[tokio::test]
    async fn test_extract_failure_leaves_original_in_place() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sample.wav"), b"riff").unwrap();

        let mut tool = FakeTool::new(&[("sample.wav", 90.0)]);
        tool.fail_extract_after.insert("sample.wav".to_string(), 1);

        let splitter = splitter(dir.path(), tool);
        let report = splitter.run().await.unwrap();

        // Partial success is still success:true, just with no result for the
        // failed file.
        assert!(report.success);
        assert!(report.processed.unwrap().is_empty());
        assert!(dir.path().join("sample.wav").exists());
    }
}
