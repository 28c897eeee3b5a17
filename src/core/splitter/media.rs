//! External media tool invocation.
//!
//! Duration probing and segment extraction both shell out to the ffmpeg
//! family of tools. The trait seam exists so the orchestrator can be tested
//! without the binaries installed.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use super::SplitError;

/// Interface to the external media-inspection and media-conversion tools.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Play duration of the file at `path`, in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64, SplitError>;

    /// Copy the `[start_secs, start_secs + len_secs)` range of `src` into
    /// `dest` without re-encoding.
    async fn extract_segment(
        &self,
        src: &Path,
        start_secs: f64,
        len_secs: f64,
        dest: &Path,
    ) -> Result<(), SplitError>;
}

/// Production [`MediaTool`] backed by ffprobe and ffmpeg subprocesses.
///
/// Every invocation gets a bounded wait; a tool that exceeds the timeout is
/// killed rather than allowed to stall the whole batch.
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    timeout: Duration,
}

impl FfmpegTool {
    pub fn new(ffmpeg: PathBuf, ffprobe: PathBuf, timeout: Duration) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            timeout,
        }
    }

    async fn run_tool(
        &self,
        tool: &str,
        cmd: &mut Command,
    ) -> Result<std::process::Output, SplitError> {
        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SplitError::Launch {
                tool: tool.to_string(),
                source,
            })?;

        // kill_on_drop terminates the child when the timeout drops the future
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SplitError::Timeout {
                    tool: tool.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            return Err(SplitError::ToolFailed {
                tool: tool.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe_duration(&self, path: &Path) -> Result<f64, SplitError> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path);

        let output = self.run_tool("ffprobe", &mut cmd).await?;
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        text.parse::<f64>()
            .map_err(|_| SplitError::BadDuration { output: text })
    }

    async fn extract_segment(
        &self,
        src: &Path,
        start_secs: f64,
        len_secs: f64,
        dest: &Path,
    ) -> Result<(), SplitError> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-i")
            .arg(src)
            .arg("-ss")
            .arg(start_secs.to_string())
            .arg("-t")
            .arg(len_secs.to_string())
            // stream copy: no re-encode, no quality loss
            .arg("-c")
            .arg("copy")
            .arg(dest);

        self.run_tool("ffmpeg", &mut cmd).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tool(ffprobe: &str) -> FfmpegTool {
        FfmpegTool::new(
            PathBuf::from("ffmpeg"),
            PathBuf::from(ffprobe),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_probe_missing_binary_is_launch_error() {
        let result = tool("/nonexistent/ffprobe")
            .probe_duration(Path::new("sample.wav"))
            .await;
        assert!(matches!(result, Err(SplitError::Launch { .. })));
    }

    #[tokio::test]
    async fn test_probe_unparseable_output() {
        // `echo` happily accepts the probe arguments and prints them back,
        // which is not a duration.
        let result = tool("echo").probe_duration(Path::new("sample.wav")).await;
        assert!(matches!(result, Err(SplitError::BadDuration { .. })));
    }

    #[tokio::test]
    async fn test_probe_nonzero_exit_is_tool_failure() {
        let result = tool("false").probe_duration(Path::new("sample.wav")).await;
        assert!(matches!(result, Err(SplitError::ToolFailed { .. })));
    }

    #[tokio::test]
    async fn test_probe_hung_tool_times_out() {
        use std::os::unix::fs::PermissionsExt;

        // A probe that ignores its arguments and sleeps past the timeout
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("hang.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let tool = FfmpegTool::new(
            PathBuf::from("ffmpeg"),
            script,
            Duration::from_millis(100),
        );
        let result = tool.probe_duration(Path::new("sample.wav")).await;
        assert!(matches!(result, Err(SplitError::Timeout { .. })));
    }
}
