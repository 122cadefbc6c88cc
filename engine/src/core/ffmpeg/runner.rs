//! FFmpeg Runner Module
//!
//! Executes FFmpeg as a child process and maps failures to [`FFmpegError`].

use std::sync::Arc;

use tracing::{debug, info};

use super::{FFmpegError, FFmpegInfo, FFmpegResult};

/// Lines of stderr kept in an execution error
const STDERR_TAIL_LINES: usize = 20;

/// Async FFmpeg process runner
#[derive(Debug, Clone)]
pub struct FFmpegRunner {
    info: Arc<FFmpegInfo>,
}

impl FFmpegRunner {
    /// Create a new FFmpegRunner from a detected FFmpeg installation
    pub fn new(info: FFmpegInfo) -> Self {
        Self {
            info: Arc::new(info),
        }
    }

    pub fn info(&self) -> &FFmpegInfo {
        &self.info
    }

    /// Runs ffmpeg with `args` and waits for it to exit.
    ///
    /// A non-zero exit becomes [`FFmpegError::ExecutionFailed`] carrying the
    /// tail of stderr.
    pub async fn run(&self, args: &[String]) -> FFmpegResult<()> {
        info!(
            ffmpeg = %self.info.ffmpeg_path.display(),
            version = %self.info.version,
            "Running FFmpeg"
        );
        debug!(args = %args.join(" "), "FFmpeg arguments");

        let output = tokio::process::Command::new(&self.info.ffmpeg_path)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(FFmpegError::ProcessError)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FFmpegError::ExecutionFailed(format!(
                "{}: {}",
                output.status,
                stderr_tail(&stderr)
            )));
        }

        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
