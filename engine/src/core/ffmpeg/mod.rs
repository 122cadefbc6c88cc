//! FFmpeg Integration Module
//!
//! Locates an FFmpeg binary and runs it as an external process. Used by the
//! video exporter; the rest of the engine never shells out.

mod detection;
mod runner;

pub use detection::{detect_ffmpeg, parse_version, FFmpegInfo};
pub use runner::FFmpegRunner;

use std::path::PathBuf;

use crate::core::CoreError;

/// Failures while locating or running ffmpeg
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("ffmpeg was not found on PATH or in the usual install directories")]
    NotFound,

    #[error("Configured ffmpeg binary does not exist: {}", .0.display())]
    MissingBinary(PathBuf),

    #[error("ffmpeg exited with an error: {0}")]
    ExecutionFailed(String),

    #[error("Could not start ffmpeg: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Unrecognized ffmpeg -version output: {0}")]
    ParseError(String),
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;

impl From<FFmpegError> for CoreError {
    fn from(err: FFmpegError) -> Self {
        CoreError::ExternalToolFailure(err.to_string())
    }
}
