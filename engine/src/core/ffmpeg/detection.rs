//! FFmpeg Detection Module
//!
//! Resolves the ffmpeg binary in order: explicit path, system PATH, then
//! common install directories.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::{FFmpegError, FFmpegResult};

#[cfg(target_os = "windows")]
const FFMPEG_BINARY: &str = "ffmpeg.exe";

#[cfg(not(target_os = "windows"))]
const FFMPEG_BINARY: &str = "ffmpeg";

/// Information about a detected FFmpeg installation
#[derive(Debug, Clone)]
pub struct FFmpegInfo {
    /// Path to ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// FFmpeg version string
    pub version: String,
}

/// Detects a working ffmpeg binary.
///
/// An explicit path that does not exist is an error rather than a reason to
/// search elsewhere.
pub fn detect_ffmpeg(explicit: Option<&Path>) -> FFmpegResult<FFmpegInfo> {
    let ffmpeg_path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(FFmpegError::MissingBinary(path.to_path_buf()));
            }
            path.to_path_buf()
        }
        None => which_ffmpeg()
            .or_else(|| {
                get_common_ffmpeg_paths()
                    .into_iter()
                    .map(|dir| dir.join(FFMPEG_BINARY))
                    .find(|candidate| candidate.exists())
            })
            .ok_or(FFmpegError::NotFound)?,
    };

    let version = get_ffmpeg_version(&ffmpeg_path)?;
    debug!(path = %ffmpeg_path.display(), version = %version, "Detected FFmpeg");

    Ok(FFmpegInfo {
        ffmpeg_path,
        version,
    })
}

/// Find ffmpeg in system PATH using `where` (Windows) or `which` (Unix)
fn which_ffmpeg() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let lookup = "where";

    #[cfg(not(target_os = "windows"))]
    let lookup = "which";

    let output = Command::new(lookup).arg("ffmpeg").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let path_str = String::from_utf8_lossy(&output.stdout);
    path_str
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
}

/// Get common FFmpeg installation paths for the current platform
fn get_common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));

        // Chocolatey
        if let Ok(programdata) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }

        // Scoop
        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            paths.push(PathBuf::from(userprofile).join("scoop").join("shims"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/opt/local/bin")); // MacPorts
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

fn get_ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    let output = Command::new(ffmpeg_path)
        .arg("-version")
        .output()
        .map_err(FFmpegError::ProcessError)?;

    if !output.status.success() {
        return Err(FFmpegError::ExecutionFailed(format!(
            "{} -version exited with {}",
            ffmpeg_path.display(),
            output.status
        )));
    }

    parse_version(&String::from_utf8_lossy(&output.stdout))
}

/// Parses the version from `ffmpeg -version` output
/// ("ffmpeg version X.X.X ..."), falling back to the whole first line
pub fn parse_version(output: &str) -> FFmpegResult<String> {
    let first_line = output
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or_else(|| FFmpegError::ParseError("empty output".to_string()))?;

    Ok(first_line
        .strip_prefix("ffmpeg version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(first_line)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_paths_not_empty() {
        assert!(!get_common_ffmpeg_paths().is_empty());
    }

    #[test]
    fn test_parse_version() {
        let output = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023\nbuilt with gcc";
        assert_eq!(parse_version(output).unwrap(), "6.1.1-3ubuntu5");
    }

    #[test]
    fn test_parse_version_unknown_format() {
        assert_eq!(parse_version("custom build\n").unwrap(), "custom build");
        assert!(matches!(parse_version(""), Err(FFmpegError::ParseError(_))));
    }

    #[test]
    fn test_explicit_missing_path_is_not_searched_around() {
        let result = detect_ffmpeg(Some(Path::new("/nonexistent/bin/ffmpeg")));
        assert!(matches!(result, Err(FFmpegError::MissingBinary(_))));
    }

    #[test]
    fn test_detect_system_ffmpeg() {
        // Passes whether or not FFmpeg is installed
        match detect_ffmpeg(None) {
            Ok(info) => assert!(!info.version.is_empty()),
            Err(FFmpegError::NotFound) => {}
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }
}
