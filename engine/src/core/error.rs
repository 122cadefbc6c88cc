//! NarraReel Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

use super::TimeSec;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Segmentation Errors
    // =========================================================================
    #[error("Text produced no usable segments")]
    EmptySegmentation,

    // =========================================================================
    // Alignment Errors
    // =========================================================================
    #[error("Proportional allocation has no segments left for {remaining_sec:.3} seconds")]
    AlignmentUnderflow { remaining_sec: TimeSec },

    #[error("Invalid time range: {0}~{1} seconds")]
    InvalidTimeRange(TimeSec, TimeSec),

    #[error("Span parsing failed: {0}")]
    SpanParseFailed(String),

    // =========================================================================
    // Audio Errors
    // =========================================================================
    #[error("Failed to load audio '{source_ref}': {reason}")]
    AudioLoad { source_ref: String, reason: String },

    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),

    // =========================================================================
    // Background Errors
    // =========================================================================
    #[error("Background unavailable: {0}")]
    BackgroundUnavailable(String),

    // =========================================================================
    // Export Errors
    // =========================================================================
    #[error("External tool failed: {0}")]
    ExternalToolFailure(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Creates an [`CoreError::AudioLoad`] from any displayable cause
    pub fn audio_load(source_ref: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::AudioLoad {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for errors that indicate a broken engine invariant rather
    /// than bad input
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::AlignmentUnderflow { .. } | Self::InvalidTimeRange(..) | Self::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_load_display() {
        let err = CoreError::audio_load("bgm.wav", "unexpected EOF");
        assert_eq!(
            err.to_string(),
            "Failed to load audio 'bgm.wav': unexpected EOF"
        );
    }

    #[test]
    fn test_invariant_classification() {
        assert!(CoreError::AlignmentUnderflow { remaining_sec: 1.0 }.is_invariant_violation());
        assert!(CoreError::InvalidTimeRange(2.0, 1.0).is_invariant_violation());
        assert!(!CoreError::EmptySegmentation.is_invariant_violation());
        assert!(!CoreError::ExternalToolFailure("exit 1".into()).is_invariant_violation());
    }
}
