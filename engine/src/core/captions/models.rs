//! Caption Data Models
//!
//! Defines the text segments shown on screen and the timing spans that come
//! from an external transcription step.

use serde::{Deserialize, Serialize};

use crate::core::{TimeRange, TimeSec};

// =============================================================================
// Segmentation Mode
// =============================================================================

/// How consecutive segments relate to each other
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Each segment holds only its own sentence (default)
    #[default]
    Disjoint,
    /// Each segment holds every sentence up to and including its own
    Progressive,
}

impl std::str::FromStr for SegmentationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disjoint" => Ok(SegmentationMode::Disjoint),
            "progressive" => Ok(SegmentationMode::Progressive),
            _ => Err(format!("Unknown segmentation mode: {}", s)),
        }
    }
}

// =============================================================================
// Timestamp Span
// =============================================================================

/// An externally supplied timing hint, typically one speech recognition segment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampSpan {
    /// Start time in seconds
    pub start_sec: TimeSec,
    /// End time in seconds
    pub end_sec: TimeSec,
    /// Recognized text
    #[serde(default)]
    pub text: String,
}

impl TimestampSpan {
    pub fn new(start_sec: TimeSec, end_sec: TimeSec, text: &str) -> Self {
        Self {
            start_sec,
            end_sec,
            text: text.to_string(),
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_sec, self.end_sec)
    }
}

// =============================================================================
// Text Segment
// =============================================================================

/// A contiguous unit of source text with its display interval
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    /// Position of the segment in the segmentation output
    pub index: usize,
    /// Display text
    pub text: String,
    /// Start time in seconds
    pub start_sec: TimeSec,
    /// End time in seconds (exclusive)
    pub end_sec: TimeSec,
}

impl TextSegment {
    pub fn new(index: usize, text: &str, start_sec: TimeSec, end_sec: TimeSec) -> Self {
        Self {
            index,
            text: text.to_string(),
            start_sec,
            end_sec,
        }
    }

    /// Returns the duration of this segment in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_sec, self.end_sec)
    }

    /// Returns true if the segment is on screen at the given time
    pub fn is_visible_at(&self, time_sec: TimeSec) -> bool {
        self.range().contains(time_sec)
    }

    /// Returns true if this segment overlaps with another
    pub fn overlaps(&self, other: &TextSegment) -> bool {
        self.range().overlaps(&other.range())
    }
}
