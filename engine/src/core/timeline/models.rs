//! Timeline Model Definitions
//!
//! Defines the background, overlay and warning types a [`Timeline`] is built
//! from. A timeline is a description only; rendering belongs to an exporter.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::audio::{CompositeAudioTrack, TrackSummary};
use crate::core::captions::TextSegment;
use crate::core::{Color, TimeRange, TimeSec};

// =============================================================================
// Background
// =============================================================================

/// Procedurally drawn background styles
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum GeneratedStyle {
    /// Flat base colour with a bar that fills left to right over the timeline
    ProgressBar { base: Color, bar: Color },
}

/// Full-frame visual under the text overlays
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Background {
    /// Still image, looped for the whole duration
    Image { path: PathBuf },
    /// Existing video whose picture is looped under the overlays; its own
    /// audio is replaced by the composite track
    Video { path: PathBuf },
    /// Solid colour fill
    SolidColor { color: Color },
    /// Drawn by the exporter
    Generated { style: GeneratedStyle },
}

impl Background {
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self::Image { path: path.into() }
    }

    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self::Video { path: path.into() }
    }

    pub fn solid(color: Color) -> Self {
        Self::SolidColor { color }
    }

    pub fn progress_bar(base: Color, bar: Color) -> Self {
        Self::Generated {
            style: GeneratedStyle::ProgressBar { base, bar },
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::solid(Color::fallback_grey())
    }
}

// =============================================================================
// Warnings
// =============================================================================

/// Overlay that did not fit inside `[0, total_duration]`.
///
/// `clipped` is `None` when nothing of the overlay was left and it was dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryClipWarning {
    /// Index of the overlay (`TextSegment::index`)
    pub index: usize,
    pub original: TimeRange,
    pub clipped: Option<TimeRange>,
}

impl BoundaryClipWarning {
    pub fn is_dropped(&self) -> bool {
        self.clipped.is_none()
    }
}

// =============================================================================
// Timeline
// =============================================================================

/// Background, ordered overlays and composite audio on one time axis.
///
/// Every overlay lies within `[0, total_duration_sec]`. Fields are read
/// through accessors only; the assembler is the only producer.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    pub(super) total_duration_sec: TimeSec,
    pub(super) background: Background,
    pub(super) overlays: Vec<TextSegment>,
    pub(super) audio: CompositeAudioTrack,
    pub(super) warnings: Vec<BoundaryClipWarning>,
}

impl Timeline {
    pub fn total_duration_sec(&self) -> TimeSec {
        self.total_duration_sec
    }

    pub fn bounds(&self) -> TimeRange {
        TimeRange::new(0.0, self.total_duration_sec)
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Overlays sorted by start time
    pub fn overlays(&self) -> &[TextSegment] {
        &self.overlays
    }

    pub fn audio(&self) -> &CompositeAudioTrack {
        &self.audio
    }

    pub fn warnings(&self) -> &[BoundaryClipWarning] {
        &self.warnings
    }

    /// Overlays visible at `time_sec`
    pub fn overlays_at(&self, time_sec: TimeSec) -> impl Iterator<Item = &TextSegment> {
        self.overlays
            .iter()
            .filter(move |overlay| overlay.is_visible_at(time_sec))
    }

    /// Serializable summary of the timeline (no sample data)
    pub fn describe(&self) -> TimelineDescription {
        TimelineDescription {
            total_duration_sec: self.total_duration_sec,
            background: self.background.clone(),
            overlays: self.overlays.clone(),
            audio: AudioDescription {
                sample_rate: self.audio.sample_rate(),
                channels: self.audio.channels(),
                duration_sec: self.audio.duration_sec(),
                tracks: self.audio.tracks().to_vec(),
                skipped_sources: self.audio.skipped_sources().to_vec(),
            },
            warnings: self.warnings.clone(),
        }
    }
}

/// JSON view of a [`Timeline`]
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDescription {
    pub total_duration_sec: TimeSec,
    pub background: Background,
    pub overlays: Vec<TextSegment>,
    pub audio: AudioDescription,
    pub warnings: Vec<BoundaryClipWarning>,
}

/// JSON view of the composite audio
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDescription {
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_sec: TimeSec,
    pub tracks: Vec<TrackSummary>,
    pub skipped_sources: Vec<String>,
}
