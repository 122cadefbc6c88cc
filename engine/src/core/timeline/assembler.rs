//! Timeline Assembly
//!
//! Joins a background, timed overlays and the composite audio into a
//! [`Timeline`]. The audio duration is the timeline duration; overlays that
//! stick out of it are clipped or dropped and reported as warnings.

use tracing::{debug, warn};

use super::{Background, BoundaryClipWarning, Timeline};
use crate::core::audio::CompositeAudioTrack;
use crate::core::captions::TextSegment;
use crate::core::{CoreError, CoreResult, TimeRange};

/// Builds immutable timelines
#[derive(Clone, Copy, Debug, Default)]
pub struct TimelineAssembler;

impl TimelineAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assembles a timeline.
    ///
    /// Overlays are sorted by start time (stable for equal starts). An overlay
    /// with an invalid range fails the assembly; one outside the audio bounds
    /// is clipped, or dropped when nothing of it remains.
    pub fn assemble(
        &self,
        background: Background,
        mut overlays: Vec<TextSegment>,
        audio: CompositeAudioTrack,
    ) -> CoreResult<Timeline> {
        let total_duration_sec = audio.duration_sec();
        if !total_duration_sec.is_finite() || total_duration_sec <= 0.0 {
            return Err(CoreError::InvalidTimeRange(0.0, total_duration_sec));
        }

        if let Some(bad) = overlays.iter().find(|overlay| !overlay.range().is_valid()) {
            return Err(CoreError::InvalidTimeRange(bad.start_sec, bad.end_sec));
        }

        overlays.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));

        let bounds = TimeRange::new(0.0, total_duration_sec);
        let mut kept = Vec::with_capacity(overlays.len());
        let mut warnings = Vec::new();

        for mut overlay in overlays {
            let index = overlay.index;
            let original = overlay.range();
            if original.is_within(&bounds) {
                kept.push(overlay);
                continue;
            }

            let clipped = original.clamp_to(&bounds);
            match clipped {
                Some(range) => {
                    warn!(
                        index,
                        start = original.start_sec,
                        end = original.end_sec,
                        clipped_start = range.start_sec,
                        clipped_end = range.end_sec,
                        "Overlay outside timeline bounds, clipped"
                    );
                    overlay.start_sec = range.start_sec;
                    overlay.end_sec = range.end_sec;
                    kept.push(overlay);
                }
                None => {
                    warn!(
                        index,
                        start = original.start_sec,
                        end = original.end_sec,
                        total = total_duration_sec,
                        "Overlay entirely outside timeline bounds, dropped"
                    );
                }
            }

            warnings.push(BoundaryClipWarning {
                index,
                original,
                clipped,
            });
        }

        debug!(
            overlays = kept.len(),
            warnings = warnings.len(),
            total_duration_sec,
            "Assembled timeline"
        );

        Ok(Timeline {
            total_duration_sec,
            background,
            overlays: kept,
            audio,
            warnings,
        })
    }
}

/// Assembles with the default assembler
pub fn assemble(
    background: Background,
    overlays: Vec<TextSegment>,
    audio: CompositeAudioTrack,
) -> CoreResult<Timeline> {
    TimelineAssembler::new().assemble(background, overlays, audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::{AudioTrack, AudioTrackComposer, ComposeOptions, MemorySource, PcmBuffer};
    use crate::core::Color;

    fn audio(seconds: f64) -> CompositeAudioTrack {
        let buffer = PcmBuffer::new(100, 1, vec![0.1; 100]).unwrap();
        let composer = AudioTrackComposer::new(ComposeOptions {
            sample_rate: 100,
            channels: 1,
            allow_substitution: false,
        });
        composer
            .compose(
                vec![AudioTrack::narration(Box::new(MemorySource::new("tone", buffer)))],
                seconds,
            )
            .unwrap()
    }

    fn seg(index: usize, start: f64, end: f64) -> TextSegment {
        TextSegment::new(index, &format!("segment {}", index), start, end)
    }

    // -------------------------------------------------------------------------
    // Ordering
    // -------------------------------------------------------------------------

    #[test]
    fn test_duration_comes_from_audio() {
        let timeline = assemble(Background::default(), Vec::new(), audio(10.0)).unwrap();
        assert_eq!(timeline.total_duration_sec(), 10.0);
        assert!(timeline.overlays().is_empty());
        assert!(timeline.warnings().is_empty());
    }

    #[test]
    fn test_overlays_sorted_by_start() {
        let overlays = vec![seg(2, 6.0, 8.0), seg(0, 0.0, 3.0), seg(1, 3.0, 6.0)];
        let timeline = assemble(Background::default(), overlays, audio(10.0)).unwrap();

        let starts: Vec<f64> = timeline.overlays().iter().map(|o| o.start_sec).collect();
        assert_eq!(starts, vec![0.0, 3.0, 6.0]);
        assert!(timeline.warnings().is_empty());
    }

    #[test]
    fn test_equal_starts_keep_input_order() {
        let overlays = vec![seg(0, 0.0, 5.0), seg(1, 0.0, 2.0), seg(2, 0.0, 10.0)];
        let timeline = assemble(Background::default(), overlays, audio(10.0)).unwrap();

        let indices: Vec<usize> = timeline.overlays().iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    // -------------------------------------------------------------------------
    // Bounds
    // -------------------------------------------------------------------------

    #[test]
    fn test_overlay_past_end_is_clipped() {
        let overlays = vec![seg(0, 0.0, 5.0), seg(1, 8.0, 12.0)];
        let timeline = assemble(Background::default(), overlays, audio(10.0)).unwrap();

        assert_eq!(timeline.overlays()[1].start_sec, 8.0);
        assert_eq!(timeline.overlays()[1].end_sec, 10.0);
        assert_eq!(
            timeline.warnings(),
            &[BoundaryClipWarning {
                index: 1,
                original: TimeRange::new(8.0, 12.0),
                clipped: Some(TimeRange::new(8.0, 10.0)),
            }]
        );
    }

    #[test]
    fn test_overlay_before_zero_is_clipped() {
        let overlays = vec![seg(0, -1.0, 2.0)];
        let timeline = assemble(Background::default(), overlays, audio(10.0)).unwrap();
        assert_eq!(timeline.overlays()[0].start_sec, 0.0);
        assert_eq!(timeline.warnings().len(), 1);
    }

    #[test]
    fn test_overlay_fully_outside_is_dropped() {
        let overlays = vec![seg(0, 0.0, 5.0), seg(1, 10.0, 12.0), seg(2, 11.0, 13.0)];
        let timeline = assemble(Background::default(), overlays, audio(10.0)).unwrap();

        assert_eq!(timeline.overlays().len(), 1);
        assert_eq!(timeline.warnings().len(), 2);
        assert!(timeline.warnings().iter().all(|w| w.is_dropped()));
    }

    #[test]
    fn test_every_overlay_within_bounds() {
        let overlays = vec![
            seg(0, -3.0, 1.0),
            seg(1, 1.0, 4.0),
            seg(2, 3.5, 9.0),
            seg(3, 8.0, 20.0),
        ];
        let timeline = assemble(Background::default(), overlays, audio(6.0)).unwrap();
        let bounds = timeline.bounds();
        assert!(timeline.overlays().iter().all(|o| o.range().is_within(&bounds)));
    }

    #[test]
    fn test_invalid_overlay_fails() {
        let overlays = vec![seg(0, 3.0, 3.0)];
        let result = assemble(Background::default(), overlays, audio(10.0));
        assert!(matches!(result, Err(CoreError::InvalidTimeRange(..))));
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[test]
    fn test_overlays_at() {
        let overlays = vec![seg(0, 0.0, 3.0), seg(1, 3.0, 6.0)];
        let timeline = assemble(Background::default(), overlays, audio(6.0)).unwrap();

        let at: Vec<usize> = timeline.overlays_at(3.0).map(|o| o.index).collect();
        assert_eq!(at, vec![1]);
        assert_eq!(timeline.overlays_at(6.5).count(), 0);
    }

    #[test]
    fn test_describe_is_json_ready() {
        let overlays = vec![seg(0, 0.0, 3.0)];
        let background = Background::solid(Color::rgb(1, 2, 3));
        let timeline = assemble(background, overlays, audio(4.0)).unwrap();

        let json = serde_json::to_value(timeline.describe()).unwrap();
        assert_eq!(json["totalDurationSec"], 4.0);
        assert_eq!(json["overlays"][0]["text"], "segment 0");
        assert_eq!(json["audio"]["sampleRate"], 100);
        assert_eq!(json["audio"]["tracks"][0]["decision"]["kind"], "looped");
        assert_eq!(json["background"]["type"], "solidColor");
    }
}
