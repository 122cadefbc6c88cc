//! Destructive and Edge Case Tests for the Core Engine
//!
//! These tests feed degenerate inputs through the public building blocks and
//! check that each one fails with the right error instead of panicking or
//! producing a broken timeline.

use crate::core::audio::{
    AudioTrack, AudioTrackComposer, ComposeOptions, FadeEnvelope, MemorySource, PcmBuffer,
};
use crate::core::captions::{
    align, allocate_proportional, parse_srt_spans, parse_whisper_json, segment, SegmentationMode,
    TimestampSpan,
};
use crate::core::{Color, CoreError, TimeRange};

#[test]
fn test_destructive_color_parsing() {
    assert_eq!(Color::from_hex("invalid"), Color::fallback_grey());
    assert_eq!(Color::from_hex("12345"), Color::fallback_grey());
    assert_eq!(Color::from_hex(""), Color::fallback_grey());
    assert_eq!(Color::from_hex("#ÿÿÿ"), Color::fallback_grey());

    assert_eq!(Color::try_from_hex("#FFF").unwrap(), Color::white());
}

#[test]
fn test_destructive_time_range_inversion() {
    let inverted = TimeRange::new(10.0, 5.0);
    assert!(!inverted.is_valid());
    assert!(inverted.clamp_to(&TimeRange::new(0.0, 20.0)).is_none());

    assert!(!TimeRange::new(f64::NAN, 1.0).is_valid());
}

#[test]
fn test_destructive_delimiter_only_text() {
    for text in ["", "   ", "...", "?!?!", "。。。", " . ! ? "] {
        assert!(
            matches!(
                segment(text, SegmentationMode::Disjoint),
                Err(CoreError::EmptySegmentation)
            ),
            "{:?}",
            text
        );
    }
}

#[test]
fn test_destructive_alignment_without_duration() {
    let segments = vec!["Hello.".to_string()];
    assert!(matches!(
        align(&segments, &[], 0.0),
        Err(CoreError::InvalidTimeRange(..))
    ));
    assert!(matches!(
        align(&segments, &[], f64::NAN),
        Err(CoreError::InvalidTimeRange(..))
    ));
    assert!(matches!(
        align(&[], &[], 5.0),
        Err(CoreError::EmptySegmentation)
    ));
}

#[test]
fn test_destructive_spans_past_total_leave_no_room() {
    let segments = vec!["A.".to_string(), "B.".to_string()];
    let spans = vec![TimestampSpan::new(0.0, 12.0, "A.")];
    let result = align(&segments, &spans, 10.0);
    assert!(matches!(result, Err(CoreError::InvalidTimeRange(..))));
}

#[test]
fn test_destructive_inverted_span_fails_fast() {
    let segments = vec!["A.".to_string()];
    let spans = vec![TimestampSpan::new(3.0, 1.0, "A.")];
    assert!(matches!(
        align(&segments, &spans, 10.0),
        Err(CoreError::InvalidTimeRange(..))
    ));
}

#[test]
fn test_destructive_underflow() {
    let result = allocate_proportional(&[], 2.0, 5.0);
    assert!(matches!(
        result,
        Err(CoreError::AlignmentUnderflow { remaining_sec }) if remaining_sec == 3.0
    ));
}

#[test]
fn test_destructive_span_documents() {
    assert!(parse_srt_spans("1\nnot a timing line\ntext\n").is_err());
    assert!(parse_srt_spans("1\n00:00:01,000 --> 00:00:02,000\n").is_err());
    assert!(matches!(
        parse_whisper_json("{\"segments\": 3}"),
        Err(CoreError::JsonError(_))
    ));
}

#[test]
fn test_destructive_pcm_layout() {
    assert!(matches!(
        PcmBuffer::new(44100, 2, vec![0.0; 3]),
        Err(CoreError::InvalidAudioFormat(_))
    ));
    assert!(matches!(
        PcmBuffer::new(0, 1, vec![0.0; 3]),
        Err(CoreError::InvalidAudioFormat(_))
    ));
}

#[test]
fn test_destructive_fade_on_single_frame() {
    let mut buffer = PcmBuffer::new(100, 1, vec![1.0]).unwrap();
    FadeEnvelope::new(5.0, 5.0, 0.02).apply(&mut buffer);
    assert_eq!(buffer.samples(), &[0.0]);
}

#[test]
fn test_destructive_sub_sample_target() {
    let buffer = PcmBuffer::new(1000, 1, vec![0.5; 10]).unwrap();
    let composer = AudioTrackComposer::new(ComposeOptions {
        sample_rate: 1000,
        channels: 1,
        allow_substitution: false,
    });
    let result = composer.compose(
        vec![AudioTrack::narration(Box::new(MemorySource::new("short", buffer)))],
        0.0001,
    );
    assert!(matches!(result, Err(CoreError::InvalidTimeRange(..))));
}

#[test]
fn test_destructive_loud_mix_is_not_limited_in_memory() {
    let loud = || {
        let buffer = PcmBuffer::new(1000, 1, vec![0.9; 1000]).unwrap();
        Box::new(MemorySource::new("loud", buffer))
    };
    let composer = AudioTrackComposer::new(ComposeOptions {
        sample_rate: 1000,
        channels: 1,
        allow_substitution: false,
    });
    let composite = composer
        .compose(
            vec![AudioTrack::narration(loud()), AudioTrack::narration(loud())],
            1.0,
        )
        .unwrap();
    assert!(composite.buffer().samples().iter().all(|&s| s > 1.0));
}
