//! Segment Timing Alignment
//!
//! Assigns a `[start, end)` interval to every segment. Externally supplied
//! timestamp spans are trusted and used verbatim, index for index. Segments
//! past the last span share the remaining audio in proportion to their
//! character count.
//!
//! # Boundary between aligned and fallback segments
//!
//! ```text
//! spans:     [s0 ][ s1  ]
//! segments:  [ 0 ][  1  ][  2  ][ 3 ][   4   ]
//!                        ^ end of s1          ^ total duration
//!                        └── proportional by length ──┘
//! ```
//!
//! The fallback window starts where the last used span ends, so time already
//! covered by aligned segments is never handed out twice.

use serde::Serialize;
use tracing::{debug, warn};

use super::{TextSegment, TimestampSpan};
use crate::core::{CoreError, CoreResult, TimeSec, TIME_EPSILON};

// =============================================================================
// Alignment Report
// =============================================================================

/// Result of an alignment pass with bookkeeping about which policy applied
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentReport {
    /// Timed segments in segmentation order
    pub segments: Vec<TextSegment>,
    /// Number of segments timed from external spans
    pub aligned_count: usize,
    /// Number of segments timed by proportional allocation
    pub fallback_count: usize,
    /// Spans left over because there were more spans than segments
    pub ignored_spans: usize,
}

// =============================================================================
// Aligner
// =============================================================================

/// Times segments against an audio track
#[derive(Clone, Copy, Debug, Default)]
pub struct TimingAligner;

impl TimingAligner {
    pub fn new() -> Self {
        Self
    }

    /// Aligns `segments` and returns the timed segments only
    pub fn align(
        &self,
        segments: &[String],
        spans: &[TimestampSpan],
        total_duration: TimeSec,
    ) -> CoreResult<Vec<TextSegment>> {
        Ok(self.align_with_report(segments, spans, total_duration)?.segments)
    }

    /// Aligns `segments`, preferring `spans`, falling back to proportional
    /// allocation over whatever duration the spans leave uncovered.
    ///
    /// Spans beyond the segment count are ignored and counted in the report.
    pub fn align_with_report(
        &self,
        segments: &[String],
        spans: &[TimestampSpan],
        total_duration: TimeSec,
    ) -> CoreResult<AlignmentReport> {
        if segments.is_empty() {
            return Err(CoreError::EmptySegmentation);
        }
        if !total_duration.is_finite() || total_duration < 0.0 {
            return Err(CoreError::InvalidTimeRange(0.0, total_duration));
        }

        let aligned_count = spans.len().min(segments.len());
        let ignored_spans = spans.len() - aligned_count;
        if ignored_spans > 0 {
            debug!(
                ignored_spans,
                segments = segments.len(),
                "More timestamp spans than segments, ignoring the rest"
            );
        }

        let mut timed = Vec::with_capacity(segments.len());
        for (index, (text, span)) in segments.iter().zip(spans).enumerate() {
            timed.push(TextSegment::new(index, text, span.start_sec, span.end_sec));
        }

        let remaining = &segments[aligned_count..];
        if !remaining.is_empty() {
            let window_start = spans[..aligned_count]
                .last()
                .map(|span| span.end_sec.max(0.0))
                .unwrap_or(0.0);

            if aligned_count > 0 {
                debug!(
                    aligned_count,
                    fallback = remaining.len(),
                    window_start,
                    total_duration,
                    "Spans ran out, allocating remaining segments proportionally"
                );
            }

            let intervals = allocate_proportional(remaining, window_start, total_duration)?;
            for (offset, (text, (start, end))) in remaining.iter().zip(intervals).enumerate() {
                timed.push(TextSegment::new(aligned_count + offset, text, start, end));
            }
        }

        for segment in &timed {
            if !segment.range().is_valid() {
                warn!(
                    index = segment.index,
                    start = segment.start_sec,
                    end = segment.end_sec,
                    "Segment has non-positive length"
                );
                return Err(CoreError::InvalidTimeRange(segment.start_sec, segment.end_sec));
            }
        }

        Ok(AlignmentReport {
            fallback_count: remaining.len(),
            segments: timed,
            aligned_count,
            ignored_spans,
        })
    }
}

/// Aligns `segments` with the default aligner
pub fn align(
    segments: &[String],
    spans: &[TimestampSpan],
    total_duration: TimeSec,
) -> CoreResult<Vec<TextSegment>> {
    TimingAligner::new().align(segments, spans, total_duration)
}

// =============================================================================
// Proportional Allocation
// =============================================================================

/// Weight of a segment: its character count (not byte length, so CJK text is
/// weighted like Latin text)
fn weight(text: &str) -> usize {
    text.chars().count()
}

/// Splits `[window_start, window_end]` between `texts` in proportion to their
/// character counts.
///
/// The intervals tile the window exactly: the first starts at `window_start`,
/// each starts where the previous ends, and the last ends at `window_end`.
pub fn allocate_proportional(
    texts: &[String],
    window_start: TimeSec,
    window_end: TimeSec,
) -> CoreResult<Vec<(TimeSec, TimeSec)>> {
    let window = window_end - window_start;

    if texts.is_empty() {
        if window > TIME_EPSILON {
            return Err(CoreError::AlignmentUnderflow {
                remaining_sec: window,
            });
        }
        return Ok(Vec::new());
    }

    if window <= 0.0 {
        return Err(CoreError::InvalidTimeRange(window_start, window_end));
    }

    let total_weight: usize = texts.iter().map(|t| weight(t)).sum();
    if total_weight == 0 {
        return Err(CoreError::InvalidTimeRange(window_start, window_start));
    }

    let mut intervals = Vec::with_capacity(texts.len());
    let mut cumulative = 0usize;
    let mut start = window_start;

    for (i, text) in texts.iter().enumerate() {
        cumulative += weight(text);
        let end = if i + 1 == texts.len() {
            window_end
        } else {
            window_start + window * (cumulative as f64 / total_weight as f64)
        };
        intervals.push((start, end));
        start = end;
    }

    Ok(intervals)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    // -------------------------------------------------------------------------
    // Fallback Only
    // -------------------------------------------------------------------------

    #[test]
    fn test_single_segment_spans_whole_duration() {
        let segments = align(&texts(&["no delimiter here"]), &[], 7.5).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_sec, 0.0);
        assert_eq!(segments[0].end_sec, 7.5);
    }

    #[test]
    fn test_fallback_weights_by_length() {
        // 2 + 6 + 2 = 10 chars over 10 seconds
        let segments = align(&texts(&["A.", "Bbbbb.", "C."]), &[], 10.0).unwrap();

        assert_close(segments[0].start_sec, 0.0);
        assert_close(segments[0].end_sec, 2.0);
        assert_close(segments[1].start_sec, 2.0);
        assert_close(segments[1].end_sec, 8.0);
        assert_close(segments[2].start_sec, 8.0);
        assert_eq!(segments[2].end_sec, 10.0);
    }

    #[test]
    fn test_fallback_tiles_duration_exactly() {
        let samples = [
            texts(&["One.", "Two two.", "Three three three."]),
            texts(&["x", "yy", "zzz", "wwww", "vvvvv", "uuuuuu", "t"]),
            texts(&["这是第一句话。", "Short.", "再见"]),
        ];

        for (k, segs) in samples.iter().enumerate() {
            let total = 3.7 * (k + 1) as f64;
            let timed = align(segs, &[], total).unwrap();

            assert_eq!(timed.len(), segs.len());
            assert_eq!(timed[0].start_sec, 0.0);
            assert_eq!(timed.last().unwrap().end_sec, total);
            for pair in timed.windows(2) {
                // No gap, no overlap
                assert_eq!(pair[0].end_sec, pair[1].start_sec);
            }
            for seg in &timed {
                assert!(seg.end_sec > seg.start_sec);
            }
        }
    }

    #[test]
    fn test_weights_count_characters_not_bytes() {
        // "你好" is 2 chars but 6 bytes
        let segments = align(&texts(&["你好", "ab"]), &[], 4.0).unwrap();
        assert_close(segments[0].end_sec, 2.0);
    }

    // -------------------------------------------------------------------------
    // External Spans
    // -------------------------------------------------------------------------

    #[test]
    fn test_spans_used_verbatim() {
        let spans = vec![
            TimestampSpan::new(0.2, 1.9, "first"),
            TimestampSpan::new(2.1, 4.0, "second"),
        ];
        let segments = align(&texts(&["First.", "Second."]), &spans, 5.0).unwrap();

        assert_eq!(segments[0].start_sec, 0.2);
        assert_eq!(segments[0].end_sec, 1.9);
        assert_eq!(segments[1].start_sec, 2.1);
        assert_eq!(segments[1].end_sec, 4.0);
    }

    #[test]
    fn test_spans_cover_two_of_five_segments() {
        let segs = texts(&["Aa.", "Bb.", "Ccc.", "Dddddd.", "Ee."]);
        let spans = vec![
            TimestampSpan::new(0.0, 1.5, "aa"),
            TimestampSpan::new(1.5, 4.0, "bb"),
        ];

        let report = TimingAligner::new()
            .align_with_report(&segs, &spans, 12.0)
            .unwrap();
        let timed = &report.segments;

        assert_eq!(report.aligned_count, 2);
        assert_eq!(report.fallback_count, 3);

        // Segments 0-1 verbatim
        assert_eq!((timed[0].start_sec, timed[0].end_sec), (0.0, 1.5));
        assert_eq!((timed[1].start_sec, timed[1].end_sec), (1.5, 4.0));

        // Segments 2-4 tile [4, 12] by length: 4 + 7 + 3 = 14 chars over 8 seconds
        assert_eq!(timed[2].start_sec, 4.0);
        assert_close(timed[2].end_sec, 4.0 + 8.0 * 4.0 / 14.0);
        assert_close(timed[3].start_sec, timed[2].end_sec);
        assert_close(timed[3].end_sec, 4.0 + 8.0 * 11.0 / 14.0);
        assert_eq!(timed[4].end_sec, 12.0);

        let indices: Vec<usize> = timed.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_extra_spans_are_ignored_and_counted() {
        let spans = vec![
            TimestampSpan::new(0.0, 1.0, "a"),
            TimestampSpan::new(1.0, 2.0, "b"),
            TimestampSpan::new(2.0, 3.0, "c"),
        ];
        let report = TimingAligner::new()
            .align_with_report(&texts(&["Only one."]), &spans, 3.0)
            .unwrap();

        assert_eq!(report.segments.len(), 1);
        assert_eq!(report.segments[0].end_sec, 1.0);
        assert_eq!(report.aligned_count, 1);
        assert_eq!(report.fallback_count, 0);
        assert_eq!(report.ignored_spans, 2);
    }

    #[test]
    fn test_spans_consuming_all_audio_fail_fast() {
        let spans = vec![TimestampSpan::new(0.0, 5.0, "all of it")];
        let result = align(&texts(&["One.", "Two."]), &spans, 5.0);
        assert!(matches!(result, Err(CoreError::InvalidTimeRange(..))));
    }

    #[test]
    fn test_inverted_span_fails_fast() {
        let spans = vec![TimestampSpan::new(2.0, 1.0, "backwards")];
        let result = align(&texts(&["One."]), &spans, 5.0);
        assert!(matches!(result, Err(CoreError::InvalidTimeRange(2.0, 1.0))));
    }

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------

    #[test]
    fn test_no_segments_fails() {
        let result = align(&[], &[], 5.0);
        assert!(matches!(result, Err(CoreError::EmptySegmentation)));
    }

    #[test]
    fn test_zero_duration_fails() {
        let result = align(&texts(&["One."]), &[], 0.0);
        assert!(matches!(result, Err(CoreError::InvalidTimeRange(..))));
    }

    #[test]
    fn test_allocation_underflow() {
        let result = allocate_proportional(&[], 3.0, 5.0);
        assert!(matches!(
            result,
            Err(CoreError::AlignmentUnderflow { remaining_sec }) if (remaining_sec - 2.0).abs() < 1e-9
        ));
    }

    #[test]
    fn test_allocation_empty_window_is_fine_without_segments() {
        assert!(allocate_proportional(&[], 5.0, 5.0).unwrap().is_empty());
    }
}
