//! Timing Span Parsers and Segment Exporters
//!
//! Reads externally produced timing spans and writes timed segments back out:
//! - SRT (SubRip) spans, as written by most transcription tools
//! - Whisper-style JSON (`{"segments": [{"start", "end", "text"}]}`)
//! - SRT export of timed segments for subtitle-based renderers
//!
//! # Example
//!
//! ```rust,ignore
//! use narrareel_lib::core::captions::{load_spans, export_srt};
//!
//! let spans = load_spans(Path::new("speech.srt"))?;
//! let srt = export_srt(&timeline.overlays());
//! ```

use std::path::Path;

use serde::Deserialize;

use super::{TextSegment, TimestampSpan};
use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while parsing span files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid timestamp format
    InvalidTimestamp(String),
    /// Invalid cue layout
    InvalidFormat(String),
    /// Missing required data
    MissingData(String),
    /// Unexpected end of input
    UnexpectedEnd,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            Self::InvalidFormat(s) => write!(f, "Invalid format: {}", s),
            Self::MissingData(s) => write!(f, "Missing data: {}", s),
            Self::UnexpectedEnd => write!(f, "Unexpected end of input"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for CoreError {
    fn from(err: ParseError) -> Self {
        CoreError::SpanParseFailed(err.to_string())
    }
}

// =============================================================================
// SRT Format
// =============================================================================

/// Parses SRT cues into timing spans.
///
/// Cue numbers are optional. Multi-line cue text is joined with a space since
/// spans only carry timing.
///
/// ```text
/// 1
/// 00:00:01,000 --> 00:00:04,000
/// First caption text
/// ```
pub fn parse_srt_spans(content: &str) -> Result<Vec<TimestampSpan>, ParseError> {
    let mut spans = Vec::new();
    let mut lines = content.lines().map(str::trim).peekable();

    loop {
        while lines.peek().is_some_and(|l| l.is_empty()) {
            lines.next();
        }

        let Some(first) = lines.next() else {
            break;
        };

        // The cue number line may be omitted
        let timing_line = if first.contains("-->") {
            first
        } else {
            lines.next().ok_or(ParseError::UnexpectedEnd)?
        };
        let (start_sec, end_sec) = parse_timing_line(timing_line)?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.is_empty()) {
            text_lines.push(line);
        }

        if text_lines.is_empty() {
            return Err(ParseError::MissingData(format!(
                "Cue text after '{}'",
                timing_line
            )));
        }

        spans.push(TimestampSpan::new(start_sec, end_sec, &text_lines.join(" ")));
    }

    Ok(spans)
}

/// Parses a timing line (e.g., "00:00:01,000 --> 00:00:04,000")
fn parse_timing_line(line: &str) -> Result<(TimeSec, TimeSec), ParseError> {
    let (start, end) = line.split_once("-->").ok_or_else(|| {
        ParseError::InvalidFormat(format!("Expected 'start --> end' format: {}", line))
    })?;

    // Some writers append cue settings after the end timestamp
    let end = end.split_whitespace().next().unwrap_or_default();

    Ok((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// Parses `HH:MM:SS,mmm`, `HH:MM:SS.mmm` or `MM:SS.mmm` into seconds
fn parse_timestamp(ts: &str) -> Result<TimeSec, ParseError> {
    let normalized = ts.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let invalid = || ParseError::InvalidTimestamp(ts.to_string());
    let field = |s: &str| s.parse::<f64>().map_err(|_| invalid());

    let seconds = match parts.as_slice() {
        [h, m, s] => field(h)? * 3600.0 + field(m)? * 60.0 + field(s)?,
        [m, s] => field(m)? * 60.0 + field(s)?,
        _ => return Err(invalid()),
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }
    Ok(seconds)
}

/// Exports timed segments to SRT
pub fn export_srt(segments: &[TextSegment]) -> String {
    let mut output = String::new();

    for (number, segment) in segments.iter().enumerate() {
        output.push_str(&format!("{}\n", number + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(segment.start_sec),
            format_srt_timestamp(segment.end_sec)
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

/// Formats seconds as SRT timestamp (00:00:00,000)
fn format_srt_timestamp(seconds: TimeSec) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}

// =============================================================================
// Whisper JSON
// =============================================================================

#[derive(Deserialize)]
struct WhisperDocument {
    segments: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
}

/// Parses the JSON document written by whisper-style transcribers
pub fn parse_whisper_json(content: &str) -> CoreResult<Vec<TimestampSpan>> {
    let document: WhisperDocument = serde_json::from_str(content)?;
    Ok(document
        .segments
        .into_iter()
        .map(|s| TimestampSpan::new(s.start, s.end, s.text.trim()))
        .collect())
}

// =============================================================================
// File Loading
// =============================================================================

/// Loads spans from an `.srt` or `.json` file
pub fn load_spans(path: &Path) -> CoreResult<Vec<TimestampSpan>> {
    let content = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let spans = match extension.as_str() {
        "srt" => parse_srt_spans(&content)?,
        "json" => parse_whisper_json(&content)?,
        other => {
            return Err(CoreError::SpanParseFailed(format!(
                "Unsupported span file type '{}': {}",
                other,
                path.display()
            )))
        }
    };

    tracing::debug!(count = spans.len(), path = %path.display(), "Loaded timestamp spans");
    Ok(spans)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SRT: &str = "1\n00:00:01,000 --> 00:00:04,000\nHello world\n\n2\n00:00:05,500 --> 00:00:08,250\nSecond line\nwraps here\n";

    // -------------------------------------------------------------------------
    // SRT Parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_srt_spans() {
        let spans = parse_srt_spans(SAMPLE_SRT).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], TimestampSpan::new(1.0, 4.0, "Hello world"));
        assert_eq!(spans[1].start_sec, 5.5);
        assert_eq!(spans[1].end_sec, 8.25);
        assert_eq!(spans[1].text, "Second line wraps here");
    }

    #[test]
    fn test_parse_srt_without_cue_numbers() {
        let content = "00:00:00.000 --> 00:00:02.000\nOne\n\n00:00:02.000 --> 00:00:03.500\nTwo";
        let spans = parse_srt_spans(content).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].end_sec, 3.5);
    }

    #[test]
    fn test_parse_srt_windows_line_endings() {
        let content = SAMPLE_SRT.replace('\n', "\r\n");
        let spans = parse_srt_spans(&content).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Hello world");
    }

    #[test]
    fn test_parse_srt_invalid_timestamp() {
        let content = "1\n00:xx:01,000 --> 00:00:04,000\nHello";
        assert!(matches!(
            parse_srt_spans(content),
            Err(ParseError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_srt_missing_text() {
        let content = "1\n00:00:01,000 --> 00:00:04,000\n\n";
        assert!(matches!(
            parse_srt_spans(content),
            Err(ParseError::MissingData(_))
        ));
    }

    #[test]
    fn test_parse_srt_truncated() {
        assert_eq!(parse_srt_spans("1"), Err(ParseError::UnexpectedEnd));
    }

    // -------------------------------------------------------------------------
    // SRT Export
    // -------------------------------------------------------------------------

    #[test]
    fn test_export_srt() {
        let segments = vec![
            TextSegment::new(0, "First.", 0.0, 1.25),
            TextSegment::new(1, "Second.", 1.25, 3661.5),
        ];
        let srt = export_srt(&segments);

        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,250\nFirst.\n"));
        assert!(srt.contains("2\n00:00:01,250 --> 01:01:01,500\nSecond.\n"));
    }

    #[test]
    fn test_exported_srt_parses_back_as_spans() {
        let segments = vec![
            TextSegment::new(0, "A.", 0.0, 2.0),
            TextSegment::new(1, "B.", 2.0, 4.5),
        ];
        let spans = parse_srt_spans(&export_srt(&segments)).unwrap();
        assert_eq!(spans[1], TimestampSpan::new(2.0, 4.5, "B."));
    }

    // -------------------------------------------------------------------------
    // Whisper JSON
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_whisper_json() {
        let json = r#"{"text": "ignored", "segments": [
            {"id": 0, "start": 0.0, "end": 2.4, "text": " Hello there."},
            {"id": 1, "start": 2.4, "end": 5.0, "text": " General Kenobi."}
        ]}"#;
        let spans = parse_whisper_json(json).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Hello there.");
        assert_eq!(spans[1].start_sec, 2.4);
    }

    #[test]
    fn test_parse_whisper_json_rejects_garbage() {
        assert!(matches!(
            parse_whisper_json("{\"nope\": 1}"),
            Err(CoreError::JsonError(_))
        ));
    }

    // -------------------------------------------------------------------------
    // File Loading
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_spans_by_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let srt_path = dir.path().join("speech.SRT");
        std::fs::write(&srt_path, SAMPLE_SRT).unwrap();

        let spans = load_spans(&srt_path).unwrap();
        assert_eq!(spans.len(), 2);

        let txt_path = dir.path().join("speech.txt");
        std::fs::write(&txt_path, SAMPLE_SRT).unwrap();
        assert!(matches!(
            load_spans(&txt_path),
            Err(CoreError::SpanParseFailed(_))
        ));
    }
}
