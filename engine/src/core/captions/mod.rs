//! Caption System Module
//!
//! Turns a block of source text into timed on-screen segments:
//! - Segmentation on sentence / clause punctuation (disjoint or progressive)
//! - Timing from external spans with proportional fallback
//! - SRT / whisper JSON span loading and SRT export
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption System                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs     - TextSegment, TimestampSpan, SegmentationMode   │
//! │  segmenter.rs  - Delimiter-based text splitting                 │
//! │  alignment.rs  - Span pass-through + proportional fallback      │
//! │  formats.rs    - SRT / whisper JSON parsing, SRT export         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use narrareel_lib::core::captions::{segment, align, SegmentationMode};
//!
//! let texts = segment("Hello there. Welcome!", SegmentationMode::Disjoint)?;
//! let timed = align(&texts, &[], 6.0)?;
//! assert_eq!(timed.last().unwrap().end_sec, 6.0);
//! ```

mod alignment;
mod formats;
mod models;
mod segmenter;

pub use alignment::{align, allocate_proportional, AlignmentReport, TimingAligner};
pub use formats::{
    export_srt, load_spans, parse_srt_spans, parse_whisper_json, ParseError,
};
pub use models::{SegmentationMode, TextSegment, TimestampSpan};
pub use segmenter::{
    segment, DelimiterSet, TextSegmenter, CLAUSE_DELIMITERS, SENTENCE_DELIMITERS,
};
