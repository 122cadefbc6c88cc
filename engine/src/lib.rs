//! NarraReel Core Library
//!
//! Timeline synchronization and audio composition engine for narrated text videos.
//! A block of text is split into segments, each segment is timed against the
//! narration, the narration and background music are normalized and mixed to the
//! timeline duration, and the result is assembled into a [`core::timeline::Timeline`]
//! that an exporter turns into a video file.
//!
//! ## Flow
//!
//! ```text
//! text ──► TextSegmenter ──► TimingAligner ──┐
//!                                            ├──► TimelineAssembler ──► Exporter
//! audio ─► AudioTrackComposer ───────────────┘
//! ```

pub mod core;
