//! Audio Composition Module
//!
//! Builds the single composite audio track of a timeline from a narration
//! source and optional background music.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Audio Composition                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  source.rs     - PcmBuffer, AudioSource, WAV / memory sources   │
//! │  normalize.rs  - Loop / trim state machine                      │
//! │  envelope.rs   - Linear fade-in / fade-out                      │
//! │  composer.rs   - Volume, fades and additive mixing              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Samples are summed without limiting; clamping happens only when the
//! composite is written to disk.

mod composer;
mod envelope;
mod normalize;
mod source;

pub use composer::{
    compose, AudioTrack, AudioTrackComposer, ComposeOptions, CompositeAudioTrack, TrackRole,
    TrackSummary,
};
pub use envelope::FadeEnvelope;
pub use normalize::{plan_normalization, Decision, TrackState};
pub use source::{AudioSource, MemorySource, PcmBuffer, WavFileSource};
