//! Audio Track Composition
//!
//! Normalizes every track to the target duration, applies volume and fades,
//! and sums the tracks into one composite track.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{plan_normalization, AudioSource, Decision, FadeEnvelope, PcmBuffer};
use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// Track Definition
// =============================================================================

/// Role of a track in the mix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    Narration,
    BackgroundMusic,
}

/// One input to the composer
pub struct AudioTrack {
    source: Box<dyn AudioSource>,
    role: TrackRole,
    volume: f32,
    fade_in_sec: TimeSec,
    fade_out_sec: TimeSec,
    optional: bool,
}

impl AudioTrack {
    pub fn new(source: Box<dyn AudioSource>, role: TrackRole) -> Self {
        Self {
            source,
            role,
            volume: 1.0,
            fade_in_sec: 0.0,
            fade_out_sec: 0.0,
            optional: false,
        }
    }

    /// Required narration track at full volume
    pub fn narration(source: Box<dyn AudioSource>) -> Self {
        Self::new(source, TrackRole::Narration)
    }

    /// Background music; optional, so it may be dropped when substitution is allowed
    pub fn background_music(source: Box<dyn AudioSource>) -> Self {
        Self::new(source, TrackRole::BackgroundMusic).optional(true)
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_fades(mut self, fade_in_sec: TimeSec, fade_out_sec: TimeSec) -> Self {
        self.fade_in_sec = fade_in_sec;
        self.fade_out_sec = fade_out_sec;
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn role(&self) -> TrackRole {
        self.role
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }
}

impl std::fmt::Debug for AudioTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioTrack")
            .field("source", &self.source.describe())
            .field("role", &self.role)
            .field("volume", &self.volume)
            .field("fade_in_sec", &self.fade_in_sec)
            .field("fade_out_sec", &self.fade_out_sec)
            .field("optional", &self.optional)
            .finish()
    }
}

// =============================================================================
// Options and Results
// =============================================================================

/// Output format and failure policy of the composer
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeOptions {
    /// Composite sample rate in Hz
    pub sample_rate: u32,
    /// Composite channel count
    pub channels: u16,
    /// Drop optional tracks that fail to load instead of aborting
    pub allow_substitution: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            allow_substitution: false,
        }
    }
}

/// What happened to one track during composition
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub source: String,
    pub role: TrackRole,
    pub natural_duration_sec: TimeSec,
    pub decision: Decision,
    pub volume: f32,
    pub fade_in_sec: TimeSec,
    pub fade_out_sec: TimeSec,
    pub fade_clipped: bool,
}

/// The mixed result, exactly as long as the requested target
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeAudioTrack {
    buffer: PcmBuffer,
    tracks: Vec<TrackSummary>,
    skipped: Vec<String>,
}

impl CompositeAudioTrack {
    pub fn duration_sec(&self) -> TimeSec {
        self.buffer.duration_sec()
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    pub fn channels(&self) -> u16 {
        self.buffer.channels()
    }

    pub fn buffer(&self) -> &PcmBuffer {
        &self.buffer
    }

    /// Tracks that made it into the mix
    pub fn tracks(&self) -> &[TrackSummary] {
        &self.tracks
    }

    /// Optional sources dropped because they failed to load
    pub fn skipped_sources(&self) -> &[String] {
        &self.skipped
    }

    /// Writes the mix as 16-bit PCM WAV
    pub fn write_wav(&self, path: &Path) -> CoreResult<()> {
        self.buffer.write_wav(path)
    }
}

// =============================================================================
// Composer
// =============================================================================

/// Loops, trims, scales, fades and mixes tracks
#[derive(Clone, Debug, Default)]
pub struct AudioTrackComposer {
    options: ComposeOptions,
}

impl AudioTrackComposer {
    pub fn new(options: ComposeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Composes `tracks` into one track of exactly `target_duration` seconds.
    ///
    /// Each track's decoded audio is dropped as soon as it has been added to
    /// the mix.
    pub fn compose(
        &self,
        tracks: Vec<AudioTrack>,
        target_duration: TimeSec,
    ) -> CoreResult<CompositeAudioTrack> {
        if !target_duration.is_finite() || target_duration <= 0.0 {
            return Err(CoreError::InvalidTimeRange(0.0, target_duration));
        }
        if tracks.is_empty() {
            return Err(CoreError::ValidationError(
                "No audio tracks to compose".to_string(),
            ));
        }

        let target_frames = PcmBuffer::frames_for(target_duration, self.options.sample_rate);
        if target_frames == 0 {
            return Err(CoreError::InvalidTimeRange(0.0, target_duration));
        }

        let channels = self.options.channels.max(1);
        let mut mix = PcmBuffer::silence(self.options.sample_rate, channels, target_frames);
        let mut summaries = Vec::with_capacity(tracks.len());
        let mut skipped = Vec::new();

        for track in tracks {
            match self.normalize_track(&track, target_frames) {
                Ok((buffer, summary)) => {
                    for (out, sample) in mix.samples_mut().iter_mut().zip(buffer.samples()) {
                        *out += sample;
                    }
                    summaries.push(summary);
                }
                Err(err @ CoreError::AudioLoad { .. })
                    if track.optional && self.options.allow_substitution =>
                {
                    warn!(
                        source = %track.describe(),
                        role = ?track.role,
                        "Optional track failed to load, continuing without it: {}",
                        err
                    );
                    skipped.push(track.describe());
                }
                Err(err) => return Err(err),
            }
        }

        if summaries.is_empty() {
            warn!("Every track was skipped, composite audio is silent");
        }

        info!(
            tracks = summaries.len(),
            skipped = skipped.len(),
            duration_sec = mix.duration_sec(),
            "Composed audio"
        );

        Ok(CompositeAudioTrack {
            buffer: mix,
            tracks: summaries,
            skipped,
        })
    }

    /// Loads one track and brings it to the `Normalized` state at
    /// `target_frames` frames, with volume and fades applied
    pub fn normalize_track(
        &self,
        track: &AudioTrack,
        target_frames: usize,
    ) -> CoreResult<(PcmBuffer, TrackSummary)> {
        if !track.volume.is_finite() || !(0.0..=1.0).contains(&track.volume) {
            return Err(CoreError::ValidationError(format!(
                "Volume {} for '{}' is outside 0.0-1.0",
                track.volume,
                track.describe()
            )));
        }

        let label = track.describe();
        let loaded = track.source.load()?;
        let natural_duration_sec = loaded.duration_sec();

        // A very short source can resample down to nothing
        let buffer = loaded.to_layout(self.options.sample_rate, self.options.channels.max(1));
        if buffer.is_empty() {
            return Err(CoreError::audio_load(&label, "source contains no audio frames"));
        }
        let planned = plan_normalization(buffer.frames(), target_frames)?;
        debug!(source = %label, state = ?planned, "Planned normalization");

        let mut buffer = planned.reshape(buffer)?;
        let state = planned.finish()?;
        let decision = state
            .decision()
            .ok_or_else(|| CoreError::Internal(format!("'{}' did not normalize", label)))?;

        buffer.scale(track.volume);

        let total_sec = target_frames as f64 / self.options.sample_rate as f64;
        let envelope = FadeEnvelope::new(track.fade_in_sec, track.fade_out_sec, total_sec);
        if envelope.is_clipped() {
            warn!(
                source = %label,
                requested_in = track.fade_in_sec,
                requested_out = track.fade_out_sec,
                applied_in = envelope.fade_in_sec(),
                applied_out = envelope.fade_out_sec(),
                "Fades longer than the track, clipped each ramp to half the track"
            );
        }
        envelope.apply(&mut buffer);

        Ok((
            buffer,
            TrackSummary {
                source: label,
                role: track.role,
                natural_duration_sec,
                decision,
                volume: track.volume,
                fade_in_sec: envelope.fade_in_sec(),
                fade_out_sec: envelope.fade_out_sec(),
                fade_clipped: envelope.is_clipped(),
            },
        ))
    }
}

/// Composes with default options (44.1 kHz stereo, no substitution)
pub fn compose(tracks: Vec<AudioTrack>, target_duration: TimeSec) -> CoreResult<CompositeAudioTrack> {
    AudioTrackComposer::default().compose(tracks, target_duration)
}

// =============================================================================
// Tests
// =============================================================================
