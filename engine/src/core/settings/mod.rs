//! Composition Settings
//!
//! JSON configuration for a composition run:
//! - Track volumes and fade length
//! - Segmentation mode and delimiter set
//! - Substitution policy for optional inputs
//! - Export encoding parameters
//!
//! Loading is tolerant of out-of-range values: [`CompositionSettings::normalize`]
//! corrects them instead of failing.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::audio::ComposeOptions;
use crate::core::captions::{DelimiterSet, SegmentationMode, TextSegmenter};
use crate::core::{Color, CoreResult, TimeSec};

/// Settings file name looked up next to the input text by the CLI
pub const SETTINGS_FILE: &str = "narrareel.json";

/// Settings for one composition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSettings {
    /// Narration volume (0.0 - 1.0)
    #[serde(default = "default_audio_volume")]
    pub audio_volume: f64,

    /// Background music volume (0.0 - 1.0)
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f64,

    /// Fade-in and fade-out length applied to the background music and,
    /// unless `fade_narration` is off, to the narration
    #[serde(default = "default_fade_duration")]
    pub fade_duration_sec: TimeSec,

    /// Fade the narration as well as the background music
    #[serde(default = "default_fade_narration")]
    pub fade_narration: bool,

    /// Overlay segmentation mode
    #[serde(default)]
    pub mode: SegmentationMode,

    /// Also split on clause commas
    #[serde(default)]
    pub comma_aware: bool,

    /// Replace unavailable optional inputs instead of failing
    #[serde(default)]
    pub allow_substitution: bool,

    /// Fallback background colour (#RRGGBB)
    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Encoding parameters
    #[serde(default)]
    pub export: ExportSettings,
}

fn default_audio_volume() -> f64 {
    1.0
}

fn default_bgm_volume() -> f64 {
    0.3
}

fn default_fade_duration() -> TimeSec {
    1.0
}

fn default_fade_narration() -> bool {
    true
}

fn default_background_color() -> String {
    "#323232".to_string()
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            audio_volume: default_audio_volume(),
            bgm_volume: default_bgm_volume(),
            fade_duration_sec: default_fade_duration(),
            fade_narration: default_fade_narration(),
            mode: SegmentationMode::default(),
            comma_aware: false,
            allow_substitution: false,
            background_color: default_background_color(),
            export: ExportSettings::default(),
        }
    }
}

impl CompositionSettings {
    /// Clamps every value into its valid range.
    pub fn normalize(&mut self) {
        self.audio_volume = clamp_f64(self.audio_volume, 0.0, 1.0);
        self.bgm_volume = clamp_f64(self.bgm_volume, 0.0, 1.0);
        self.fade_duration_sec = clamp_f64(self.fade_duration_sec, 0.0, 60.0);

        if Color::try_from_hex(&self.background_color).is_err() {
            self.background_color = default_background_color();
        }

        self.export.normalize();
    }

    pub fn background_color(&self) -> Color {
        Color::from_hex(&self.background_color)
    }

    pub fn delimiters(&self) -> DelimiterSet {
        if self.comma_aware {
            DelimiterSet::comma_aware()
        } else {
            DelimiterSet::sentences()
        }
    }

    pub fn segmenter(&self) -> TextSegmenter {
        TextSegmenter::new(self.delimiters())
    }

    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            sample_rate: self.export.sample_rate,
            channels: self.export.channels,
            allow_substitution: self.allow_substitution,
        }
    }
}

/// Output encoding parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Overlay font size in pixels
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Composite audio sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Composite audio channel count
    #[serde(default = "default_channels")]
    pub channels: u16,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_fps() -> u32 {
    30
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_font_size() -> u32 {
    48
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u16 {
    2
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            font_size: default_font_size(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

impl ExportSettings {
    pub fn normalize(&mut self) {
        self.width = even_dimension(self.width);
        self.height = even_dimension(self.height);
        self.fps = self.fps.clamp(1, 120);
        self.video_codec = normalize_enum(
            &self.video_codec,
            &["libx264", "libx265", "libvpx-vp9", "mpeg4"],
            default_video_codec(),
        );
        self.audio_codec = normalize_enum(
            &self.audio_codec,
            &["aac", "libmp3lame", "libopus"],
            default_audio_codec(),
        );
        self.font_size = self.font_size.clamp(8, 400);
        if ![22050, 32000, 44100, 48000].contains(&self.sample_rate) {
            self.sample_rate = default_sample_rate();
        }
        self.channels = self.channels.clamp(1, 2);
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    if allowed.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        value.to_ascii_lowercase()
    } else {
        fallback
    }
}

/// Encoders need even frame dimensions
fn even_dimension(value: u32) -> u32 {
    let clamped = value.clamp(16, 7680);
    clamped - clamped % 2
}

/// Loads and normalizes settings from a JSON file.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_settings(path: &Path) -> CoreResult<CompositionSettings> {
    if !path.exists() {
        info!(path = %path.display(), "Settings file not found, using defaults");
        return Ok(CompositionSettings::default());
    }

    let content = fs::read_to_string(path)?;
    let mut settings: CompositionSettings = serde_json::from_str(&content)?;
    settings.normalize();
    debug!(path = %path.display(), "Loaded settings");
    Ok(settings)
}
