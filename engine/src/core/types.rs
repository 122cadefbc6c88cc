//! NarraReel Core Type Definitions
//!
//! Defines fundamental types used throughout the engine.

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Tolerance used when comparing computed timestamps
pub const TIME_EPSILON: TimeSec = 1e-9;

// =============================================================================
// Time Range
// =============================================================================

/// Half-open time range `[start_sec, end_sec)`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
}

impl TimeRange {
    pub fn new(start_sec: TimeSec, end_sec: TimeSec) -> Self {
        Self { start_sec, end_sec }
    }

    /// Returns duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    /// Returns true when the range has positive length
    pub fn is_valid(&self) -> bool {
        self.start_sec.is_finite() && self.end_sec.is_finite() && self.end_sec > self.start_sec
    }

    /// Checks if a given time is within range (end exclusive)
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start_sec && time < self.end_sec
    }

    /// Checks if two ranges overlap
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_sec < other.end_sec && self.end_sec > other.start_sec
    }

    /// Checks if this range lies inside `[bounds.start_sec, bounds.end_sec]`
    pub fn is_within(&self, bounds: &TimeRange) -> bool {
        self.start_sec >= bounds.start_sec && self.end_sec <= bounds.end_sec
    }

    /// Clamps the range to `bounds`.
    ///
    /// Returns `None` when nothing of positive length remains.
    pub fn clamp_to(&self, bounds: &TimeRange) -> Option<TimeRange> {
        let start = self.start_sec.max(bounds.start_sec);
        let end = self.end_sec.min(bounds.end_sec);
        if end > start {
            Some(TimeRange::new(start, end))
        } else {
            None
        }
    }
}

// =============================================================================
// Color
// =============================================================================

/// Opaque RGB color (0-255 per channel)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    /// Neutral dark grey used when no background image is available
    pub fn fallback_grey() -> Self {
        Self::rgb(50, 50, 50)
    }

    /// Parses `#RRGGBB` or `#RGB`.
    pub fn try_from_hex(hex: &str) -> Result<Self, String> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("Invalid hex color: {}", hex));
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|e| e.to_string());

        match hex.len() {
            3 => {
                // Expand "F" to "FF"
                let r = channel(&hex[0..1])? * 17;
                let g = channel(&hex[1..2])? * 17;
                let b = channel(&hex[2..3])? * 17;
                Ok(Self::rgb(r, g, b))
            }
            6 => Ok(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            len => Err(format!("Invalid hex color length: {}", len)),
        }
    }

    /// Parses a hex color string, falling back to the default grey on invalid input.
    pub fn from_hex(hex: &str) -> Self {
        match Self::try_from_hex(hex) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to parse hex color '{}': {}, using fallback grey", hex, e);
                Self::fallback_grey()
            }
        }
    }

    /// Formats as `#RRGGBB`
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Formats as FFmpeg color literal (`0xRRGGBB`)
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::fallback_grey()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_clamp_inside() {
        let bounds = TimeRange::new(0.0, 10.0);
        let range = TimeRange::new(2.0, 4.0);
        assert_eq!(range.clamp_to(&bounds), Some(range));
        assert!(range.is_within(&bounds));
    }

    #[test]
    fn test_time_range_clamp_partial() {
        let bounds = TimeRange::new(0.0, 10.0);
        let clamped = TimeRange::new(8.0, 12.0).clamp_to(&bounds).unwrap();
        assert_eq!(clamped, TimeRange::new(8.0, 10.0));
    }

    #[test]
    fn test_time_range_clamp_outside() {
        let bounds = TimeRange::new(0.0, 10.0);
        assert!(TimeRange::new(10.0, 12.0).clamp_to(&bounds).is_none());
    }

    #[test]
    fn test_time_range_contains_is_half_open() {
        let range = TimeRange::new(1.0, 2.0);
        assert!(range.contains(1.0));
        assert!(!range.contains(2.0));
    }

    #[test]
    fn test_color_hex_parsing() {
        assert_eq!(Color::try_from_hex("#FF8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::try_from_hex("fff").unwrap(), Color::white());
        assert!(Color::try_from_hex("#12345").is_err());
        assert_eq!(Color::from_hex("not-a-color"), Color::fallback_grey());
    }

    #[test]
    fn test_color_formatting() {
        let color = Color::rgb(70, 130, 180);
        assert_eq!(color.to_hex(), "#4682B4");
        assert_eq!(color.to_ffmpeg(), "0x4682B4");
    }
}
