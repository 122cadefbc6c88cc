//! Loop / Trim Normalization
//!
//! Each track walks an explicit state machine before it is mixed:
//!
//! ```text
//! Loaded ──┬──► Trimmed   (natural > target)
//!          ├──► Looped    (natural < target, ceil(target / natural) copies)
//!          └──► Unchanged (natural == target)
//!                    │
//!                    ▼
//!               Normalized
//! ```
//!
//! Durations are compared in frames at the composite sample rate so the
//! result is exact to one sample.

use serde::Serialize;

use super::PcmBuffer;
use crate::core::{CoreError, CoreResult};

/// What normalization did to a track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Decision {
    /// Source was longer than the target and was cut
    #[serde(rename_all = "camelCase")]
    Trimmed { dropped_frames: usize },
    /// Source was shorter and was repeated `loop_count` times, then cut
    #[serde(rename_all = "camelCase")]
    Looped { loop_count: usize },
    /// Source already matched the target
    Unchanged,
}

/// Normalization state of a single track
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    Loaded {
        natural_frames: usize,
    },
    Trimmed {
        natural_frames: usize,
        target_frames: usize,
    },
    Looped {
        natural_frames: usize,
        target_frames: usize,
        loop_count: usize,
    },
    Unchanged {
        frames: usize,
    },
    Normalized {
        frames: usize,
        decision: Decision,
    },
}

impl TrackState {
    pub fn loaded(natural_frames: usize) -> Self {
        Self::Loaded { natural_frames }
    }

    /// `Loaded` → `Trimmed` | `Looped` | `Unchanged`
    pub fn plan(self, target_frames: usize) -> CoreResult<Self> {
        let Self::Loaded { natural_frames } = self else {
            return Err(CoreError::Internal(format!(
                "Cannot plan normalization from {:?}",
                self
            )));
        };

        if natural_frames == 0 {
            return Err(CoreError::InvalidAudioFormat(
                "Cannot loop a track with no audio frames".to_string(),
            ));
        }

        Ok(match natural_frames.cmp(&target_frames) {
            std::cmp::Ordering::Greater => Self::Trimmed {
                natural_frames,
                target_frames,
            },
            std::cmp::Ordering::Less => Self::Looped {
                natural_frames,
                target_frames,
                loop_count: target_frames.div_ceil(natural_frames),
            },
            std::cmp::Ordering::Equal => Self::Unchanged {
                frames: natural_frames,
            },
        })
    }

    /// Applies the planned loop / trim to `buffer`
    pub fn reshape(&self, mut buffer: PcmBuffer) -> CoreResult<PcmBuffer> {
        let expected = match *self {
            Self::Trimmed { target_frames, .. } => {
                buffer.truncate_frames(target_frames);
                target_frames
            }
            Self::Looped {
                target_frames,
                loop_count,
                ..
            } => {
                buffer.repeat(loop_count);
                buffer.truncate_frames(target_frames);
                target_frames
            }
            Self::Unchanged { frames } => frames,
            other => {
                return Err(CoreError::Internal(format!(
                    "Cannot reshape a track in state {:?}",
                    other
                )))
            }
        };

        if buffer.frames() != expected {
            return Err(CoreError::Internal(format!(
                "Normalized track has {} frames, expected {}",
                buffer.frames(),
                expected
            )));
        }
        Ok(buffer)
    }

    /// `Trimmed` | `Looped` | `Unchanged` → `Normalized`
    pub fn finish(self) -> CoreResult<Self> {
        let (frames, decision) = match self {
            Self::Trimmed {
                natural_frames,
                target_frames,
            } => (
                target_frames,
                Decision::Trimmed {
                    dropped_frames: natural_frames - target_frames,
                },
            ),
            Self::Looped {
                target_frames,
                loop_count,
                ..
            } => (target_frames, Decision::Looped { loop_count }),
            Self::Unchanged { frames } => (frames, Decision::Unchanged),
            other => {
                return Err(CoreError::Internal(format!(
                    "Cannot finish normalization from {:?}",
                    other
                )))
            }
        };
        Ok(Self::Normalized { frames, decision })
    }

    /// Loop count when the track is looped
    pub fn loop_count(&self) -> Option<usize> {
        match *self {
            Self::Looped { loop_count, .. } => Some(loop_count),
            Self::Normalized {
                decision: Decision::Looped { loop_count },
                ..
            } => Some(loop_count),
            _ => None,
        }
    }

    pub fn decision(&self) -> Option<Decision> {
        match *self {
            Self::Normalized { decision, .. } => Some(decision),
            _ => None,
        }
    }
}

/// Plans the loop / trim step for a track of `natural_frames` frames
pub fn plan_normalization(natural_frames: usize, target_frames: usize) -> CoreResult<TrackState> {
    TrackState::loaded(natural_frames).plan(target_frames)
}
