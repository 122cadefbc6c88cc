//! Timeline Module
//!
//! The assembled, immutable description of one video: background, text
//! overlays and composite audio on a single time axis.

mod assembler;
mod models;

pub use assembler::{assemble, TimelineAssembler};
pub use models::{
    AudioDescription, Background, BoundaryClipWarning, GeneratedStyle, Timeline,
    TimelineDescription,
};
