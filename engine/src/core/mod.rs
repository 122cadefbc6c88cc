//! NarraReel Core Engine
//!
//! Segmentation, alignment, audio composition, timeline assembly and export.

pub mod assets;
pub mod audio;
pub mod captions;
pub mod ffmpeg;
pub mod pipeline;
pub mod render;
pub mod settings;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_destructive;
