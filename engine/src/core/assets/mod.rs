//! Media Discovery Module
//!
//! Classifies media files by extension and name so a working directory can be
//! turned into composition inputs without prompting.

mod scanner;

pub use scanner::{classify_media_path, scan_media_dir, MediaInventory, MediaKind};
