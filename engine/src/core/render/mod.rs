//! Render Module
//!
//! Everything between an assembled timeline and pixels:
//!
//! - `background`: ordered background providers with substitution policy
//! - `fonts`: ordered overlay font providers
//! - `export`: the `Exporter` trait and the FFmpeg implementation

mod background;
mod export;
mod fonts;

pub use background::{
    BackgroundChain, BackgroundProvider, GeneratedProvider, ImageFileProvider, SolidColorProvider,
    VideoFileProvider, PROGRESS_BAR_BASE, PROGRESS_BAR_FILL,
};
pub use export::{
    ass_font_size, build_export_args, escape_filter_path, ExportInputs, ExportReport, Exporter,
    FFmpegExporter,
};
pub use fonts::{
    FontChain, FontFileProvider, FontProvider, GenericFontProvider, ResolvedFont,
    DEFAULT_FONT_FAMILY,
};
