//! Background Resolution
//!
//! Backgrounds come from an ordered list of providers. The first provider
//! that yields a background wins; a provider that fails stops the chain
//! unless substitution is allowed, in which case the next one is tried.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::assets::{classify_media_path, MediaKind};
use crate::core::timeline::{Background, GeneratedStyle};
use crate::core::{Color, CoreError, CoreResult};

/// Base colour of the generated progress-bar background
pub const PROGRESS_BAR_BASE: Color = Color {
    r: 20,
    g: 25,
    b: 40,
};

/// Fill colour of the generated progress bar
pub const PROGRESS_BAR_FILL: Color = Color {
    r: 70,
    g: 130,
    b: 180,
};

// =============================================================================
// Providers
// =============================================================================

/// Source of a background
pub trait BackgroundProvider: Send + Sync {
    /// Returns the provider name used in logs
    fn name(&self) -> &str;

    /// `Ok(None)` means this provider has nothing to offer and the next one
    /// should be asked
    fn provide(&self) -> CoreResult<Option<Background>>;
}

/// Still image from disk
#[derive(Clone, Debug)]
pub struct ImageFileProvider {
    path: PathBuf,
}

impl ImageFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BackgroundProvider for ImageFileProvider {
    fn name(&self) -> &str {
        "image"
    }

    fn provide(&self) -> CoreResult<Option<Background>> {
        check_media_file(&self.path, MediaKind::Image, "image")?;
        Ok(Some(Background::image(self.path.clone())))
    }
}

/// Existing video file, looped for the whole duration
#[derive(Clone, Debug)]
pub struct VideoFileProvider {
    path: PathBuf,
}

impl VideoFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BackgroundProvider for VideoFileProvider {
    fn name(&self) -> &str {
        "video"
    }

    fn provide(&self) -> CoreResult<Option<Background>> {
        check_media_file(&self.path, MediaKind::Video, "video")?;
        Ok(Some(Background::video(self.path.clone())))
    }
}

/// Fails unless `path` is a non-empty file whose extension matches `kind`
fn check_media_file(path: &Path, kind: MediaKind, noun: &str) -> CoreResult<()> {
    let metadata = fs::metadata(path)
        .map_err(|e| CoreError::BackgroundUnavailable(format!("{}: {}", path.display(), e)))?;

    if !metadata.is_file() || metadata.len() == 0 {
        return Err(CoreError::BackgroundUnavailable(format!(
            "{}: not a readable {} file",
            path.display(),
            noun
        )));
    }

    if classify_media_path(path) != kind {
        return Err(CoreError::BackgroundUnavailable(format!(
            "{}: unsupported {} type",
            path.display(),
            noun
        )));
    }

    Ok(())
}

/// Solid colour fill; never fails
#[derive(Clone, Debug)]
pub struct SolidColorProvider {
    color: Color,
}

impl SolidColorProvider {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Default for SolidColorProvider {
    fn default() -> Self {
        Self::new(Color::fallback_grey())
    }
}

impl BackgroundProvider for SolidColorProvider {
    fn name(&self) -> &str {
        "solid"
    }

    fn provide(&self) -> CoreResult<Option<Background>> {
        Ok(Some(Background::solid(self.color)))
    }
}

/// Background drawn by the exporter
#[derive(Clone, Debug)]
pub struct GeneratedProvider {
    style: GeneratedStyle,
}

impl GeneratedProvider {
    pub fn new(style: GeneratedStyle) -> Self {
        Self { style }
    }

    pub fn progress_bar() -> Self {
        Self::new(GeneratedStyle::ProgressBar {
            base: PROGRESS_BAR_BASE,
            bar: PROGRESS_BAR_FILL,
        })
    }
}

impl BackgroundProvider for GeneratedProvider {
    fn name(&self) -> &str {
        "generated"
    }

    fn provide(&self) -> CoreResult<Option<Background>> {
        Ok(Some(Background::Generated {
            style: self.style.clone(),
        }))
    }
}

// =============================================================================
// Chain
// =============================================================================

/// Ordered list of background providers
#[derive(Default)]
pub struct BackgroundChain {
    providers: Vec<Box<dyn BackgroundProvider>>,
}

impl BackgroundChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl BackgroundProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn push(&mut self, provider: Box<dyn BackgroundProvider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Asks each provider in order.
    ///
    /// Without `allow_substitution` the first provider error is returned.
    pub fn resolve(&self, allow_substitution: bool) -> CoreResult<Background> {
        for provider in &self.providers {
            match provider.provide() {
                Ok(Some(background)) => {
                    debug!(provider = provider.name(), "Resolved background");
                    return Ok(background);
                }
                Ok(None) => continue,
                Err(err) if allow_substitution => {
                    warn!(
                        provider = provider.name(),
                        "Background provider failed, trying next: {}", err
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(CoreError::BackgroundUnavailable(
            "No background provider produced a background".to_string(),
        ))
    }
}

impl std::fmt::Debug for BackgroundChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("BackgroundChain")
            .field("providers", &names)
            .finish()
    }
}
