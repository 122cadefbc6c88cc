//! Overlay Font Resolution
//!
//! Fonts are resolved the same way as backgrounds: an ordered list of
//! providers, first hit wins. The chain always ends with a generic family so
//! resolution never fails.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::CoreResult;

/// Family used when no font file is found
pub const DEFAULT_FONT_FAMILY: &str = "Sans";

/// A font the exporter can hand to the subtitle renderer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFont {
    pub family: String,
    /// Font file, when one was located on disk
    pub file: Option<PathBuf>,
}

impl ResolvedFont {
    pub fn family_only(family: &str) -> Self {
        Self {
            family: family.to_string(),
            file: None,
        }
    }

    /// Directory to pass as a fonts directory to the renderer
    pub fn fonts_dir(&self) -> Option<&Path> {
        self.file.as_deref().and_then(Path::parent)
    }
}

/// Source of an overlay font
pub trait FontProvider: Send + Sync {
    fn name(&self) -> &str;

    fn resolve(&self) -> CoreResult<Option<ResolvedFont>>;
}

/// Looks for any of `file_names` in `search_dirs`
#[derive(Clone, Debug)]
pub struct FontFileProvider {
    family: String,
    file_names: Vec<String>,
    search_dirs: Vec<PathBuf>,
}

impl FontFileProvider {
    pub fn new(family: &str, file_names: &[&str], search_dirs: Vec<PathBuf>) -> Self {
        Self {
            family: family.to_string(),
            file_names: file_names.iter().map(|name| name.to_string()).collect(),
            search_dirs,
        }
    }
}

impl FontProvider for FontFileProvider {
    fn name(&self) -> &str {
        &self.family
    }

    fn resolve(&self) -> CoreResult<Option<ResolvedFont>> {
        let found = self
            .search_dirs
            .iter()
            .flat_map(|dir| self.file_names.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file());

        Ok(found.map(|file| ResolvedFont {
            family: self.family.clone(),
            file: Some(file),
        }))
    }
}

/// Generic family left to the renderer's own font matching
#[derive(Clone, Debug)]
pub struct GenericFontProvider {
    family: String,
}

impl GenericFontProvider {
    pub fn new(family: &str) -> Self {
        Self {
            family: family.to_string(),
        }
    }
}

impl Default for GenericFontProvider {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_FAMILY)
    }
}

impl FontProvider for GenericFontProvider {
    fn name(&self) -> &str {
        &self.family
    }

    fn resolve(&self) -> CoreResult<Option<ResolvedFont>> {
        Ok(Some(ResolvedFont::family_only(&self.family)))
    }
}

/// Ordered list of font providers
#[derive(Default)]
pub struct FontChain {
    providers: Vec<Box<dyn FontProvider>>,
}

impl FontChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl FontProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Arial, then SimHei for CJK text, then the generic family
    pub fn system() -> Self {
        let dirs = system_font_dirs();
        Self::new()
            .with(FontFileProvider::new(
                "Arial",
                &["arial.ttf", "Arial.ttf"],
                dirs.clone(),
            ))
            .with(FontFileProvider::new(
                "SimHei",
                &["simhei.ttf", "SimHei.ttf"],
                dirs,
            ))
            .with(GenericFontProvider::default())
    }

    /// Returns the first font any provider offers, or the generic family
    pub fn resolve(&self) -> ResolvedFont {
        for provider in &self.providers {
            match provider.resolve() {
                Ok(Some(font)) => {
                    debug!(provider = provider.name(), file = ?font.file, "Resolved font");
                    return font;
                }
                Ok(None) => continue,
                Err(err) => warn!(provider = provider.name(), "Font lookup failed: {}", err),
            }
        }
        ResolvedFont::family_only(DEFAULT_FONT_FAMILY)
    }
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts/Supplemental"));
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        dirs.push(PathBuf::from("/usr/share/fonts/truetype/msttcorefonts"));
        dirs.push(PathBuf::from("/usr/share/fonts/TTF"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
    }

    dirs
}
