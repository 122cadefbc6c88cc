//! Media Directory Scanner
//!
//! Scans one directory level for media files and groups them by kind.
//! Audio whose file name mentions background music is kept apart from
//! narration candidates.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::core::{CoreError, CoreResult};

/// File name fragments that mark an audio file as background music
const MUSIC_NAME_TOKENS: &[&str] = &["bgm", "background", "music"];

/// Kind of a discovered media file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Video,
    /// Narration candidate
    Audio,
    BackgroundMusic,
    Image,
    Unknown,
}

fn media_kind_from_extension(ext: &str) -> MediaKind {
    match ext.to_lowercase().as_str() {
        "mp4" | "mov" | "avi" | "mkv" | "webm" | "m4v" => MediaKind::Video,
        "mp3" | "wav" | "aac" | "ogg" | "flac" | "m4a" => MediaKind::Audio,
        "jpg" | "jpeg" | "png" | "bmp" | "webp" => MediaKind::Image,
        _ => MediaKind::Unknown,
    }
}

/// Classifies a path by extension, then by music-name tokens for audio
pub fn classify_media_path(path: &Path) -> MediaKind {
    let kind = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(media_kind_from_extension)
        .unwrap_or(MediaKind::Unknown);

    if kind != MediaKind::Audio {
        return kind;
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if MUSIC_NAME_TOKENS.iter().any(|token| name.contains(token)) {
        MediaKind::BackgroundMusic
    } else {
        MediaKind::Audio
    }
}

/// Media files found in one directory, each list sorted by path
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInventory {
    pub video: Vec<PathBuf>,
    pub audio: Vec<PathBuf>,
    pub background_music: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
}

impl MediaInventory {
    pub fn is_empty(&self) -> bool {
        self.video.is_empty()
            && self.audio.is_empty()
            && self.background_music.is_empty()
            && self.images.is_empty()
    }

    /// The only narration candidate, if there is exactly one
    pub fn single_audio(&self) -> Option<&Path> {
        match self.audio.as_slice() {
            [only] => Some(only.as_path()),
            _ => None,
        }
    }

    /// The only background music candidate, if there is exactly one
    pub fn single_background_music(&self) -> Option<&Path> {
        match self.background_music.as_slice() {
            [only] => Some(only.as_path()),
            _ => None,
        }
    }

    fn push(&mut self, kind: MediaKind, path: PathBuf) {
        match kind {
            MediaKind::Video => self.video.push(path),
            MediaKind::Audio => self.audio.push(path),
            MediaKind::BackgroundMusic => self.background_music.push(path),
            MediaKind::Image => self.images.push(path),
            MediaKind::Unknown => {}
        }
    }
}

/// Scans the top level of `dir` (no recursion) and groups media by kind
pub fn scan_media_dir(dir: &Path) -> CoreResult<MediaInventory> {
    if !dir.is_dir() {
        return Err(CoreError::NotFound(format!(
            "Media directory not found: {}",
            dir.display()
        )));
    }

    let mut inventory = MediaInventory::default();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable entry during scan");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let kind = classify_media_path(entry.path());
        inventory.push(kind, entry.into_path());
    }

    tracing::debug!(
        video = inventory.video.len(),
        audio = inventory.audio.len(),
        background_music = inventory.background_music.len(),
        images = inventory.images.len(),
        "Scanned media directory"
    );

    Ok(inventory)
}
