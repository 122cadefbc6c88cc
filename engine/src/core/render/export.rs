//! Video Export
//!
//! Hands an assembled [`Timeline`] to an external renderer. The FFmpeg
//! exporter writes the composite audio to a temporary WAV and the overlays to
//! a temporary SRT, then encodes background + subtitles + audio in one pass.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::fonts::{FontChain, ResolvedFont};
use crate::core::captions::export_srt;
use crate::core::ffmpeg::FFmpegRunner;
use crate::core::settings::ExportSettings;
use crate::core::timeline::{Background, GeneratedStyle, Timeline};
use crate::core::{CoreError, CoreResult, TimeSec};

/// libass lays out SRT subtitles on a script this many units tall
const SUBTITLE_PLAY_RES_Y: u32 = 288;

/// Outline width of overlay text, in script units
const SUBTITLE_OUTLINE: u32 = 2;

// =============================================================================
// Exporter Trait
// =============================================================================

/// Result of a finished export
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub output_path: PathBuf,
    pub duration_sec: TimeSec,
    pub file_size: u64,
    pub encoding_time_sec: f64,
}

/// Renders a timeline to a file
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Returns the exporter name used in logs
    fn name(&self) -> &str;

    async fn export(&self, timeline: &Timeline, output: &Path) -> CoreResult<ExportReport>;
}

// =============================================================================
// FFmpeg Exporter
// =============================================================================

/// Exports through an FFmpeg child process
#[derive(Debug, Clone)]
pub struct FFmpegExporter {
    runner: FFmpegRunner,
    settings: ExportSettings,
    font: ResolvedFont,
}

impl FFmpegExporter {
    /// Creates an exporter using the first system font found
    pub fn new(runner: FFmpegRunner, settings: ExportSettings) -> Self {
        Self {
            runner,
            settings,
            font: FontChain::system().resolve(),
        }
    }

    pub fn with_font(mut self, font: ResolvedFont) -> Self {
        self.font = font;
        self
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }
}

#[async_trait]
impl Exporter for FFmpegExporter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn export(&self, timeline: &Timeline, output: &Path) -> CoreResult<ExportReport> {
        let started = Instant::now();

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let work_dir = tempfile::Builder::new().prefix("narrareel-").tempdir()?;
        let audio_path = work_dir.path().join("audio.wav");
        let subtitles_path = work_dir.path().join("overlays.srt");

        let audio = timeline.audio().clone();
        let wav_path = audio_path.clone();
        tokio::task::spawn_blocking(move || audio.write_wav(&wav_path))
            .await
            .map_err(|e| CoreError::Internal(format!("WAV writer task failed: {}", e)))??;

        let has_overlays = !timeline.overlays().is_empty();
        if has_overlays {
            tokio::fs::write(&subtitles_path, export_srt(timeline.overlays())).await?;
        }

        let args = build_export_args(&ExportInputs {
            background: timeline.background(),
            duration_sec: timeline.total_duration_sec(),
            audio_path: &audio_path,
            subtitles_path: has_overlays.then_some(subtitles_path.as_path()),
            output,
            settings: &self.settings,
            font: &self.font,
        });

        info!(
            output = %output.display(),
            overlays = timeline.overlays().len(),
            duration_sec = timeline.total_duration_sec(),
            "Exporting video"
        );
        self.runner.run(&args).await?;

        let file_size = tokio::fs::metadata(output)
            .await
            .map_err(|_| {
                CoreError::ExternalToolFailure(format!(
                    "FFmpeg exited successfully but {} was not written",
                    output.display()
                ))
            })?
            .len();

        let report = ExportReport {
            output_path: output.to_path_buf(),
            duration_sec: timeline.total_duration_sec(),
            file_size,
            encoding_time_sec: started.elapsed().as_secs_f64(),
        };
        info!(
            output = %report.output_path.display(),
            file_size = report.file_size,
            encoding_time_sec = report.encoding_time_sec,
            "Export complete"
        );
        Ok(report)
    }
}

// =============================================================================
// Argument Building
// =============================================================================

/// Everything one ffmpeg invocation needs
#[derive(Debug, Clone, Copy)]
pub struct ExportInputs<'a> {
    pub background: &'a Background,
    pub duration_sec: TimeSec,
    pub audio_path: &'a Path,
    /// `None` when there are no overlays
    pub subtitles_path: Option<&'a Path>,
    pub output: &'a Path,
    pub settings: &'a ExportSettings,
    pub font: &'a ResolvedFont,
}

/// Builds the ffmpeg argument list for one export
pub fn build_export_args(inputs: &ExportInputs<'_>) -> Vec<String> {
    let settings = inputs.settings;
    let (w, h, fps) = (settings.width, settings.height, settings.fps);
    let duration = format!("{:.3}", inputs.duration_sec);

    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into(), "-loglevel".into(), "error".into()];
    let mut filters = Vec::new();

    // Input 0: background video
    match inputs.background {
        Background::Image { path } => {
            args.extend([
                "-loop".into(),
                "1".into(),
                "-framerate".into(),
                fps.to_string(),
                "-i".into(),
                path.to_string_lossy().to_string(),
            ]);
            filters.push(fit_frame_filter(w, h));
        }
        Background::Video { path } => {
            args.extend([
                "-stream_loop".into(),
                "-1".into(),
                "-i".into(),
                path.to_string_lossy().to_string(),
            ]);
            filters.push(fit_frame_filter(w, h));
        }
        Background::SolidColor { color } => {
            args.extend(lavfi_color_input(&color.to_ffmpeg(), w, h, fps, &duration));
        }
        Background::Generated {
            style: GeneratedStyle::ProgressBar { base, bar },
        } => {
            args.extend(lavfi_color_input(&base.to_ffmpeg(), w, h, fps, &duration));
            filters.push(format!(
                "drawbox=x=iw*0.1:y=ih-100:w='iw*0.8*t/{duration}':h=10:color={}:t=fill",
                bar.to_ffmpeg()
            ));
        }
    }

    // Input 1: composite audio
    args.extend(["-i".into(), inputs.audio_path.to_string_lossy().to_string()]);

    if let Some(subtitles) = inputs.subtitles_path {
        filters.push(subtitles_filter(subtitles, inputs.font, settings.font_size, h));
    }

    if !filters.is_empty() {
        args.extend(["-vf".into(), filters.join(",")]);
    }

    args.extend([
        "-map".into(),
        "0:v".into(),
        "-map".into(),
        "1:a".into(),
        "-c:v".into(),
        settings.video_codec.clone(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-r".into(),
        fps.to_string(),
        "-c:a".into(),
        settings.audio_codec.clone(),
        "-b:a".into(),
        "192k".into(),
        "-t".into(),
        duration,
        "-shortest".into(),
        inputs.output.to_string_lossy().to_string(),
    ]);

    args
}

/// Letterboxes any input into a `w`x`h` frame
fn fit_frame_filter(w: u32, h: u32) -> String {
    format!("scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1")
}

fn lavfi_color_input(color: &str, w: u32, h: u32, fps: u32, duration: &str) -> [String; 4] {
    [
        "-f".into(),
        "lavfi".into(),
        "-i".into(),
        format!("color=c={color}:s={w}x{h}:r={fps}:d={duration}"),
    ]
}

/// `subtitles=` filter with white, black-outlined text centred at the bottom
fn subtitles_filter(path: &Path, font: &ResolvedFont, font_size: u32, height: u32) -> String {
    let mut filter = format!("subtitles=filename='{}'", escape_filter_path(path));
    if let Some(dir) = font.fonts_dir() {
        filter.push_str(&format!(":fontsdir='{}'", escape_filter_path(dir)));
    }
    filter.push_str(&format!(
        ":force_style='FontName={},FontSize={},PrimaryColour=&H00FFFFFF,OutlineColour=&H00000000,BorderStyle=1,Outline={},Alignment=2'",
        font.family,
        ass_font_size(font_size, height),
        SUBTITLE_OUTLINE
    ));
    filter
}

/// Converts a pixel font size at `height` to libass script units
pub fn ass_font_size(font_size: u32, height: u32) -> u32 {
    if height == 0 {
        return font_size;
    }
    let scaled = (font_size as f64 * SUBTITLE_PLAY_RES_Y as f64 / height as f64).round() as u32;
    scaled.max(1)
}

/// Escapes a path for use inside a quoted filter option
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}
