//! Composition Pipeline
//!
//! Runs the whole chain for one request: segmentation and alignment on the
//! calling task, audio composition on a blocking worker, then assembly once
//! both are done.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::audio::{AudioSource, AudioTrack, AudioTrackComposer, CompositeAudioTrack, PcmBuffer};
use crate::core::captions::{AlignmentReport, TimestampSpan, TimingAligner};
use crate::core::render::{
    BackgroundChain, GeneratedProvider, ImageFileProvider, SolidColorProvider, VideoFileProvider,
};
use crate::core::settings::CompositionSettings;
use crate::core::timeline::{Background, Timeline, TimelineAssembler};
use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// Request / Output
// =============================================================================

/// Inputs of one composition
pub struct ComposeRequest {
    pub text: String,
    pub narration: Box<dyn AudioSource>,
    pub background_music: Option<Box<dyn AudioSource>>,
    /// External timing, in segment order
    pub spans: Vec<TimestampSpan>,
    /// Video laid under the overlays; tried before the image
    pub background_video: Option<PathBuf>,
    pub background_image: Option<PathBuf>,
    /// Draw a progress bar instead of a flat colour when there is no image
    pub progress_bar: bool,
    /// Defaults to the narration duration
    pub target_duration_sec: Option<TimeSec>,
    pub settings: CompositionSettings,
}

impl ComposeRequest {
    pub fn new(text: &str, narration: Box<dyn AudioSource>) -> Self {
        Self {
            text: text.to_string(),
            narration,
            background_music: None,
            spans: Vec::new(),
            background_video: None,
            background_image: None,
            progress_bar: false,
            target_duration_sec: None,
            settings: CompositionSettings::default(),
        }
    }

    pub fn with_background_music(mut self, source: Box<dyn AudioSource>) -> Self {
        self.background_music = Some(source);
        self
    }

    pub fn with_spans(mut self, spans: Vec<TimestampSpan>) -> Self {
        self.spans = spans;
        self
    }

    pub fn with_background_video(mut self, path: impl Into<PathBuf>) -> Self {
        self.background_video = Some(path.into());
        self
    }

    pub fn with_background_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.background_image = Some(path.into());
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled;
        self
    }

    pub fn with_target_duration(mut self, seconds: TimeSec) -> Self {
        self.target_duration_sec = Some(seconds);
        self
    }

    pub fn with_settings(mut self, settings: CompositionSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// How the overlays were timed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentStats {
    pub aligned_count: usize,
    pub fallback_count: usize,
    pub ignored_spans: usize,
}

impl From<&AlignmentReport> for AlignmentStats {
    fn from(report: &AlignmentReport) -> Self {
        Self {
            aligned_count: report.aligned_count,
            fallback_count: report.fallback_count,
            ignored_spans: report.ignored_spans,
        }
    }
}

/// Result of a composition
#[derive(Debug)]
pub struct ComposeOutput {
    pub timeline: Timeline,
    pub alignment: AlignmentStats,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Composes a timeline, running audio work on the blocking pool
pub async fn compose(request: ComposeRequest) -> CoreResult<ComposeOutput> {
    let prepared = prepare(request)?;
    let Prepared {
        text,
        spans,
        tracks,
        composer,
        background,
        settings,
        target,
        timeline_duration,
    } = prepared;

    let audio_task = tokio::task::spawn_blocking(move || composer.compose(tracks, target));

    let report = align_text(&settings, &text, &spans, timeline_duration);
    let background = background.resolve(settings.allow_substitution);

    // Join the audio task before surfacing text or background errors
    let audio = audio_task
        .await
        .map_err(|e| CoreError::Internal(format!("Audio composition task failed: {}", e)))??;

    finish(report?, background?, audio)
}

/// Same as [`compose`], entirely on the calling thread
pub fn compose_blocking(request: ComposeRequest) -> CoreResult<ComposeOutput> {
    let Prepared {
        text,
        spans,
        tracks,
        composer,
        background,
        settings,
        target,
        timeline_duration,
    } = prepare(request)?;

    let report = align_text(&settings, &text, &spans, timeline_duration)?;
    let background = background.resolve(settings.allow_substitution)?;
    let audio = composer.compose(tracks, target)?;

    finish(report, background, audio)
}

struct Prepared {
    text: String,
    spans: Vec<TimestampSpan>,
    tracks: Vec<AudioTrack>,
    composer: AudioTrackComposer,
    background: BackgroundChain,
    settings: CompositionSettings,
    target: TimeSec,
    /// Target rounded to whole samples, which is what the audio will measure
    timeline_duration: TimeSec,
}

fn prepare(request: ComposeRequest) -> CoreResult<Prepared> {
    let ComposeRequest {
        text,
        narration,
        background_music,
        spans,
        background_video,
        background_image,
        progress_bar,
        target_duration_sec,
        mut settings,
    } = request;

    settings.normalize();

    let target = match target_duration_sec {
        Some(seconds) => seconds,
        None => narration.duration_sec()?,
    };
    if !target.is_finite() || target <= 0.0 {
        return Err(CoreError::InvalidTimeRange(0.0, target));
    }

    let options = settings.compose_options();
    let frames = PcmBuffer::frames_for(target, options.sample_rate);
    if frames == 0 {
        return Err(CoreError::InvalidTimeRange(0.0, target));
    }
    let timeline_duration = frames as f64 / options.sample_rate as f64;

    let fade = settings.fade_duration_sec;
    let mut narration = AudioTrack::narration(narration).with_volume(settings.audio_volume as f32);
    if settings.fade_narration {
        narration = narration.with_fades(fade, fade);
    }
    let mut tracks = vec![narration];
    if let Some(bgm) = background_music {
        tracks.push(
            AudioTrack::background_music(bgm)
                .with_volume(settings.bgm_volume as f32)
                .with_fades(fade, fade),
        );
    }

    let mut background = BackgroundChain::new();
    if let Some(path) = background_video {
        background.push(Box::new(VideoFileProvider::new(path)));
    }
    if let Some(path) = background_image {
        background.push(Box::new(ImageFileProvider::new(path)));
    }
    if progress_bar {
        background.push(Box::new(GeneratedProvider::progress_bar()));
    }
    background.push(Box::new(SolidColorProvider::new(settings.background_color())));

    debug!(
        target,
        timeline_duration,
        tracks = tracks.len(),
        spans = spans.len(),
        "Prepared composition"
    );

    Ok(Prepared {
        text,
        spans,
        tracks,
        composer: AudioTrackComposer::new(options),
        background,
        settings,
        target,
        timeline_duration,
    })
}

fn align_text(
    settings: &CompositionSettings,
    text: &str,
    spans: &[TimestampSpan],
    total: TimeSec,
) -> CoreResult<AlignmentReport> {
    let segments = settings.segmenter().segment(text, settings.mode)?;
    TimingAligner::new().align_with_report(&segments, spans, total)
}

fn finish(
    report: AlignmentReport,
    background: Background,
    audio: CompositeAudioTrack,
) -> CoreResult<ComposeOutput> {
    let alignment = AlignmentStats::from(&report);
    let timeline = TimelineAssembler::new().assemble(background, report.segments, audio)?;

    info!(
        duration_sec = timeline.total_duration_sec(),
        overlays = timeline.overlays().len(),
        aligned = alignment.aligned_count,
        fallback = alignment.fallback_count,
        warnings = timeline.warnings().len(),
        "Composed timeline"
    );

    Ok(ComposeOutput {
        timeline,
        alignment,
    })
}
