mod logging;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use narrareel_lib::core::assets::scan_media_dir;
use narrareel_lib::core::audio::WavFileSource;
use narrareel_lib::core::captions::{load_spans, SegmentationMode};
use narrareel_lib::core::ffmpeg::{detect_ffmpeg, FFmpegRunner};
use narrareel_lib::core::pipeline::{compose, AlignmentStats, ComposeRequest};
use narrareel_lib::core::render::{ExportReport, Exporter, FFmpegExporter};
use narrareel_lib::core::settings::{load_settings, CompositionSettings};
use narrareel_lib::core::timeline::{Timeline, TimelineDescription};

#[derive(Debug, Parser)]
#[command(name = "narrareel")]
#[command(about = "Compose narrated text videos from text, narration and music")]
#[command(version)]
struct Cli {
    /// Also write daily-rolling logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build a timeline (and optionally a video) from text and audio
    Compose(ComposeArgs),
    /// Print the overlay segments of a text file
    Segment(SegmentArgs),
    /// Classify the media files in a directory
    Scan {
        dir: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ComposeArgs {
    /// Text file with the narration script
    #[arg(long)]
    text: PathBuf,

    /// Narration WAV file
    #[arg(long)]
    narration: PathBuf,

    /// Background music WAV file
    #[arg(long)]
    bgm: Option<PathBuf>,

    /// Timestamp spans (.srt or whisper .json)
    #[arg(long)]
    spans: Option<PathBuf>,

    /// Background image
    #[arg(long)]
    background: Option<PathBuf>,

    /// Background video, looped under the overlays (tried before --background)
    #[arg(long)]
    background_video: Option<PathBuf>,

    /// Draw a progress bar background when no image is used
    #[arg(long)]
    progress_bar: bool,

    /// Timeline duration in seconds (defaults to the narration length)
    #[arg(long)]
    duration: Option<f64>,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: SettingsOverrides,

    /// Write the timeline JSON here instead of stdout
    #[arg(long)]
    timeline: Option<PathBuf>,

    /// Write the composite audio as WAV
    #[arg(long)]
    audio_out: Option<PathBuf>,

    /// Render the video with FFmpeg to this path
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Explicit ffmpeg binary
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Give up on the export after this many seconds
    #[arg(long)]
    export_timeout: Option<u64>,
}

#[derive(Debug, Args)]
struct SettingsOverrides {
    /// disjoint | progressive
    #[arg(long)]
    mode: Option<SegmentationMode>,

    /// Also split on commas
    #[arg(long, overrides_with = "no_comma_aware")]
    comma_aware: bool,

    /// Split on sentence punctuation only, even if the config enables commas
    #[arg(long, overrides_with = "comma_aware")]
    no_comma_aware: bool,

    /// Fall back to narration-only audio / a solid background when optional inputs fail
    #[arg(long, overrides_with = "no_allow_substitution")]
    allow_substitution: bool,

    /// Fail on unavailable optional inputs, even if the config allows substitution
    #[arg(long, overrides_with = "allow_substitution")]
    no_allow_substitution: bool,

    /// Leave the narration unfaded
    #[arg(long)]
    no_fade_narration: bool,

    #[arg(long)]
    audio_volume: Option<f64>,

    #[arg(long)]
    bgm_volume: Option<f64>,

    /// Fade-in and fade-out length in seconds, for the music and the narration
    #[arg(long)]
    fade: Option<f64>,
}

impl SettingsOverrides {
    fn apply(&self, settings: &mut CompositionSettings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(enabled) = switch(self.comma_aware, self.no_comma_aware) {
            settings.comma_aware = enabled;
        }
        if let Some(enabled) = switch(self.allow_substitution, self.no_allow_substitution) {
            settings.allow_substitution = enabled;
        }
        if self.no_fade_narration {
            settings.fade_narration = false;
        }
        if let Some(volume) = self.audio_volume {
            settings.audio_volume = volume;
        }
        if let Some(volume) = self.bgm_volume {
            settings.bgm_volume = volume;
        }
        if let Some(fade) = self.fade {
            settings.fade_duration_sec = fade;
        }
        settings.normalize();
    }
}

/// Resolves a `--flag` / `--no-flag` pair; `None` keeps the configured value
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Debug, Args)]
struct SegmentArgs {
    /// Text file to segment
    text: PathBuf,

    #[arg(long, default_value = "disjoint")]
    mode: SegmentationMode,

    #[arg(long)]
    comma_aware: bool,

    /// Print a JSON array instead of one segment per line
    #[arg(long)]
    json: bool,
}

/// What `compose` prints
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ComposeSummary {
    timeline: TimelineDescription,
    alignment: AlignmentStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<ExportReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_dir.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Compose(args) => run_compose(args).await,
        Commands::Segment(args) => run_segment(&args),
        Commands::Scan { dir } => run_scan(&dir),
    }
}

async fn run_compose(args: ComposeArgs) -> Result<()> {
    let mut settings = match &args.config {
        Some(path) => load_settings(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => CompositionSettings::default(),
    };
    args.overrides.apply(&mut settings);

    let text = std::fs::read_to_string(&args.text)
        .with_context(|| format!("reading text from {}", args.text.display()))?;

    let spans = match &args.spans {
        Some(path) => {
            load_spans(path).with_context(|| format!("loading spans from {}", path.display()))?
        }
        None => Vec::new(),
    };

    let mut request = ComposeRequest::new(&text, Box::new(WavFileSource::new(&args.narration)))
        .with_spans(spans)
        .with_progress_bar(args.progress_bar)
        .with_settings(settings.clone());
    if let Some(bgm) = &args.bgm {
        request = request.with_background_music(Box::new(WavFileSource::new(bgm)));
    }
    if let Some(video) = &args.background_video {
        request = request.with_background_video(video);
    }
    if let Some(image) = &args.background {
        request = request.with_background_image(image);
    }
    if let Some(duration) = args.duration {
        request = request.with_target_duration(duration);
    }

    let output = compose(request).await.context("composing timeline")?;

    if let Some(path) = &args.audio_out {
        output
            .timeline
            .audio()
            .write_wav(path)
            .with_context(|| format!("writing composite audio to {}", path.display()))?;
        info!(path = %path.display(), "Wrote composite audio");
    }

    let export = match &args.output {
        Some(path) => Some(run_export(&args, &settings, &output.timeline, path).await?),
        None => None,
    };

    let summary = ComposeSummary {
        timeline: output.timeline.describe(),
        alignment: output.alignment,
        export,
    };
    let json = serde_json::to_string_pretty(&summary)?;

    match &args.timeline {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing timeline to {}", path.display()))?;
            info!(path = %path.display(), "Wrote timeline");
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn run_export(
    args: &ComposeArgs,
    settings: &CompositionSettings,
    timeline: &Timeline,
    output: &Path,
) -> Result<ExportReport> {
    let info = detect_ffmpeg(args.ffmpeg.as_deref()).context("locating ffmpeg")?;
    let exporter = FFmpegExporter::new(FFmpegRunner::new(info), settings.export.clone());
    let export = exporter.export(timeline, output);

    let report = match args.export_timeout {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), export).await {
            Ok(result) => result,
            Err(_) => bail!("export did not finish within {} seconds", secs),
        },
        None => export.await,
    }
    .with_context(|| format!("exporting video to {}", output.display()))?;

    Ok(report)
}

fn run_segment(args: &SegmentArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.text)
        .with_context(|| format!("reading text from {}", args.text.display()))?;

    let settings = CompositionSettings {
        comma_aware: args.comma_aware,
        ..Default::default()
    };
    let segments = settings.segmenter().segment(&text, args.mode)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
    } else {
        for segment in &segments {
            println!("{}", segment);
        }
    }
    Ok(())
}

fn run_scan(dir: &Path) -> Result<()> {
    let inventory = scan_media_dir(dir)?;
    if inventory.is_empty() {
        bail!("no media files found in {}", dir.display());
    }
    println!("{}", serde_json::to_string_pretty(&inventory)?);
    Ok(())
}
