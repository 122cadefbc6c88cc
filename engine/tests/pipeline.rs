//! End-to-end composition through the public API, with the exporter stubbed.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use narrareel_lib::core::audio::WavFileSource;
use narrareel_lib::core::captions::{export_srt, load_spans, parse_srt_spans};
use narrareel_lib::core::pipeline::{compose, ComposeRequest};
use narrareel_lib::core::render::{ExportReport, Exporter};
use narrareel_lib::core::settings::CompositionSettings;
use narrareel_lib::core::timeline::{Background, Timeline};
use narrareel_lib::core::{CoreError, CoreResult};

/// Records what it was asked to export and writes the overlays as SRT
#[derive(Default)]
struct RecordingExporter {
    exported: Mutex<Vec<(PathBuf, f64, usize)>>,
}

#[async_trait]
impl Exporter for RecordingExporter {
    fn name(&self) -> &str {
        "recording"
    }

    async fn export(&self, timeline: &Timeline, output: &Path) -> CoreResult<ExportReport> {
        let srt = export_srt(timeline.overlays());
        tokio::fs::write(output, &srt).await?;

        self.exported
            .lock()
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .push((
                output.to_path_buf(),
                timeline.total_duration_sec(),
                timeline.overlays().len(),
            ));

        Ok(ExportReport {
            output_path: output.to_path_buf(),
            duration_sec: timeline.total_duration_sec(),
            file_size: srt.len() as u64,
            encoding_time_sec: 0.0,
        })
    }
}

fn write_tone(path: &Path, seconds: f64, rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = (seconds * rate as f64).round() as usize;
    for i in 0..frames {
        let t = i as f64 / rate as f64;
        let sample = (t * 440.0 * std::f64::consts::TAU).sin() * 0.25;
        writer.write_sample((sample * i16::MAX as f64) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn fast_settings() -> CompositionSettings {
    let mut settings = CompositionSettings::default();
    settings.export.sample_rate = 22050;
    settings.export.channels = 1;
    settings
}

#[tokio::test]
async fn test_wav_inputs_to_exported_overlays() {
    let temp = TempDir::new().unwrap();
    let narration = temp.path().join("voice.wav");
    let music = temp.path().join("bgm.wav");
    write_tone(&narration, 8.0, 22050);
    write_tone(&music, 3.0, 22050);

    let spans_path = temp.path().join("voice.srt");
    std::fs::write(
        &spans_path,
        "1\n00:00:00,000 --> 00:00:02,000\nFirst.\n\n2\n00:00:02,000 --> 00:00:03,500\nSecond.\n",
    )
    .unwrap();
    let spans = load_spans(&spans_path).unwrap();

    let request = ComposeRequest::new(
        "First. Second. Third sentence here. Fourth!",
        Box::new(WavFileSource::new(&narration)),
    )
    .with_background_music(Box::new(WavFileSource::new(&music)))
    .with_spans(spans)
    .with_settings(fast_settings());

    let output = compose(request).await.unwrap();
    let timeline = &output.timeline;

    assert_eq!(timeline.total_duration_sec(), 8.0);
    assert_eq!(timeline.overlays().len(), 4);
    assert_eq!(output.alignment.aligned_count, 2);
    assert_eq!(output.alignment.fallback_count, 2);
    assert_eq!(timeline.overlays()[2].start_sec, 3.5);
    assert_eq!(timeline.overlays()[3].end_sec, 8.0);
    assert!(matches!(timeline.background(), Background::SolidColor { .. }));

    let exporter = RecordingExporter::default();
    let video = temp.path().join("out").join("video.srt");
    std::fs::create_dir_all(video.parent().unwrap()).unwrap();
    let report = exporter.export(timeline, &video).await.unwrap();
    assert_eq!(report.duration_sec, 8.0);

    let written = std::fs::read_to_string(&video).unwrap();
    let reparsed = parse_srt_spans(&written).unwrap();
    assert_eq!(reparsed.len(), 4);
    assert_eq!(reparsed[3].text, "Fourth!");
    assert!((reparsed[3].end_sec - 8.0).abs() < 0.001);

    let exported = exporter.exported.lock().unwrap();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].2, 4);
}

#[tokio::test]
async fn test_composite_audio_written_as_wav() {
    let temp = TempDir::new().unwrap();
    let narration = temp.path().join("voice.wav");
    write_tone(&narration, 2.0, 22050);

    let request = ComposeRequest::new("Only one line", Box::new(WavFileSource::new(&narration)))
        .with_target_duration(5.0)
        .with_settings(fast_settings());
    let output = compose(request).await.unwrap();

    assert_eq!(output.timeline.overlays().len(), 1);
    assert_eq!(output.timeline.overlays()[0].start_sec, 0.0);
    assert_eq!(output.timeline.overlays()[0].end_sec, 5.0);

    let wav = temp.path().join("mix.wav");
    output.timeline.audio().write_wav(&wav).unwrap();

    let reader = hound::WavReader::open(&wav).unwrap();
    assert_eq!(reader.spec().sample_rate, 22050);
    assert_eq!(reader.duration(), 5 * 22050);
}

#[tokio::test]
async fn test_timeline_description_serializes() {
    let temp = TempDir::new().unwrap();
    let narration = temp.path().join("voice.wav");
    write_tone(&narration, 3.0, 22050);

    let request = ComposeRequest::new("A. B. C.", Box::new(WavFileSource::new(&narration)))
        .with_progress_bar(true)
        .with_settings(fast_settings());
    let output = compose(request).await.unwrap();

    let json = serde_json::to_value(output.timeline.describe()).unwrap();
    assert_eq!(json["overlays"].as_array().unwrap().len(), 3);
    assert_eq!(json["background"]["type"], "generated");
    assert_eq!(json["audio"]["tracks"][0]["role"], "narration");
    assert_eq!(json["audio"]["tracks"][0]["decision"]["kind"], "unchanged");
}
