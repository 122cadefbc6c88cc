//! Audio Sources and PCM Buffers
//!
//! An [`AudioSource`] reports its natural duration and decodes to a
//! [`PcmBuffer`] of interleaved `f32` samples in `[-1.0, 1.0]`.
//! WAV files are decoded with hound; in-memory buffers back generated audio
//! and tests.

use std::path::{Path, PathBuf};

use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// PCM Buffer
// =============================================================================

/// Interleaved `f32` audio
#[derive(Clone, Debug, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl PcmBuffer {
    /// Creates a buffer, validating the layout
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> CoreResult<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidAudioFormat(
                "Sample rate must be positive".to_string(),
            ));
        }
        if channels == 0 {
            return Err(CoreError::InvalidAudioFormat(
                "Channel count must be positive".to_string(),
            ));
        }
        if samples.len() % channels as usize != 0 {
            return Err(CoreError::InvalidAudioFormat(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// Creates `frames` frames of silence
    pub fn silence(sample_rate: u32, channels: u16, frames: usize) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
            samples: vec![0.0; frames * channels.max(1) as usize],
        }
    }

    /// Number of frames needed to cover `duration_sec` at `sample_rate`
    pub fn frames_for(duration_sec: TimeSec, sample_rate: u32) -> usize {
        (duration_sec.max(0.0) * sample_rate as f64).round() as usize
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_sec(&self) -> TimeSec {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Keeps only the first `frames` frames
    pub fn truncate_frames(&mut self, frames: usize) {
        self.samples.truncate(frames * self.channels as usize);
    }

    /// Repeats the whole buffer back to back `count` times
    pub fn repeat(&mut self, count: usize) {
        self.samples = self.samples.repeat(count);
    }

    /// Multiplies every sample by `gain`
    pub fn scale(&mut self, gain: f32) {
        if gain == 1.0 {
            return;
        }
        for sample in &mut self.samples {
            *sample *= gain;
        }
    }

    /// Converts to the given rate and channel layout
    pub fn to_layout(self, sample_rate: u32, channels: u16) -> PcmBuffer {
        self.remix(channels).resample(sample_rate)
    }

    fn remix(self, channels: u16) -> PcmBuffer {
        if channels == self.channels || channels == 0 {
            return self;
        }

        let in_ch = self.channels as usize;
        let out_ch = channels as usize;
        let mut samples = Vec::with_capacity(self.frames() * out_ch);

        for frame in self.samples.chunks_exact(in_ch) {
            if out_ch == 1 {
                samples.push(frame.iter().sum::<f32>() / in_ch as f32);
            } else {
                samples.extend((0..out_ch).map(|k| frame[k % in_ch]));
            }
        }

        PcmBuffer {
            sample_rate: self.sample_rate,
            channels,
            samples,
        }
    }

    /// Linear interpolation resampler
    fn resample(self, sample_rate: u32) -> PcmBuffer {
        if sample_rate == self.sample_rate || sample_rate == 0 || self.is_empty() {
            return PcmBuffer {
                sample_rate: if sample_rate == 0 { self.sample_rate } else { sample_rate },
                ..self
            };
        }

        let ch = self.channels as usize;
        let in_frames = self.frames();
        let ratio = self.sample_rate as f64 / sample_rate as f64;
        let out_frames = ((in_frames as f64) / ratio).round() as usize;
        let mut samples = Vec::with_capacity(out_frames * ch);

        for j in 0..out_frames {
            let pos = j as f64 * ratio;
            let i0 = (pos.floor() as usize).min(in_frames - 1);
            let i1 = (i0 + 1).min(in_frames - 1);
            let frac = (pos - i0 as f64) as f32;
            for c in 0..ch {
                let a = self.samples[i0 * ch + c];
                let b = self.samples[i1 * ch + c];
                samples.push(a + (b - a) * frac);
            }
        }

        PcmBuffer {
            sample_rate,
            channels: self.channels,
            samples,
        }
    }

    /// Writes the buffer as 16-bit PCM WAV, clamping to `[-1.0, 1.0]`
    pub fn write_wav(&self, path: &Path) -> CoreResult<()> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let wav_err = |e: hound::Error| match e {
            hound::Error::IoError(io) => CoreError::IoError(io),
            other => CoreError::InvalidAudioFormat(other.to_string()),
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(wav_err)?;
        for &sample in &self.samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            writer.write_sample(value).map_err(wav_err)?;
        }
        writer.finalize().map_err(wav_err)?;
        Ok(())
    }
}

// =============================================================================
// Audio Source Trait
// =============================================================================

/// Something that can be decoded into PCM
pub trait AudioSource: Send {
    /// Human-readable reference used in logs and errors
    fn describe(&self) -> String;

    /// Natural duration without decoding the whole source
    fn duration_sec(&self) -> CoreResult<TimeSec>;

    /// Decodes the whole source
    fn load(&self) -> CoreResult<PcmBuffer>;
}

// =============================================================================
// WAV File Source
// =============================================================================

/// WAV file decoded with hound (8/16/24/32-bit int, 32-bit float)
#[derive(Clone, Debug)]
pub struct WavFileSource {
    path: PathBuf,
}

impl WavFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> CoreResult<hound::WavReader<std::io::BufReader<std::fs::File>>> {
        hound::WavReader::open(&self.path).map_err(|e| CoreError::audio_load(self.describe(), e))
    }
}

impl AudioSource for WavFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn duration_sec(&self) -> CoreResult<TimeSec> {
        let reader = self.open()?;
        let spec = reader.spec();
        Ok(reader.duration() as f64 / spec.sample_rate as f64)
    }

    fn load(&self) -> CoreResult<PcmBuffer> {
        let reader = self.open()?;
        let spec = reader.spec();
        let load_err = |e: hound::Error| CoreError::audio_load(self.describe(), e);

        let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(load_err)?,
            (hound::SampleFormat::Int, 8) => reader
                .into_samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect::<Result<_, _>>()
                .map_err(load_err)?,
            (hound::SampleFormat::Int, 16) => reader
                .into_samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<Result<_, _>>()
                .map_err(load_err)?,
            (hound::SampleFormat::Int, 24) => reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8_388_608.0))
                .collect::<Result<_, _>>()
                .map_err(load_err)?,
            (hound::SampleFormat::Int, 32) => reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2_147_483_648.0))
                .collect::<Result<_, _>>()
                .map_err(load_err)?,
            (format, bits) => {
                return Err(CoreError::audio_load(
                    self.describe(),
                    format!("unsupported sample format {:?} at {} bits", format, bits),
                ))
            }
        };

        PcmBuffer::new(spec.sample_rate, spec.channels, samples)
            .map_err(|e| CoreError::audio_load(self.describe(), e))
    }
}

// =============================================================================
// In-Memory Source
// =============================================================================

/// Already decoded audio
#[derive(Clone, Debug)]
pub struct MemorySource {
    label: String,
    buffer: PcmBuffer,
}

impl MemorySource {
    pub fn new(label: &str, buffer: PcmBuffer) -> Self {
        Self {
            label: label.to_string(),
            buffer,
        }
    }
}

impl AudioSource for MemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn duration_sec(&self) -> CoreResult<TimeSec> {
        Ok(self.buffer.duration_sec())
    }

    fn load(&self) -> CoreResult<PcmBuffer> {
        Ok(self.buffer.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
