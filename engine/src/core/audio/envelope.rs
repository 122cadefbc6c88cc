//! Linear Fade Envelopes

use super::PcmBuffer;
use crate::core::TimeSec;

/// Linear fade-in / fade-out over a track of fixed length.
///
/// When the two ramps together would be longer than the track, each ramp is
/// clipped to half the track and [`FadeEnvelope::is_clipped`] reports it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeEnvelope {
    fade_in_sec: TimeSec,
    fade_out_sec: TimeSec,
    total_sec: TimeSec,
    clipped: bool,
}

impl FadeEnvelope {
    pub fn new(fade_in_sec: TimeSec, fade_out_sec: TimeSec, total_sec: TimeSec) -> Self {
        let total_sec = total_sec.max(0.0);
        let mut fade_in_sec = fade_in_sec.max(0.0);
        let mut fade_out_sec = fade_out_sec.max(0.0);
        let mut clipped = false;

        if fade_in_sec + fade_out_sec > total_sec {
            let half = total_sec / 2.0;
            clipped = fade_in_sec > half || fade_out_sec > half;
            fade_in_sec = fade_in_sec.min(half);
            fade_out_sec = fade_out_sec.min(half);
        }

        Self {
            fade_in_sec,
            fade_out_sec,
            total_sec,
            clipped,
        }
    }

    pub fn fade_in_sec(&self) -> TimeSec {
        self.fade_in_sec
    }

    pub fn fade_out_sec(&self) -> TimeSec {
        self.fade_out_sec
    }

    /// True when a requested ramp had to be shortened
    pub fn is_clipped(&self) -> bool {
        self.clipped
    }

    pub fn is_flat(&self) -> bool {
        self.fade_in_sec == 0.0 && self.fade_out_sec == 0.0
    }

    /// Gain at time `t`: 0 at `t = 0` rising to 1 at `t = fade_in`, and 1 at
    /// `t = total - fade_out` falling to 0 at `t = total`
    pub fn gain_at(&self, t: TimeSec) -> f32 {
        let rising = if self.fade_in_sec > 0.0 {
            (t / self.fade_in_sec).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let falling = if self.fade_out_sec > 0.0 {
            ((self.total_sec - t) / self.fade_out_sec).clamp(0.0, 1.0)
        } else {
            1.0
        };
        rising.min(falling) as f32
    }

    /// Applies the envelope to every channel of `buffer`.
    ///
    /// In the sample domain the ramps are mirrored: the first frame has gain 0
    /// and so does the last. The tail ramp is anchored on the last frame, so
    /// full gain holds up to frame `total - 1 - fade_out_frames`, one frame
    /// before `t = total - fade_out` would put it.
    pub fn apply(&self, buffer: &mut PcmBuffer) {
        if self.is_flat() || buffer.is_empty() {
            return;
        }

        let rate = buffer.sample_rate();
        let channels = buffer.channels() as usize;
        let total_frames = buffer.frames();
        let in_frames = PcmBuffer::frames_for(self.fade_in_sec, rate);
        let out_frames = PcmBuffer::frames_for(self.fade_out_sec, rate);

        for (frame, samples) in buffer.samples_mut().chunks_exact_mut(channels).enumerate() {
            let gain = frame_gain(frame, total_frames, in_frames, out_frames);
            if gain < 1.0 {
                for sample in samples {
                    *sample *= gain;
                }
            }
        }
    }
}

fn frame_gain(frame: usize, total_frames: usize, in_frames: usize, out_frames: usize) -> f32 {
    let rising = if frame < in_frames {
        frame as f32 / in_frames as f32
    } else {
        1.0
    };
    let from_end = total_frames - 1 - frame;
    let falling = if from_end < out_frames {
        from_end as f32 / out_frames as f32
    } else {
        1.0
    };
    rising.min(falling)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(rate: u32, channels: u16, frames: usize) -> PcmBuffer {
        PcmBuffer::new(rate, channels, vec![1.0; frames * channels as usize]).unwrap()
    }

    // -------------------------------------------------------------------------
    // Continuous Gain
    // -------------------------------------------------------------------------

    #[test]
    fn test_fade_boundary_values() {
        let envelope = FadeEnvelope::new(1.0, 2.0, 10.0);

        assert_eq!(envelope.gain_at(0.0), 0.0);
        assert_eq!(envelope.gain_at(0.5), 0.5);
        assert_eq!(envelope.gain_at(1.0), 1.0);
        assert_eq!(envelope.gain_at(5.0), 1.0);
        assert_eq!(envelope.gain_at(8.0), 1.0);
        assert_eq!(envelope.gain_at(9.0), 0.5);
        assert_eq!(envelope.gain_at(10.0), 0.0);
        assert!(!envelope.is_clipped());
    }

    #[test]
    fn test_no_fades_is_flat() {
        let envelope = FadeEnvelope::new(0.0, 0.0, 3.0);
        assert!(envelope.is_flat());
        assert_eq!(envelope.gain_at(0.0), 1.0);
        assert_eq!(envelope.gain_at(3.0), 1.0);
    }

    #[test]
    fn test_overlong_fades_clip_to_half() {
        let envelope = FadeEnvelope::new(3.0, 3.0, 4.0);
        assert!(envelope.is_clipped());
        assert_eq!(envelope.fade_in_sec(), 2.0);
        assert_eq!(envelope.fade_out_sec(), 2.0);

        assert_eq!(envelope.gain_at(0.0), 0.0);
        assert_eq!(envelope.gain_at(2.0), 1.0);
        assert_eq!(envelope.gain_at(4.0), 0.0);
    }

    #[test]
    fn test_only_overlong_ramp_is_clipped() {
        let envelope = FadeEnvelope::new(0.5, 5.0, 4.0);
        assert!(envelope.is_clipped());
        assert_eq!(envelope.fade_in_sec(), 0.5);
        assert_eq!(envelope.fade_out_sec(), 2.0);
    }

    #[test]
    fn test_negative_fades_are_ignored() {
        let envelope = FadeEnvelope::new(-1.0, -1.0, 4.0);
        assert!(envelope.is_flat());
    }

    // -------------------------------------------------------------------------
    // Sample Domain
    // -------------------------------------------------------------------------

    #[test]
    fn test_apply_ramps_first_and_last_frames() {
        let mut buffer = ones(100, 2, 1000);
        FadeEnvelope::new(1.0, 1.0, 10.0).apply(&mut buffer);

        let samples = buffer.samples();
        // First frame, both channels
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 0.0);
        // Halfway up the fade-in
        assert_eq!(samples[50 * 2], 0.5);
        // End of the fade-in
        assert_eq!(samples[100 * 2], 1.0);
        // Middle
        assert_eq!(samples[500 * 2], 1.0);
        // Last frame
        assert_eq!(samples[999 * 2], 0.0);
        assert_eq!(samples[999 * 2 + 1], 0.0);
        // Symmetric with the head
        assert_eq!(samples[(999 - 50) * 2], 0.5);
    }

    #[test]
    fn test_tail_ramp_starts_from_last_frame() {
        let mut buffer = ones(100, 1, 1000);
        FadeEnvelope::new(0.0, 1.0, 10.0).apply(&mut buffer);

        let samples = buffer.samples();
        assert_eq!(samples[899], 1.0);
        assert_eq!(samples[900], 0.99);
        assert_eq!(samples[999], 0.0);
    }

    #[test]
    fn test_apply_flat_envelope_is_noop() {
        let mut buffer = ones(100, 1, 50);
        FadeEnvelope::new(0.0, 0.0, 0.5).apply(&mut buffer);
        assert!(buffer.samples().iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_apply_is_monotonic_in_ramps() {
        let mut buffer = ones(1000, 1, 3000);
        FadeEnvelope::new(1.0, 1.0, 3.0).apply(&mut buffer);
        let samples = buffer.samples();

        for pair in samples[..1000].windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        for pair in samples[2000..].windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }
}
