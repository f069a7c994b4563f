//! Press-and-hold audio clip accumulation and WAV finalisation.
//!
//! A [`ClipAccumulator`] collects mono fragments between a press and a
//! release.  Fragments that arrive while no recording is active are dropped
//! at the accumulator, so the microphone stream can run continuously.
//! [`ClipAccumulator::finalize`] yields an [`AudioClip`] (possibly empty —
//! an instant release is legal) which encodes to a single 16-bit mono PCM
//! WAV blob for transmission.  Clips are never persisted.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use thiserror::Error;

// ---------------------------------------------------------------------------
// ClipError
// ---------------------------------------------------------------------------

/// Errors that can occur while encoding a clip.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("WAV encoding failed: {0}")]
    Encode(#[from] hound::Error),
}

// ---------------------------------------------------------------------------
// Downmix helper
// ---------------------------------------------------------------------------

/// Average interleaved multi-channel samples down to mono.
///
/// A mono input is returned unchanged.
pub fn downmix_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

// ---------------------------------------------------------------------------
// ClipAccumulator
// ---------------------------------------------------------------------------

/// Accumulates mono samples for the clip currently being recorded.
///
/// Shared between the microphone drain thread (writer) and the voice
/// pipeline (start/stop) via [`SharedClip`].  The active flag is flipped
/// under the same lock that guards the samples, so a fragment can never be
/// appended to a clip that has already been finalised.
pub struct ClipAccumulator {
    samples: Vec<f32>,
    sample_rate: u32,
    active: bool,
    /// Hard cap so a stuck press cannot grow the buffer without bound.
    max_samples: usize,
}

impl ClipAccumulator {
    pub fn new(sample_rate: u32, max_clip_secs: f32) -> Self {
        let max_samples = (sample_rate as f32 * max_clip_secs.max(1.0)) as usize;
        Self {
            samples: Vec::new(),
            sample_rate,
            active: false,
            max_samples,
        }
    }

    /// Start a fresh clip, discarding any leftovers from a previous one.
    pub fn begin(&mut self) {
        self.samples.clear();
        self.active = true;
    }

    /// Append a mono fragment; dropped when no recording is active or the
    /// clip has hit its length cap.
    pub fn push_fragment(&mut self, mono: &[f32]) {
        if !self.active {
            return;
        }
        let room = self.max_samples.saturating_sub(self.samples.len());
        let take = room.min(mono.len());
        self.samples.extend_from_slice(&mono[..take]);
    }

    /// Stop accumulating and hand the collected samples over as one clip.
    ///
    /// An empty clip is valid: releasing the control before the first
    /// fragment arrives must still produce a transmittable blob.
    pub fn finalize(&mut self) -> AudioClip {
        self.active = false;
        AudioClip {
            samples: std::mem::take(&mut self.samples),
            sample_rate: self.sample_rate,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Thread-safe handle to the clip accumulator.
pub type SharedClip = Arc<Mutex<ClipAccumulator>>;

/// Construct a new [`SharedClip`].
pub fn new_shared_clip(sample_rate: u32, max_clip_secs: f32) -> SharedClip {
    Arc::new(Mutex::new(ClipAccumulator::new(sample_rate, max_clip_secs)))
}

// ---------------------------------------------------------------------------
// AudioClip
// ---------------------------------------------------------------------------

/// One finalised press-hold recording, ready for encoding and transmission.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clip length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Encode as a 16-bit mono PCM WAV blob.
    ///
    /// A zero-sample clip encodes to a valid header-only WAV; the backend's
    /// rejection of it drives the user-facing guidance.
    pub fn encode_wav(&self) -> Result<Vec<u8>, ClipError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for &sample in &self.samples {
                let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer.write_sample(value)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_dropped_while_inactive() {
        let mut acc = ClipAccumulator::new(16_000, 30.0);
        acc.push_fragment(&[0.5; 100]);
        assert!(acc.finalize().is_empty());
    }

    #[test]
    fn fragments_accumulate_while_active() {
        let mut acc = ClipAccumulator::new(16_000, 30.0);
        acc.begin();
        acc.push_fragment(&[0.1; 100]);
        acc.push_fragment(&[0.2; 50]);

        let clip = acc.finalize();
        assert_eq!(clip.samples.len(), 150);
        assert!(!acc.is_active());
    }

    #[test]
    fn begin_discards_previous_leftovers() {
        let mut acc = ClipAccumulator::new(16_000, 30.0);
        acc.begin();
        acc.push_fragment(&[0.1; 100]);
        acc.begin();
        acc.push_fragment(&[0.2; 10]);
        assert_eq!(acc.finalize().samples.len(), 10);
    }

    #[test]
    fn length_cap_is_enforced() {
        // 1 s cap at 1 kHz → 1 000 samples max.
        let mut acc = ClipAccumulator::new(1_000, 1.0);
        acc.begin();
        acc.push_fragment(&[0.1; 1_500]);
        assert_eq!(acc.finalize().samples.len(), 1_000);
    }

    #[test]
    fn empty_clip_encodes_to_valid_wav() {
        let clip = AudioClip {
            samples: Vec::new(),
            sample_rate: 48_000,
        };
        let wav = clip.encode_wav().expect("encode");
        // RIFF header + fmt chunk are present even with no samples.
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }

    #[test]
    fn wav_data_length_matches_sample_count() {
        let clip = AudioClip {
            samples: vec![0.0; 256],
            sample_rate: 16_000,
        };
        let wav = clip.encode_wav().expect("encode");
        let empty = AudioClip {
            samples: Vec::new(),
            sample_rate: 16_000,
        }
        .encode_wav()
        .expect("encode");
        // 256 samples × 2 bytes of i16 payload beyond the bare header.
        assert_eq!(wav.len(), empty.len() + 512);
    }

    #[test]
    fn downmix_averages_stereo_pairs() {
        let mono = downmix_mono(&[1.0, 0.0, 0.5, 0.5], 2);
        assert_eq!(mono, vec![0.5, 0.5]);
    }

    #[test]
    fn downmix_passes_mono_through() {
        let mono = downmix_mono(&[0.25, -0.25], 1);
        assert_eq!(mono, vec![0.25, -0.25]);
    }

    #[test]
    fn duration_reflects_sample_rate() {
        let clip = AudioClip {
            samples: vec![0.0; 32_000],
            sample_rate: 16_000,
        };
        assert!((clip.duration_secs() - 2.0).abs() < f32::EPSILON);
    }
}
