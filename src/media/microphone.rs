//! Microphone capture via `cpal`.
//!
//! [`MicCapture`] wraps the cpal host/device/stream lifecycle.  Call
//! [`MicCapture::start`] to begin streaming [`AudioFragment`]s over an mpsc
//! channel.  The returned [`MicStreamHandle`] is a RAII guard — dropping it
//! stops the underlying cpal stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioFragment
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the cpal callback.
///
/// Samples are interleaved `f32` in the range `[-1.0, 1.0]`.  Fragments are
/// accumulated into an `AudioClip` only while a press-and-hold recording is
/// active (see [`crate::media::ClipAccumulator`]).
#[derive(Debug, Clone)]
pub struct AudioFragment {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of this fragment in Hz (e.g. 44100, 48000).
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono, 2 = stereo, …).
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// MicStreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the underlying hardware stream.
pub struct MicStreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// MicError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or running the microphone capture.
#[derive(Debug, Error)]
pub enum MicError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device {0:?} not found")]
    NamedDeviceMissing(String),

    #[error("failed to enumerate input devices: {0}")]
    Enumerate(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// MicCapture
// ---------------------------------------------------------------------------

/// Microphone capture device wrapper built on top of `cpal`.
pub struct MicCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    sample_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
}

impl MicCapture {
    /// Create a new [`MicCapture`].
    ///
    /// `device_name` selects a specific input device by name; `None` uses
    /// the system default.  The device's preferred stream configuration
    /// (sample rate, channels, buffer size) is used unchanged — the backend
    /// accepts device-rate WAV, so no resampling is needed.
    pub fn new(device_name: Option<&str>) -> Result<Self, MicError> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().is_ok_and(|n| n == name))
                .ok_or_else(|| MicError::NamedDeviceMissing(name.to_string()))?,
            None => host.default_input_device().ok_or(MicError::NoDevice)?,
        };

        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start recording and send [`AudioFragment`]s to `tx`.
    ///
    /// The cpal callback runs on a dedicated audio thread; each time the
    /// hardware delivers a buffer the raw `f32` samples are wrapped in an
    /// [`AudioFragment`] and forwarded over the channel.  Send errors
    /// (receiver dropped) are silently ignored so the audio thread never
    /// panics.
    pub fn start(&self, tx: mpsc::Sender<AudioFragment>) -> Result<MicStreamHandle, MicError> {
        let sample_rate = self.sample_rate;
        let channels = self.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let fragment = AudioFragment {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                };
                // Ignore send errors; the receiver may have been dropped.
                let _ = tx.send(fragment);
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(MicStreamHandle { _stream: stream })
    }

    /// Native sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels in each [`AudioFragment`].
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
