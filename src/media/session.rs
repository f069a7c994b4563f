//! The live camera + microphone session.
//!
//! [`MediaSession::acquire`] claims both devices together, wires the camera
//! worker into the shared frame cell and the microphone drain thread into
//! the shared clip accumulator, and returns one owned handle.  The session
//! is created once at startup and never re-acquired; dropping it releases
//! both devices.

use std::sync::mpsc;

use thiserror::Error;

use crate::config::AppConfig;

use super::camera::{CameraCapture, CameraError};
use super::clip::{downmix_mono, new_shared_clip, SharedClip};
use super::frame::LiveFrames;
use super::microphone::{AudioFragment, MicCapture, MicError, MicStreamHandle};

// ---------------------------------------------------------------------------
// DeviceAccessError
// ---------------------------------------------------------------------------

/// Camera or microphone could not be claimed.
///
/// Fatal to capture and voice features; the caller surfaces a guidance
/// message and leaves the system idle.  No automatic retry is attempted.
#[derive(Debug, Error)]
pub enum DeviceAccessError {
    #[error("camera access denied: {0}")]
    Camera(#[from] CameraError),

    #[error("microphone access denied: {0}")]
    Microphone(#[from] MicError),
}

// ---------------------------------------------------------------------------
// MediaSession
// ---------------------------------------------------------------------------

/// One owned handle to the live camera + microphone stream.
///
/// The render loop and the capture pipeline read frames through
/// [`frames`](Self::frames); the voice pipeline reads audio through
/// [`clip`](Self::clip).  The two consumers use disjoint tracks of the
/// session, so they never conflict.
pub struct MediaSession {
    frames: LiveFrames,
    clip: SharedClip,
    /// Owns the camera worker; dropped last-writer when the session ends.
    _camera: CameraCapture,
    /// Keeps the cpal stream alive for the whole session.
    _mic_stream: MicStreamHandle,
}

impl MediaSession {
    /// Request combined video + audio access from the host.
    ///
    /// On success the camera worker starts publishing frames immediately;
    /// the session reports ready only once the first frame has decoded.
    /// On denial or hardware failure returns [`DeviceAccessError`] and
    /// claims nothing.
    pub fn acquire(config: &AppConfig) -> Result<Self, DeviceAccessError> {
        let frames = LiveFrames::new();
        let camera = CameraCapture::open(&config.camera, frames.clone())?;

        let mic = MicCapture::new(config.audio.input_device.as_deref())?;
        let clip = new_shared_clip(mic.sample_rate(), config.audio.max_clip_secs);

        let (fragment_tx, fragment_rx) = mpsc::channel::<AudioFragment>();
        let mic_stream = mic.start(fragment_tx)?;

        log::info!(
            "media: session ready pending first frame ({} Hz, {} ch mic)",
            mic.sample_rate(),
            mic.channels()
        );

        // Drain thread: downmix fragments and feed the clip accumulator.
        // The accumulator itself drops fragments while no recording is
        // active, so this runs for the whole session.
        {
            let clip = SharedClip::clone(&clip);
            std::thread::Builder::new()
                .name("mic-drain".into())
                .spawn(move || {
                    while let Ok(fragment) = fragment_rx.recv() {
                        let mono = downmix_mono(&fragment.samples, fragment.channels);
                        clip.lock().unwrap().push_fragment(&mono);
                    }
                })
                .expect("failed to spawn mic-drain thread");
        }

        Ok(Self {
            frames,
            clip,
            _camera: camera,
            _mic_stream: mic_stream,
        })
    }

    /// Shared latest-frame cell (render loop + capture pipeline).
    pub fn frames(&self) -> LiveFrames {
        self.frames.clone()
    }

    /// Shared clip accumulator (voice pipeline + mic drain thread).
    pub fn clip(&self) -> SharedClip {
        SharedClip::clone(&self.clip)
    }
}
