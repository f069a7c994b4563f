//! Video capture via V4L2.
//!
//! [`CameraCapture::open`] claims `/dev/video{N}`, negotiates an MJPG format
//! at the configured resolution, and spawns a worker thread that decodes
//! each frame and publishes it into [`LiveFrames`].  The returned value is a
//! RAII guard — dropping it stops the worker and releases the device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use thiserror::Error;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

use crate::config::CameraConfig;

use super::frame::{LiveFrames, VideoFrame};

// ---------------------------------------------------------------------------
// CameraError
// ---------------------------------------------------------------------------

/// Errors that can occur while claiming the video device.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to open video device: {0}")]
    Open(std::io::Error),

    #[error("failed to negotiate capture format: {0}")]
    Format(std::io::Error),
}

// ---------------------------------------------------------------------------
// CameraCapture
// ---------------------------------------------------------------------------

/// V4L2 capture device wrapper.
///
/// The worker thread owns the mmap stream; decoded frames land in the
/// [`LiveFrames`] cell shared with the render loop and the capture pipeline.
/// The first successfully decoded frame flips the readiness flag — nothing
/// reads frame data before that.
pub struct CameraCapture {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    /// Negotiated capture width (the device may adjust the request).
    width: u32,
    /// Negotiated capture height.
    height: u32,
}

impl CameraCapture {
    /// Open the configured device and start streaming into `frames`.
    ///
    /// Device and format negotiation happen synchronously so permission and
    /// hardware failures surface here as [`CameraError`]; only the streaming
    /// loop runs on the worker thread.
    pub fn open(config: &CameraConfig, frames: LiveFrames) -> Result<Self, CameraError> {
        let device = Device::new(config.device_index).map_err(CameraError::Open)?;

        let mut format = device.format().map_err(CameraError::Format)?;
        format.width = config.width;
        format.height = config.height;
        format.fourcc = FourCC::new(b"MJPG");
        let format = device.set_format(&format).map_err(CameraError::Format)?;

        log::info!(
            "camera: /dev/video{} streaming {}x{} {}",
            config.device_index,
            format.width,
            format.height,
            format.fourcc
        );

        let stop = Arc::new(AtomicBool::new(false));
        let stop_worker = Arc::clone(&stop);

        let worker = std::thread::Builder::new()
            .name("camera-capture".into())
            .spawn(move || stream_loop(device, frames, stop_worker))
            .map_err(CameraError::Open)?;

        Ok(Self {
            stop,
            worker: Some(worker),
            width: format.width,
            height: format.height,
        })
    }

    /// Negotiated capture width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Negotiated capture height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            // The worker notices the flag after at most one frame interval.
            let _ = worker.join();
        }
        log::info!("camera: capture stopped");
    }
}

/// Worker loop: read MJPG buffers, decode to RGB8, publish the latest frame.
fn stream_loop(device: Device, frames: LiveFrames, stop: Arc<AtomicBool>) {
    let mut stream = match MmapStream::with_buffers(&device, Type::VideoCapture, 4) {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("camera: failed to map capture stream: {e}");
            return;
        }
    };

    while !stop.load(Ordering::Relaxed) {
        let (data, _meta) = match stream.next() {
            Ok(buf) => buf,
            Err(e) => {
                log::error!("camera: stream read failed: {e}");
                break;
            }
        };

        // Some drivers deliver a short or corrupt first buffer; skip and
        // wait for the next frame instead of tearing the display.
        match image::load_from_memory(data) {
            Ok(decoded) => {
                let rgb = decoded.to_rgb8();
                let (width, height) = rgb.dimensions();
                frames.publish(VideoFrame::from_rgb(width, height, rgb.into_raw()));
            }
            Err(e) => {
                log::debug!("camera: dropping undecodable frame: {e}");
            }
        }
    }
}
