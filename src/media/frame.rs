//! Decoded video frames and the shared latest-frame cell.
//!
//! The camera worker publishes each decoded frame into [`LiveFrames`]; the
//! render loop and the capture pipeline read whatever frame is currently
//! published.  Like the annotation store, publication is a single `Arc`
//! swap — readers never see a partially written frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

// ---------------------------------------------------------------------------
// FrameError
// ---------------------------------------------------------------------------

/// Errors that can occur while encoding a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

// ---------------------------------------------------------------------------
// VideoFrame
// ---------------------------------------------------------------------------

/// One decoded RGB8 frame in source-native resolution.
///
/// `pixels` is tightly packed row-major RGB (`width * height * 3` bytes).
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    /// Wrap decoded RGB8 data.
    ///
    /// # Panics
    ///
    /// Panics when `pixels.len() != width * height * 3` — the camera worker
    /// always hands over exactly-sized buffers.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height * 3) as usize,
            "RGB8 pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Encode this frame as a JPEG blob for the analyze request.
    pub fn encode_jpeg(&self) -> Result<Vec<u8>, FrameError> {
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new(&mut buf);
        encoder.encode(
            &self.pixels,
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(buf)
    }
}

// ---------------------------------------------------------------------------
// FrameProvider
// ---------------------------------------------------------------------------

/// Read side of the latest-frame cell.
///
/// Implemented by [`LiveFrames`] for the real camera and mocked in the
/// pipeline tests.
pub trait FrameProvider: Send + Sync {
    /// The most recently published frame, if any has been decoded yet.
    fn latest_frame(&self) -> Option<Arc<VideoFrame>>;

    /// `true` once at least one frame has been decoded and published.
    ///
    /// No component may snapshot or paint frame data before this is true.
    fn is_ready(&self) -> bool;
}

// ---------------------------------------------------------------------------
// LiveFrames
// ---------------------------------------------------------------------------

/// Shared cell holding the most recent decoded camera frame.
///
/// Cheap to clone; the camera worker writes, the render loop and capture
/// pipeline read.
#[derive(Clone)]
pub struct LiveFrames {
    inner: Arc<LiveFramesInner>,
}

struct LiveFramesInner {
    frame: Mutex<Option<Arc<VideoFrame>>>,
    ready: AtomicBool,
}

impl LiveFrames {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LiveFramesInner {
                frame: Mutex::new(None),
                ready: AtomicBool::new(false),
            }),
        }
    }

    /// Publish a newly decoded frame and mark the source ready.
    pub fn publish(&self, frame: VideoFrame) {
        *self.inner.frame.lock().unwrap() = Some(Arc::new(frame));
        self.inner.ready.store(true, Ordering::Release);
    }
}

impl Default for LiveFrames {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameProvider for LiveFrames {
    fn latest_frame(&self) -> Option<Arc<VideoFrame>> {
        self.inner.frame.lock().unwrap().clone()
    }

    fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
