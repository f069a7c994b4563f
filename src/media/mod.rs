//! Media source — the live camera + microphone session.
//!
//! # Pipeline
//!
//! ```text
//! /dev/videoN → camera worker → decode JPEG → LiveFrames (latest frame)
//!                                                ├─▶ render loop (every tick)
//!                                                └─▶ capture pipeline (on demand)
//!
//! microphone → cpal callback → AudioFragment (mpsc) → downmix_mono
//!            → ClipAccumulator (only while recording) → AudioClip → WAV
//! ```
//!
//! [`MediaSession::acquire`] claims both devices once at startup; readiness
//! is signalled by the first decoded frame, and nothing reads frame data
//! before that.

pub mod camera;
pub mod clip;
pub mod frame;
pub mod microphone;
pub mod session;

pub use camera::{CameraCapture, CameraError};
pub use clip::{downmix_mono, new_shared_clip, AudioClip, ClipAccumulator, ClipError, SharedClip};
pub use frame::{FrameError, FrameProvider, LiveFrames, VideoFrame};
pub use microphone::{AudioFragment, MicCapture, MicError, MicStreamHandle};
pub use session::{DeviceAccessError, MediaSession};
