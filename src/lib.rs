//! Clear Path — native client for the Clear Path guidance backend.
//!
//! Point the camera at a scene, name a target object (typed or spoken), and
//! receive continuously updated spatial guidance rendered as live on-screen
//! annotations.
//!
//! # Architecture
//!
//! ```text
//! MediaSession (camera + microphone, acquired once)
//!      │
//!      ├──▶ LiveFrames ──▶ render loop (egui, every frame)
//!      │         │
//!      │         └──▶ CapturePipeline ──▶ /api/process_frame
//!      │                     │
//!      └──▶ ClipAccumulator ─┴─▶ VoicePipeline ──▶ /api/set_target_from_audio
//!
//! AnnotationStore (publish-by-swap) ◀── pipelines write, render loop reads
//! GuidanceState  (Arc<Mutex<…>>)    ◀── target / guidance / busy flags
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod media;
pub mod overlay;
pub mod pipeline;
