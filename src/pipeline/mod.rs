//! Pipelines — everything between a UI gesture and an updated screen.
//!
//! # Flow
//!
//! ```text
//!            UI thread                         tokio runtime
//!  ┌────────────────────────┐   commands   ┌──────────────────────────┐
//!  │ scan button ───────────┼─ Capture ───▶│ CapturePipeline          │
//!  │ mic press/release ─────┼─ Voice* ────▶│ VoicePipeline            │
//!  │ target text form ──────┼─ SetTarget ─▶│ typed-target handler     │
//!  └────────────────────────┘              └───────────┬──────────────┘
//!            ▲                                         │
//!            │   SharedState + AnnotationStore         ▼
//!            └───────────────── reads ◀────────────── writes
//! ```
//!
//! All three paths converge on the same [`SharedState`] and
//! [`AnnotationStore`](crate::overlay::AnnotationStore); concurrent
//! responses resolve last-writer-wins.

pub mod capture;
pub mod runner;
pub mod state;
pub mod voice;

pub use capture::CapturePipeline;
pub use runner::{command_channel, CommandSender, PipelineCommand, PipelineRunner};
pub use state::{guidance_text, new_shared_state, GuidanceState, SharedState, VoiceState};
pub use voice::VoicePipeline;
