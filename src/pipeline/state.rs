//! Shared guidance state and the voice-command state machine states.
//!
//! [`GuidanceState`] is the single source of truth for everything textual
//! the UI shows: current target, guidance line, and the two busy flags.
//! The pipelines mutate it; the render loop reads it every frame.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<GuidanceState>>` — cheap
//! to clone and safe to share across tasks.  Lock for a short critical
//! section; never hold the lock across an `.await` point.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Guidance strings
// ---------------------------------------------------------------------------

/// User-facing guidance strings, shared by the pipelines and startup code.
pub mod guidance_text {
    pub const INITIAL_TARGET: &str = "Initializing...";
    pub const INITIAL: &str = "Set a target to begin.";
    pub const ANALYZING: &str = "Analyzing...";
    pub const LISTENING: &str = "Listening...";
    pub const PROCESSING_VOICE: &str = "Processing voice...";
    pub const ANALYZE_FAILED: &str = "Error processing frame.";
    pub const VOICE_FAILED: &str = "Could not understand audio.";
    pub const CAMERA_DENIED: &str = "Error: Camera access denied.";

    /// Confirmation line after a successful target change.
    pub fn target_set(name: &str) -> String {
        format!("Target set to: {name}")
    }
}

// ---------------------------------------------------------------------------
// VoiceState
// ---------------------------------------------------------------------------

/// States of the press-and-hold voice command machine.
///
/// ```text
/// Idle ──press───▶ Recording ──release──▶ Transmitting ──response──▶ Idle
/// ```
///
/// Every transition is guarded by the current state, never by assuming the
/// paired press/release event will arrive: a release in `Idle` and a press
/// in `Recording` are both safe no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    /// Waiting for the user to press the voice control.
    #[default]
    Idle,
    /// The control is held; fragments are accumulating into the clip.
    Recording,
    /// The clip has been finalised and is on its way to the backend.
    Transmitting,
}

// ---------------------------------------------------------------------------
// GuidanceState
// ---------------------------------------------------------------------------

/// Shared application state — target, guidance line, and busy flags.
///
/// Invariants:
/// * `processing` is true only between a capture request being issued and
///   its response (success or failure) being applied.
/// * `recording` is true only between press and release/stop.
#[derive(Debug, Clone)]
pub struct GuidanceState {
    /// Name of the object the user currently wants located.
    pub target: String,
    /// Human-readable directional/proximity description shown to the user.
    pub guidance: String,
    /// A frame analysis is in flight; further captures are no-ops.
    pub processing: bool,
    /// A press-and-hold recording is active.
    pub recording: bool,
}

impl GuidanceState {
    pub fn new() -> Self {
        Self {
            target: guidance_text::INITIAL_TARGET.into(),
            guidance: guidance_text::INITIAL.into(),
            processing: false,
            recording: false,
        }
    }
}

impl Default for GuidanceState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`GuidanceState`].
pub type SharedState = Arc<Mutex<GuidanceState>>;

/// Construct a new [`SharedState`] wrapping a default [`GuidanceState`].
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(GuidanceState::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
