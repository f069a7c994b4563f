//! Pipeline command loop — the bridge between the UI thread and the async
//! pipelines.
//!
//! The UI never awaits: it pushes a [`PipelineCommand`] onto an unbounded
//! channel and carries on rendering.  [`PipelineRunner::run`] lives on the
//! tokio runtime, dispatches each command, and spawns the long-running
//! round trips so the loop stays responsive to further commands (a voice
//! release must not wait behind a slow frame analysis).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::GuidanceApi;
use crate::media::{FrameProvider, SharedClip};
use crate::overlay::AnnotationStore;

use super::capture::CapturePipeline;
use super::state::{guidance_text, SharedState};
use super::voice::VoicePipeline;

// ---------------------------------------------------------------------------
// PipelineCommand
// ---------------------------------------------------------------------------

/// Commands the UI sends to the pipeline loop.
#[derive(Debug)]
pub enum PipelineCommand {
    /// Snapshot the live frame and request analysis.
    Capture,
    /// The voice control was pressed; start recording.
    VoicePressed,
    /// The voice control was released; finalise and transmit the clip.
    VoiceReleased,
    /// A target name was typed and submitted.
    SetTarget(String),
}

/// Sending half handed to the UI.
pub type CommandSender = mpsc::UnboundedSender<PipelineCommand>;

/// Create the command channel.
pub fn command_channel() -> (CommandSender, mpsc::UnboundedReceiver<PipelineCommand>) {
    mpsc::unbounded_channel()
}

// ---------------------------------------------------------------------------
// PipelineRunner
// ---------------------------------------------------------------------------

/// Owns the pipelines and dispatches UI commands to them.
///
/// The media-backed pipelines are optional: when camera or microphone
/// access was denied at startup the runner still serves typed-target
/// commands, and capture/voice commands degrade to no-ops.
pub struct PipelineRunner {
    state: SharedState,
    annotations: AnnotationStore,
    api: Arc<dyn GuidanceApi>,
    capture: Option<Arc<CapturePipeline>>,
    voice: Option<Arc<VoicePipeline>>,
    inflight: Vec<JoinHandle<()>>,
}

impl PipelineRunner {
    /// Runner without media devices (typed targets only).
    pub fn new(state: SharedState, annotations: AnnotationStore, api: Arc<dyn GuidanceApi>) -> Self {
        Self {
            state,
            annotations,
            api,
            capture: None,
            voice: None,
            inflight: Vec::new(),
        }
    }

    /// Attach the capture and voice pipelines backed by a live media session.
    pub fn with_media(mut self, frames: Arc<dyn FrameProvider>, clip: SharedClip) -> Self {
        self.capture = Some(Arc::new(CapturePipeline::new(
            Arc::clone(&self.state),
            self.annotations.clone(),
            frames,
            Arc::clone(&self.api),
        )));
        self.voice = Some(Arc::new(VoicePipeline::new(
            Arc::clone(&self.state),
            self.annotations.clone(),
            clip,
            Arc::clone(&self.api),
        )));
        self
    }

    /// Consume commands until every sender is dropped, then drain the
    /// spawned round trips so their state updates land before return.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PipelineCommand>) {
        while let Some(cmd) = rx.recv().await {
            self.inflight.retain(|handle| !handle.is_finished());
            self.dispatch(cmd);
        }
        log::debug!("pipeline: command channel closed, draining");
        for handle in self.inflight.drain(..) {
            let _ = handle.await;
        }
    }

    fn dispatch(&mut self, cmd: PipelineCommand) {
        match cmd {
            PipelineCommand::Capture => {
                let Some(capture) = &self.capture else {
                    log::debug!("pipeline: capture requested without media session");
                    return;
                };
                let capture = Arc::clone(capture);
                self.inflight
                    .push(tokio::spawn(async move { capture.capture_and_analyze().await }));
            }
            PipelineCommand::VoicePressed => {
                // Press is synchronous: recording must start before the
                // next audio fragment arrives, not a scheduler turn later.
                if let Some(voice) = &self.voice {
                    voice.start_recording();
                }
            }
            PipelineCommand::VoiceReleased => {
                let Some(voice) = &self.voice else {
                    return;
                };
                let voice = Arc::clone(voice);
                self.inflight
                    .push(tokio::spawn(async move { voice.stop_and_send().await }));
            }
            PipelineCommand::SetTarget(name) => {
                if let Some(handle) = self.submit_target(&name) {
                    self.inflight.push(handle);
                }
            }
        }
    }

    /// Typed-target channel.
    ///
    /// The target takes effect locally at once: state and guidance update
    /// and the stale annotations are cleared before the backend is told.
    /// The confirmation request runs in the background and a failure is
    /// only logged; the local change stands.
    fn submit_target(&self, name: &str) -> Option<JoinHandle<()>> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let name = name.to_string();

        {
            let mut st = self.state.lock().unwrap();
            st.target = name.clone();
            st.guidance = guidance_text::target_set(&name);
        }
        self.annotations.clear();
        log::info!("pipeline: target set to {name:?}");

        let api = Arc::clone(&self.api);
        Some(tokio::spawn(async move {
            if let Err(e) = api.set_target_text(&name).await {
                log::warn!("pipeline: target confirmation failed: {e}");
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::AnalyzeResponse;
    use crate::api::MockGuidanceApi;
    use crate::media::{new_shared_clip, LiveFrames, VideoFrame};
    use crate::overlay::{AnnotationSnapshot, BoundingBox, DetectionBox};
    use crate::pipeline::state::new_shared_state;
    use std::sync::atomic::Ordering;

    fn stale_snapshot() -> AnnotationSnapshot {
        AnnotationSnapshot::new(vec![DetectionBox {
            label: "old".into(),
            confidence: 0.5,
            relative_direction: String::new(),
            distance_estimate: String::new(),
            bounds: BoundingBox {
                x_min: 0,
                y_min: 0,
                x_max: 1,
                y_max: 1,
            },
        }])
    }

    fn make_runner(api: Arc<MockGuidanceApi>) -> (PipelineRunner, SharedState, AnnotationStore) {
        let state = new_shared_state();
        let annotations = AnnotationStore::new();
        let runner = PipelineRunner::new(Arc::clone(&state), annotations.clone(), api);
        (runner, state, annotations)
    }

    /// Typed target: local state updates, annotations clear, and the backend
    /// confirmation goes out once.
    #[tokio::test]
    async fn typed_target_updates_state_and_clears_annotations() {
        let api = Arc::new(MockGuidanceApi::acknowledging());
        let (runner, state, annotations) = make_runner(Arc::clone(&api));
        annotations.replace(stale_snapshot());

        let (tx, rx) = command_channel();
        tx.send(PipelineCommand::SetTarget("door".into())).unwrap();
        drop(tx);
        runner.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.target, "door");
        assert_eq!(st.guidance, "Target set to: door");
        assert!(annotations.current().is_empty());
        assert_eq!(api.text_calls.load(Ordering::SeqCst), 1);
    }

    /// Whitespace-only input is rejected before any state change.
    #[tokio::test]
    async fn blank_target_is_a_no_op() {
        let api = Arc::new(MockGuidanceApi::acknowledging());
        let (runner, state, annotations) = make_runner(Arc::clone(&api));
        annotations.replace(stale_snapshot());

        let (tx, rx) = command_channel();
        tx.send(PipelineCommand::SetTarget("   ".into())).unwrap();
        tx.send(PipelineCommand::SetTarget(String::new())).unwrap();
        drop(tx);
        runner.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.target, "Initializing...");
        assert_eq!(annotations.current().len(), 1);
        assert_eq!(api.text_calls.load(Ordering::SeqCst), 0);
    }

    /// Surrounding whitespace is trimmed from the submitted name.
    #[tokio::test]
    async fn typed_target_is_trimmed() {
        let api = Arc::new(MockGuidanceApi::acknowledging());
        let (runner, state, _annotations) = make_runner(Arc::clone(&api));

        let (tx, rx) = command_channel();
        tx.send(PipelineCommand::SetTarget("  stairs  ".into())).unwrap();
        drop(tx);
        runner.run(rx).await;

        assert_eq!(state.lock().unwrap().target, "stairs");
    }

    /// A failed confirmation is logged but the local target stands.
    #[tokio::test]
    async fn failed_confirmation_keeps_local_target() {
        let api = Arc::new(MockGuidanceApi::failing());
        let (runner, state, _annotations) = make_runner(Arc::clone(&api));

        let (tx, rx) = command_channel();
        tx.send(PipelineCommand::SetTarget("exit".into())).unwrap();
        drop(tx);
        runner.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.target, "exit");
        assert_eq!(st.guidance, "Target set to: exit");
        assert_eq!(api.text_calls.load(Ordering::SeqCst), 1);
    }

    /// Capture and voice commands without a media session are ignored.
    #[tokio::test]
    async fn media_commands_without_session_are_ignored() {
        let api = Arc::new(MockGuidanceApi::failing());
        let (runner, state, _annotations) = make_runner(Arc::clone(&api));

        let (tx, rx) = command_channel();
        tx.send(PipelineCommand::Capture).unwrap();
        tx.send(PipelineCommand::VoicePressed).unwrap();
        tx.send(PipelineCommand::VoiceReleased).unwrap();
        drop(tx);
        runner.run(rx).await;

        assert_eq!(api.analyze_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.audio_calls.load(Ordering::SeqCst), 0);
        assert!(!state.lock().unwrap().processing);
    }

    /// Capture command through the loop drives a full analysis round trip.
    #[tokio::test]
    async fn capture_command_runs_analysis() {
        let resp: AnalyzeResponse = serde_json::from_str(
            r#"{"status":"ok","guidance_text":"cup to your left","target":"cup"}"#,
        )
        .unwrap();
        let api = Arc::new(MockGuidanceApi::analyzing(resp));

        let frames = LiveFrames::new();
        frames.publish(VideoFrame::from_rgb(4, 4, vec![0; 4 * 4 * 3]));
        let clip = new_shared_clip(16_000, 30.0);

        let state = new_shared_state();
        let annotations = AnnotationStore::new();
        let runner =
            PipelineRunner::new(Arc::clone(&state), annotations.clone(), Arc::clone(&api) as _)
                .with_media(Arc::new(frames), clip);

        let (tx, rx) = command_channel();
        tx.send(PipelineCommand::Capture).unwrap();
        drop(tx);
        runner.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.target, "cup");
        assert_eq!(st.guidance, "cup to your left");
        assert!(!st.processing);
        assert_eq!(api.analyze_calls.load(Ordering::SeqCst), 1);
    }

    /// Press + release through the loop drives a full voice round trip.
    #[tokio::test]
    async fn voice_commands_run_full_round_trip() {
        let api = Arc::new(MockGuidanceApi::recognising("bench"));

        let frames = LiveFrames::new();
        let clip = new_shared_clip(16_000, 30.0);

        let state = new_shared_state();
        let annotations = AnnotationStore::new();
        annotations.replace(stale_snapshot());
        let runner =
            PipelineRunner::new(Arc::clone(&state), annotations.clone(), Arc::clone(&api) as _)
                .with_media(Arc::new(frames), SharedClip::clone(&clip));

        let (tx, rx) = command_channel();
        tx.send(PipelineCommand::VoicePressed).unwrap();
        tx.send(PipelineCommand::VoiceReleased).unwrap();
        drop(tx);
        runner.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.target, "bench");
        assert_eq!(st.guidance, "Target set to: bench");
        assert!(!st.recording);
        assert!(annotations.current().is_empty());
        assert_eq!(api.audio_calls.load(Ordering::SeqCst), 1);
    }
}
