//! Voice command pipeline — press-and-hold recording state machine.
//!
//! ```text
//! Idle ──press───▶ Recording ──release──▶ Transmitting ──response──▶ Idle
//! ```
//!
//! Transitions are guarded by the current state under a lock taken in the
//! synchronous section of each handler, so an unmatched release (touch
//! cancel, double release) or a duplicate press is always a safe no-op.

use std::sync::{Arc, Mutex};

use crate::api::GuidanceApi;
use crate::media::SharedClip;
use crate::overlay::AnnotationStore;

use super::state::{guidance_text, SharedState, VoiceState};

// ---------------------------------------------------------------------------
// VoicePipeline
// ---------------------------------------------------------------------------

/// Records audio while the voice control is held and ships the clip to the
/// command-extraction endpoint on release.
pub struct VoicePipeline {
    state: SharedState,
    annotations: AnnotationStore,
    clip: SharedClip,
    api: Arc<dyn GuidanceApi>,
    voice: Mutex<VoiceState>,
}

impl VoicePipeline {
    pub fn new(
        state: SharedState,
        annotations: AnnotationStore,
        clip: SharedClip,
        api: Arc<dyn GuidanceApi>,
    ) -> Self {
        Self {
            state,
            annotations,
            clip,
            api,
            voice: Mutex::new(VoiceState::Idle),
        }
    }

    /// Current state of the machine (used by tests and the UI).
    pub fn voice_state(&self) -> VoiceState {
        *self.voice.lock().unwrap()
    }

    /// Press handler: `Idle → Recording`.
    ///
    /// Starts a fresh clip accumulator bound to the session's audio track.
    /// A press while already recording or transmitting is a no-op.
    pub fn start_recording(&self) {
        {
            let mut vs = self.voice.lock().unwrap();
            if *vs != VoiceState::Idle {
                log::debug!("voice: press ignored in state {:?}", *vs);
                return;
            }
            *vs = VoiceState::Recording;
        }

        self.clip.lock().unwrap().begin();

        let mut st = self.state.lock().unwrap();
        st.recording = true;
        st.guidance = guidance_text::LISTENING.into();
        log::debug!("voice: recording started");
    }

    /// Release handler: `Recording → Transmitting → Idle`.
    ///
    /// Finalises the clip (possibly empty — the backend's rejection then
    /// drives the guidance), transmits it, and applies the response.  A
    /// release with no active recording is a no-op.
    pub async fn stop_and_send(&self) {
        // Synchronous guard section, same discipline as the capture flag:
        // the transition happens before any suspension point.
        {
            let mut vs = self.voice.lock().unwrap();
            if *vs != VoiceState::Recording {
                log::debug!("voice: release ignored in state {:?}", *vs);
                return;
            }
            *vs = VoiceState::Transmitting;
        }

        let clip = self.clip.lock().unwrap().finalize();
        log::debug!("voice: clip finalised ({:.2}s)", clip.duration_secs());

        {
            let mut st = self.state.lock().unwrap();
            st.recording = false;
            st.guidance = guidance_text::PROCESSING_VOICE.into();
        }

        let encoded = tokio::task::spawn_blocking(move || clip.encode_wav()).await;
        let wav = match encoded {
            Ok(Ok(wav)) => wav,
            Ok(Err(e)) => {
                log::warn!("voice: WAV encoding failed: {e}");
                self.finish(guidance_text::VOICE_FAILED.into());
                return;
            }
            Err(e) => {
                log::warn!("voice: encode task panicked: {e}");
                self.finish(guidance_text::VOICE_FAILED.into());
                return;
            }
        };

        match self.api.set_target_from_audio(wav).await {
            Ok(resp) => match resp.recognised_target() {
                Some(target) => {
                    let target = target.to_string();
                    {
                        let mut st = self.state.lock().unwrap();
                        st.target = target.clone();
                        st.guidance = guidance_text::target_set(&target);
                    }
                    // A new target invalidates prior detections: they
                    // located the old target, not this one.
                    self.annotations.clear();
                    *self.voice.lock().unwrap() = VoiceState::Idle;
                    log::info!("voice: target set to {target:?}");
                }
                None => {
                    log::debug!("voice: no target recognised");
                    self.finish(guidance_text::VOICE_FAILED.into());
                }
            },
            Err(e) => {
                log::warn!("voice: command extraction failed: {e}");
                self.finish(guidance_text::VOICE_FAILED.into());
            }
        }
    }

    /// Return to `Idle` with a guidance message (failure paths).
    fn finish(&self, guidance: String) {
        self.state.lock().unwrap().guidance = guidance;
        *self.voice.lock().unwrap() = VoiceState::Idle;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockGuidanceApi;
    use crate::media::new_shared_clip;
    use crate::overlay::{AnnotationSnapshot, BoundingBox, DetectionBox};
    use crate::pipeline::state::new_shared_state;
    use std::sync::atomic::Ordering;

    fn make_pipeline(
        api: Arc<MockGuidanceApi>,
    ) -> (VoicePipeline, SharedState, AnnotationStore, SharedClip) {
        let state = new_shared_state();
        let annotations = AnnotationStore::new();
        let clip = new_shared_clip(16_000, 30.0);
        let pipeline = VoicePipeline::new(
            Arc::clone(&state),
            annotations.clone(),
            SharedClip::clone(&clip),
            api,
        );
        (pipeline, state, annotations, clip)
    }

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

    #[tokio::test]
    async fn press_starts_recording() {
        let (pipeline, state, _annotations, clip) =
            make_pipeline(Arc::new(MockGuidanceApi::recognising("chair")));

        pipeline.start_recording();

        assert_eq!(pipeline.voice_state(), VoiceState::Recording);
        assert!(clip.lock().unwrap().is_active());
        let st = state.lock().unwrap();
        assert!(st.recording);
        assert_eq!(st.guidance, "Listening...");
    }

    /// A second press while recording must not restart the clip.
    #[tokio::test]
    async fn double_press_is_a_no_op() {
        let (pipeline, _state, _annotations, clip) =
            make_pipeline(Arc::new(MockGuidanceApi::recognising("chair")));

        pipeline.start_recording();
        clip.lock().unwrap().push_fragment(&[0.1; 100]);
        pipeline.start_recording();

        // Fragments survive the duplicate press.
        assert_eq!(clip.lock().unwrap().finalize().samples.len(), 100);
    }

    /// Releasing without a recording in progress is a no-op.
    #[tokio::test]
    async fn release_without_recording_is_a_no_op() {
        let api = Arc::new(MockGuidanceApi::recognising("chair"));
        let (pipeline, state, _annotations, _clip) = make_pipeline(Arc::clone(&api));

        pipeline.stop_and_send().await;

        assert_eq!(pipeline.voice_state(), VoiceState::Idle);
        assert_eq!(api.audio_calls.load(Ordering::SeqCst), 0);
        assert!(!state.lock().unwrap().recording);
    }

    /// A recognised target updates state and clears prior annotations.
    #[tokio::test]
    async fn recognised_target_clears_annotations() {
        let api = Arc::new(MockGuidanceApi::recognising("red chair"));
        let (pipeline, state, annotations, clip) = make_pipeline(Arc::clone(&api));
        annotations.replace(stale_snapshot());

        pipeline.start_recording();
        clip.lock().unwrap().push_fragment(&[0.1; 1_000]);
        pipeline.stop_and_send().await;

        let st = state.lock().unwrap();
        assert_eq!(st.target, "red chair");
        assert_eq!(st.guidance, "Target set to: red chair");
        assert!(!st.recording);
        assert!(annotations.current().is_empty());
        assert_eq!(pipeline.voice_state(), VoiceState::Idle);
        assert_eq!(api.audio_calls.load(Ordering::SeqCst), 1);
    }

    /// Instant release: zero fragments captured, the empty clip is still
    /// transmitted, and the backend rejection drives the guidance.
    #[tokio::test]
    async fn empty_clip_is_transmitted_and_rejection_reported() {
        let api = Arc::new(MockGuidanceApi::failing());
        let (pipeline, state, annotations, _clip) = make_pipeline(Arc::clone(&api));
        annotations.replace(stale_snapshot());
        state.lock().unwrap().target = "cup".into();

        pipeline.start_recording();
        pipeline.stop_and_send().await;

        // The empty clip went out; the failure left the target alone.
        assert_eq!(api.audio_calls.load(Ordering::SeqCst), 1);
        let st = state.lock().unwrap();
        assert_eq!(st.target, "cup");
        assert_eq!(st.guidance, "Could not understand audio.");
        assert!(!st.recording);
        assert_eq!(pipeline.voice_state(), VoiceState::Idle);
        // Failure does not clear annotations — only a target change does.
        assert_eq!(annotations.current().len(), 1);
    }

    /// A success response without a recognised target behaves like a
    /// rejection: guidance updated, target unchanged.
    #[tokio::test]
    async fn unrecognised_target_leaves_target_unchanged() {
        // `acknowledging` answers audio with a 400 only when no audio
        // response is scripted; craft an explicit no-target response instead.
        let api = Arc::new(MockGuidanceApi::recognising("  "));
        let (pipeline, state, _annotations, _clip) = make_pipeline(Arc::clone(&api));
        state.lock().unwrap().target = "cup".into();

        pipeline.start_recording();
        pipeline.stop_and_send().await;

        let st = state.lock().unwrap();
        assert_eq!(st.target, "cup");
        assert_eq!(st.guidance, "Could not understand audio.");
    }

    /// The recording flag follows press/release exactly.
    #[tokio::test]
    async fn recording_flag_tracks_press_release() {
        let (pipeline, state, _annotations, _clip) =
            make_pipeline(Arc::new(MockGuidanceApi::recognising("chair")));

        assert!(!state.lock().unwrap().recording);
        pipeline.start_recording();
        assert!(state.lock().unwrap().recording);
        pipeline.stop_and_send().await;
        assert!(!state.lock().unwrap().recording);
    }
}
