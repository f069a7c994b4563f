//! Capture pipeline — snapshot one frame, ship it for analysis, publish the
//! resulting annotations.
//!
//! Backpressure policy: at most one analysis request outstanding at a time,
//! no queueing.  The `processing` flag is checked and set in a single
//! synchronous section before the first suspension point, so two calls
//! started back-to-back within the same scheduler turn still collapse to
//! one request.

use std::sync::Arc;

use crate::api::GuidanceApi;
use crate::media::FrameProvider;
use crate::overlay::{AnnotationSnapshot, AnnotationStore};

use super::state::{guidance_text, SharedState};

// ---------------------------------------------------------------------------
// CapturePipeline
// ---------------------------------------------------------------------------

/// Drives one frame-capture-and-analyze round trip per invocation.
pub struct CapturePipeline {
    state: SharedState,
    annotations: AnnotationStore,
    frames: Arc<dyn FrameProvider>,
    api: Arc<dyn GuidanceApi>,
}

impl CapturePipeline {
    pub fn new(
        state: SharedState,
        annotations: AnnotationStore,
        frames: Arc<dyn FrameProvider>,
        api: Arc<dyn GuidanceApi>,
    ) -> Self {
        Self {
            state,
            annotations,
            frames,
            api,
        }
    }

    /// Snapshot the current frame, send it for analysis, and apply the
    /// response.
    ///
    /// * No-op while another capture is in flight or before the media
    ///   session is ready.
    /// * On success the response is authoritative: target and guidance are
    ///   replaced, and the annotation snapshot is swapped wholesale (empty
    ///   when the backend returned no detections).
    /// * On failure the target and the stale annotations are deliberately
    ///   retained — a transient failure should not blank the overlay — and
    ///   only the guidance line reports the error.
    /// * No retry is attempted; the user invokes capture again.
    pub async fn capture_and_analyze(&self) {
        // Synchronous guard section: no await may occur before the flag is
        // set, or two captures could slip through in the same turn.
        {
            let mut st = self.state.lock().unwrap();
            if st.processing {
                log::debug!("capture: already in flight, ignoring");
                return;
            }
            if !self.frames.is_ready() {
                log::debug!("capture: media session not ready, ignoring");
                return;
            }
            st.processing = true;
            st.guidance = guidance_text::ANALYZING.into();
        }

        let Some(frame) = self.frames.latest_frame() else {
            // Readiness was true, so a frame should exist; treat a missing
            // one like any other capture failure.
            self.finish(guidance_text::ANALYZE_FAILED.into());
            return;
        };

        log::debug!(
            "capture: snapshotting {}x{} frame",
            frame.width,
            frame.height
        );

        // JPEG encoding is CPU-bound; keep it off the async runtime.
        let encoded = tokio::task::spawn_blocking(move || frame.encode_jpeg()).await;
        let jpeg = match encoded {
            Ok(Ok(jpeg)) => jpeg,
            Ok(Err(e)) => {
                log::warn!("capture: frame encoding failed: {e}");
                self.finish(guidance_text::ANALYZE_FAILED.into());
                return;
            }
            Err(e) => {
                log::warn!("capture: encode task panicked: {e}");
                self.finish(guidance_text::ANALYZE_FAILED.into());
                return;
            }
        };

        match self.api.analyze_frame(jpeg).await {
            Ok(resp) => {
                log::debug!(
                    "capture: target={:?} detections={}",
                    resp.target,
                    resp.detections.as_ref().map_or(0, Vec::len)
                );

                {
                    let mut st = self.state.lock().unwrap();
                    st.target = resp.target.clone();
                    st.guidance = resp.guidance_text.clone();
                }
                // Wholesale replacement — the response is authoritative,
                // never merged with prior detections.
                self.annotations
                    .replace(AnnotationSnapshot::new(resp.into_detections()));

                let mut st = self.state.lock().unwrap();
                st.processing = false;
            }
            Err(e) => {
                log::warn!("capture: analysis failed: {e}");
                // Stale annotations retained on purpose.
                self.finish(guidance_text::ANALYZE_FAILED.into());
            }
        }
    }

    /// Clear the busy flag and set the guidance line (failure paths).
    fn finish(&self, guidance: String) {
        let mut st = self.state.lock().unwrap();
        st.guidance = guidance;
        st.processing = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
