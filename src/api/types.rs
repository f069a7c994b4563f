//! Wire types for the Clear Path backend.
//!
//! Shapes mirror the FastAPI endpoints exactly:
//! `/api/process_frame`, `/api/set_target_from_audio`, `/api/set_target_text`.

use serde::Deserialize;

use crate::overlay::DetectionBox;

// ---------------------------------------------------------------------------
// AnalyzeResponse
// ---------------------------------------------------------------------------

/// Response of `/api/process_frame`.
///
/// `detections` may be absent entirely; callers treat that as an empty list
/// (the response is authoritative, never merged with prior state).
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub guidance_text: String,
    pub target: String,
    /// Base64 JPEG annotated by the backend.  Kept for wire compatibility;
    /// the client paints its own overlay from `detections`.
    #[serde(default)]
    pub annotated_image: String,
    #[serde(default)]
    pub detections: Option<Vec<DetectionBox>>,
}

impl AnalyzeResponse {
    /// Detections as an owned list, absent treated as empty.
    pub fn into_detections(self) -> Vec<DetectionBox> {
        self.detections.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// TargetResponse
// ---------------------------------------------------------------------------

/// Response of `/api/set_target_from_audio` and `/api/set_target_text`.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetResponse {
    pub status: String,
    /// The recognised target name; absent when the backend could not extract
    /// one from the command.
    #[serde(default)]
    pub target: Option<String>,
    /// Human-readable error detail on the no-target path.
    #[serde(default)]
    pub message: Option<String>,
}

impl TargetResponse {
    /// The recognised target, if the backend reported one (non-empty).
    pub fn recognised_target(&self) -> Option<&str> {
        self.target.as_deref().filter(|t| !t.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_analyze_response() {
        let json = r#"{
            "status": "ok",
            "guidance_text": "chair ahead",
            "target": "chair",
            "annotated_image": "",
            "detections": [{
                "label": "chair",
                "confidence": 0.92,
                "relative_direction": "ahead",
                "distance_estimate": "2m",
                "box": {"x_min": 10, "y_min": 20, "x_max": 100, "y_max": 200}
            }]
        }"#;

        let resp: AnalyzeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.guidance_text, "chair ahead");
        assert_eq!(resp.target, "chair");

        let dets = resp.into_detections();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "chair");
        assert_eq!(dets[0].bounds.x_min, 10);
        assert_eq!(dets[0].bounds.y_min, 20);
        assert_eq!(dets[0].bounds.x_max, 100);
        assert_eq!(dets[0].bounds.y_max, 200);
    }

    #[test]
    fn missing_detections_treated_as_empty() {
        let json = r#"{"status":"ok","guidance_text":"nothing in view","target":"cup"}"#;
        let resp: AnalyzeResponse = serde_json::from_str(json).unwrap();
        assert!(resp.into_detections().is_empty());
    }

    #[test]
    fn target_response_with_target() {
        let json = r#"{"status":"success","target":"red chair"}"#;
        let resp: TargetResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.recognised_target(), Some("red chair"));
    }

    #[test]
    fn target_response_without_target() {
        let json = r#"{"status":"error","message":"No target identified."}"#;
        let resp: TargetResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.recognised_target(), None);
        assert_eq!(resp.message.as_deref(), Some("No target identified."));
    }

    #[test]
    fn blank_target_is_not_recognised() {
        let json = r#"{"status":"success","target":"   "}"#;
        let resp: TargetResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.recognised_target(), None);
    }
}
