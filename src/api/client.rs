//! Core `GuidanceApi` trait and `HttpGuidanceApi` implementation.
//!
//! `HttpGuidanceApi` talks to the Clear Path backend over HTTP.  All
//! connection details come from [`ApiConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ApiConfig;

use super::types::{AnalyzeResponse, TargetResponse};

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors that can occur while calling the guidance backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("backend request timed out")]
    Timeout,

    /// The backend answered with a non-success status code.
    #[error("backend returned status {0}")]
    Status(u16),

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse backend response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if let Some(status) = e.status() {
            ApiError::Status(status.as_u16())
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// GuidanceApi trait
// ---------------------------------------------------------------------------

/// Async interface to the remote guidance backend.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (wrapped in `Arc<dyn GuidanceApi>`).
#[async_trait]
pub trait GuidanceApi: Send + Sync {
    /// Submit one encoded JPEG frame for analysis against the current target.
    async fn analyze_frame(&self, jpeg: Vec<u8>) -> Result<AnalyzeResponse, ApiError>;

    /// Submit one encoded WAV clip; the backend transcribes it and extracts
    /// the spoken target.
    async fn set_target_from_audio(&self, wav: Vec<u8>) -> Result<TargetResponse, ApiError>;

    /// Confirm a typed target name with the backend.
    async fn set_target_text(&self, name: &str) -> Result<TargetResponse, ApiError>;
}

// ---------------------------------------------------------------------------
// HttpGuidanceApi
// ---------------------------------------------------------------------------

/// reqwest-backed [`GuidanceApi`] implementation.
pub struct HttpGuidanceApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpGuidanceApi {
    /// Build an `HttpGuidanceApi` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait]
impl GuidanceApi for HttpGuidanceApi {
    async fn analyze_frame(&self, jpeg: Vec<u8>) -> Result<AnalyzeResponse, ApiError> {
        let part = reqwest::multipart::Part::bytes(jpeg)
            .file_name("capture.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/process_frame"))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let parsed: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(parsed)
    }

    async fn set_target_from_audio(&self, wav: Vec<u8>) -> Result<TargetResponse, ApiError> {
        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("command.wav")
            .mime_str("audio/wav")
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("audio_file", part);

        let response = self
            .client
            .post(self.url("/api/set_target_from_audio"))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let parsed: TargetResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(parsed)
    }

    async fn set_target_text(&self, name: &str) -> Result<TargetResponse, ApiError> {
        let body = serde_json::json!({ "name": name });

        let response = self
            .client
            .post(self.url("/api/set_target_text"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: TargetResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// MockGuidanceApi — shared test double for the pipeline tests
// ---------------------------------------------------------------------------

/// Scripted [`GuidanceApi`] used by the pipeline tests.
///
/// Endpoints answer with the configured response or `ApiError::Status(500)`
/// when none is set.  Every call is counted, and an optional gate lets a
/// test hold an analyze request in flight while it probes re-entrancy.
#[cfg(test)]
pub struct MockGuidanceApi {
    analyze_response: Option<AnalyzeResponse>,
    audio_response: Option<TargetResponse>,
    text_fails: bool,
    gate: Option<std::sync::Arc<tokio::sync::Notify>>,
    pub analyze_calls: std::sync::atomic::AtomicUsize,
    pub audio_calls: std::sync::atomic::AtomicUsize,
    pub text_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockGuidanceApi {
    /// All endpoints fail with a 500.
    pub fn failing() -> Self {
        Self {
            analyze_response: None,
            audio_response: None,
            text_fails: true,
            gate: None,
            analyze_calls: std::sync::atomic::AtomicUsize::new(0),
            audio_calls: std::sync::atomic::AtomicUsize::new(0),
            text_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// `analyze_frame` succeeds with `response`; other endpoints succeed too.
    pub fn analyzing(response: AnalyzeResponse) -> Self {
        Self {
            analyze_response: Some(response),
            audio_response: None,
            text_fails: false,
            ..Self::failing()
        }
    }

    /// `set_target_from_audio` recognises `target`; text confirmation works.
    pub fn recognising(target: &str) -> Self {
        Self {
            audio_response: Some(TargetResponse {
                status: "success".into(),
                target: Some(target.to_string()),
                message: None,
            }),
            text_fails: false,
            ..Self::failing()
        }
    }

    /// Text confirmation succeeds; everything else fails.
    pub fn acknowledging() -> Self {
        Self {
            text_fails: false,
            ..Self::failing()
        }
    }

    /// Hold every `analyze_frame` call until `gate` is notified.
    pub fn gated(mut self, gate: std::sync::Arc<tokio::sync::Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl GuidanceApi for MockGuidanceApi {
    async fn analyze_frame(&self, _jpeg: Vec<u8>) -> Result<AnalyzeResponse, ApiError> {
        use std::sync::atomic::Ordering;
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.analyze_response {
            Some(resp) => Ok(resp.clone()),
            None => Err(ApiError::Status(500)),
        }
    }

    async fn set_target_from_audio(&self, _wav: Vec<u8>) -> Result<TargetResponse, ApiError> {
        use std::sync::atomic::Ordering;
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        match &self.audio_response {
            Some(resp) => Ok(resp.clone()),
            None => Err(ApiError::Status(400)),
        }
    }

    async fn set_target_text(&self, name: &str) -> Result<TargetResponse, ApiError> {
        use std::sync::atomic::Ordering;
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        if self.text_fails {
            return Err(ApiError::Status(500));
        }
        Ok(TargetResponse {
            status: "success".into(),
            target: Some(name.to_string()),
            message: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> ApiConfig {
        ApiConfig {
            base_url: "http://localhost:8000".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _api = HttpGuidanceApi::from_config(&make_config());
    }

    #[test]
    fn url_joins_base_and_path() {
        let api = HttpGuidanceApi::from_config(&make_config());
        assert_eq!(
            api.url("/api/process_frame"),
            "http://localhost:8000/api/process_frame"
        );
    }

    /// Verify that `HttpGuidanceApi` is object-safe (usable as
    /// `dyn GuidanceApi`).
    #[test]
    fn api_is_object_safe() {
        let api: Box<dyn GuidanceApi> = Box::new(HttpGuidanceApi::from_config(&make_config()));
        drop(api);
    }
}
