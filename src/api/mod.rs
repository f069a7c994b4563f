//! Remote guidance backend interface.
//!
//! This module provides:
//! * [`GuidanceApi`] — async trait implemented by all backend clients.
//! * [`HttpGuidanceApi`] — reqwest-backed client for the real backend.
//! * [`AnalyzeResponse`] / [`TargetResponse`] — wire types.
//! * [`ApiError`] — error variants for backend calls.

pub mod client;
pub mod types;

pub use client::{ApiError, GuidanceApi, HttpGuidanceApi};
pub use types::{AnalyzeResponse, TargetResponse};

// test-only re-export so pipeline test modules can import the mock without
// `use clear_path::api::client::MockGuidanceApi`.
#[cfg(test)]
pub use client::MockGuidanceApi;
