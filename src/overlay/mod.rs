//! Annotation model and overlay rendering.
//!
//! [`AnnotationStore`] is the shared, atomically-replaced snapshot of "what
//! to draw right now": the capture pipeline writes it, target changes clear
//! it, and the render loop reads it every tick without blocking on either.

pub mod draw;
pub mod snapshot;

pub use draw::{draw_overlay, FrameMapping};
pub use snapshot::{AnnotationSnapshot, AnnotationStore, BoundingBox, DetectionBox};
