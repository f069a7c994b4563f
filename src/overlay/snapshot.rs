//! Detection annotations and the shared, versioned snapshot store.
//!
//! [`AnnotationStore`] is the single point where the capture and voice
//! pipelines publish detections and the render loop reads them.  A snapshot
//! is never edited in place: writers build a complete [`AnnotationSnapshot`]
//! and swap the published `Arc` wholesale, so a reader always sees either
//! the old list or the new list, never a mixture.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BoundingBox
// ---------------------------------------------------------------------------

/// Axis-aligned box in source-frame pixel coordinates.
///
/// Invariant (enforced by the backend, checked in [`DetectionBox::is_valid`]):
/// `x_min <= x_max` and `y_min <= y_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    /// Width of the box in pixels (zero when degenerate).
    pub fn width(&self) -> i32 {
        (self.x_max - self.x_min).max(0)
    }

    /// Height of the box in pixels (zero when degenerate).
    pub fn height(&self) -> i32 {
        (self.y_max - self.y_min).max(0)
    }
}

// ---------------------------------------------------------------------------
// DetectionBox
// ---------------------------------------------------------------------------

/// One recognized object instance, as reported by the vision backend.
///
/// Immutable once constructed; lives only inside an [`AnnotationSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    /// Object class label (e.g. `"chair"`).
    pub label: String,
    /// Detector confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Free-text direction relative to the camera (e.g. `"left"`, `"ahead"`).
    #[serde(default)]
    pub relative_direction: String,
    /// Free-text distance estimate (e.g. `"2m"`).
    #[serde(default)]
    pub distance_estimate: String,
    /// Bounding box in source-frame pixel coordinates.
    #[serde(rename = "box")]
    pub bounds: BoundingBox,
}

impl DetectionBox {
    /// Returns `true` when the box coordinates are well-ordered.
    pub fn is_valid(&self) -> bool {
        self.bounds.x_min <= self.bounds.x_max && self.bounds.y_min <= self.bounds.y_max
    }

    /// Label painted on the overlay: class name plus confidence percentage.
    pub fn overlay_label(&self) -> String {
        format!("{} {:.0}%", self.label, self.confidence * 100.0)
    }
}

// ---------------------------------------------------------------------------
// AnnotationSnapshot
// ---------------------------------------------------------------------------

/// The ordered sequence of detections currently valid for display.
///
/// Array order only matters for visual stacking: later boxes are painted
/// over earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSnapshot {
    pub boxes: Vec<DetectionBox>,
}

impl AnnotationSnapshot {
    pub fn new(boxes: Vec<DetectionBox>) -> Self {
        Self { boxes }
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }
}

// ---------------------------------------------------------------------------
// AnnotationStore
// ---------------------------------------------------------------------------

/// Publish-by-swap holder for the current [`AnnotationSnapshot`].
///
/// Writers replace the whole snapshot with [`replace`](Self::replace) or
/// [`clear`](Self::clear); the render loop calls
/// [`current`](Self::current) every tick and gets an `Arc` to a consistent
/// list.  The lock is held only for the duration of the pointer swap /
/// clone, never across an await point or a paint.
#[derive(Clone)]
pub struct AnnotationStore {
    inner: Arc<Mutex<Arc<AnnotationSnapshot>>>,
}

impl AnnotationStore {
    /// Create a store holding an empty snapshot.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Arc::new(AnnotationSnapshot::default()))),
        }
    }

    /// The currently published snapshot.
    ///
    /// The returned `Arc` stays valid (and unchanged) even if a writer swaps
    /// in a new snapshot while the caller is still iterating it.
    pub fn current(&self) -> Arc<AnnotationSnapshot> {
        Arc::clone(&self.inner.lock().unwrap())
    }

    /// Atomically replace the published snapshot wholesale.
    pub fn replace(&self, snapshot: AnnotationSnapshot) {
        *self.inner.lock().unwrap() = Arc::new(snapshot);
    }

    /// Publish an empty snapshot (a new target invalidates prior detections).
    pub fn clear(&self) {
        self.replace(AnnotationSnapshot::default());
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
