//! Overlay painting — detection rectangles and labels on top of the live
//! video, in snapshot order (later boxes stack over earlier ones).

use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};

use super::snapshot::AnnotationSnapshot;

/// Stroke colour for detection rectangles and label backgrounds.
const BOX_COLOR: Color32 = Color32::from_rgb(50, 205, 50);
/// Height of the filled label strip above each box.
const LABEL_HEIGHT: f32 = 18.0;
/// Horizontal padding inside the label strip.
const LABEL_PAD: f32 = 4.0;

/// Maps source-frame pixel coordinates into the on-screen image rect.
#[derive(Debug, Clone, Copy)]
pub struct FrameMapping {
    /// Where the video frame is painted on screen.
    pub screen: Rect,
    /// Native width of the source frame in pixels.
    pub frame_width: f32,
    /// Native height of the source frame in pixels.
    pub frame_height: f32,
}

impl FrameMapping {
    /// Convert a point from source-frame pixels to screen coordinates.
    pub fn to_screen(&self, x: f32, y: f32) -> Pos2 {
        Pos2 {
            x: self.screen.min.x + x / self.frame_width * self.screen.width(),
            y: self.screen.min.y + y / self.frame_height * self.screen.height(),
        }
    }
}

/// Paint every box in `snapshot`, in array order: rectangle, then a filled
/// label background sized to the label text, then the label text on top.
pub fn draw_overlay(painter: &egui::Painter, mapping: FrameMapping, snapshot: &AnnotationSnapshot) {
    let font = FontId::proportional(13.0);

    for det in &snapshot.boxes {
        if !det.is_valid() {
            // Degenerate coordinates from the backend; skip rather than
            // paint an inverted rect.
            continue;
        }

        let min = mapping.to_screen(det.bounds.x_min as f32, det.bounds.y_min as f32);
        let max = mapping.to_screen(det.bounds.x_max as f32, det.bounds.y_max as f32);
        let rect = Rect::from_min_max(min, max);

        painter.rect_stroke(
            rect,
            0.0,
            Stroke::new(2.0, BOX_COLOR),
            egui::StrokeKind::Outside,
        );

        let label = det.overlay_label();
        let galley = painter.layout_no_wrap(label.clone(), font.clone(), Color32::BLACK);

        // Label strip sits above the box, clamped into the frame when the
        // box touches the top edge.
        let strip_top = (min.y - LABEL_HEIGHT).max(mapping.screen.min.y);
        let strip = Rect::from_min_size(
            Pos2::new(min.x, strip_top),
            Vec2::new(galley.size().x + LABEL_PAD * 2.0, LABEL_HEIGHT),
        );
        painter.rect_filled(strip, 0.0, BOX_COLOR);

        painter.text(
            Pos2::new(strip.min.x + LABEL_PAD, strip.center().y),
            Align2::LEFT_CENTER,
            label,
            font.clone(),
            Color32::BLACK,
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_scales_frame_to_screen() {
        let mapping = FrameMapping {
            screen: Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(320.0, 240.0)),
            frame_width: 640.0,
            frame_height: 480.0,
        };

        // Frame origin maps to the screen rect origin.
        let origin = mapping.to_screen(0.0, 0.0);
        assert_eq!(origin, Pos2::new(10.0, 20.0));

        // Frame centre maps to the screen rect centre (half scale).
        let centre = mapping.to_screen(320.0, 240.0);
        assert_eq!(centre, Pos2::new(170.0, 140.0));
    }

    #[test]
    fn mapping_identity_at_native_size() {
        let mapping = FrameMapping {
            screen: Rect::from_min_size(Pos2::ZERO, Vec2::new(640.0, 480.0)),
            frame_width: 640.0,
            frame_height: 480.0,
        };
        assert_eq!(mapping.to_screen(100.0, 200.0), Pos2::new(100.0, 200.0));
    }
}
