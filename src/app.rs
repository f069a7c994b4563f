//! Clear Path viewer — egui/eframe application.
//!
//! # Architecture
//!
//! [`ClearPathApp`] is the top-level [`eframe::App`].  It owns only UI-side
//! state (texture handle, text field, button edge tracking); everything
//! shared lives behind [`SharedState`] and [`AnnotationStore`], which the
//! pipelines write and the render loop reads every frame.
//!
//! The app never awaits: user gestures become [`PipelineCommand`]s pushed
//! onto the command channel and the tokio side does the rest.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  live video + annotation overlay     │
//! ├──────────────────────────────────────┤
//! │  Target: <name>                      │
//! │  <guidance line>                     │
//! │  [type a target…] [Set]              │
//! │  [Scan surroundings] [Hold to talk]  │
//! └──────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::media::{FrameProvider, LiveFrames, VideoFrame};
use crate::overlay::{draw_overlay, AnnotationStore, FrameMapping};
use crate::pipeline::{CommandSender, PipelineCommand, SharedState};

// ---------------------------------------------------------------------------
// ClearPathApp
// ---------------------------------------------------------------------------

/// eframe application — live video, overlay, and the three command surfaces.
pub struct ClearPathApp {
    // ── Shared with the pipelines ────────────────────────────────────────
    /// Target, guidance, and busy flags written by the pipelines.
    state: SharedState,
    /// Published detection snapshots; read once per rendered frame.
    annotations: AnnotationStore,
    /// Latest-frame cell, `None` when camera access was denied at startup.
    frames: Option<LiveFrames>,
    /// Send user gestures to the pipeline loop.
    commands: CommandSender,

    // ── Render state ─────────────────────────────────────────────────────
    /// GPU texture holding the most recently uploaded frame.
    texture: Option<egui::TextureHandle>,
    /// The frame currently on the texture; re-upload only when it changes.
    last_frame: Option<Arc<VideoFrame>>,

    // ── UI state ─────────────────────────────────────────────────────────
    /// Contents of the typed-target field.
    target_input: String,
    /// Whether the talk button was held on the previous frame (edge detect).
    mic_held: bool,
}

impl ClearPathApp {
    pub fn new(
        state: SharedState,
        annotations: AnnotationStore,
        frames: Option<LiveFrames>,
        commands: CommandSender,
    ) -> Self {
        Self {
            state,
            annotations,
            frames,
            commands,
            texture: None,
            last_frame: None,
            target_input: String::new(),
            mic_held: false,
        }
    }

    fn send(&self, cmd: PipelineCommand) {
        // The receiver outlives the window; a send can only fail during
        // shutdown, where dropping the command is fine.
        if self.commands.send(cmd).is_err() {
            log::debug!("ui: pipeline loop gone, command dropped");
        }
    }

    // ── Video ────────────────────────────────────────────────────────────

    /// Upload the latest camera frame to the GPU if it changed since the
    /// last rendered frame.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let Some(frames) = &self.frames else {
            return;
        };
        let Some(frame) = frames.latest_frame() else {
            return;
        };

        let unchanged = self
            .last_frame
            .as_ref()
            .is_some_and(|last| Arc::ptr_eq(last, &frame));
        if unchanged {
            return;
        }

        let image = egui::ColorImage::from_rgb(
            [frame.width as usize, frame.height as usize],
            &frame.pixels,
        );
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("live-frame", image, egui::TextureOptions::LINEAR));
            }
        }
        self.last_frame = Some(frame);
    }

    /// Paint the live frame scaled to fit `ui`, then the annotation overlay
    /// mapped into the same rect.
    fn draw_video(&mut self, ui: &mut egui::Ui) {
        let (Some(texture), Some(frame)) = (&self.texture, &self.last_frame) else {
            self.draw_video_placeholder(ui);
            return;
        };

        let avail = ui.available_size();
        let frame_size = egui::vec2(frame.width as f32, frame.height as f32);
        let scale = (avail.x / frame_size.x).min(avail.y / frame_size.y);
        let size = frame_size * scale;

        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
        let painter = ui.painter_at(rect);
        painter.image(
            texture.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        // One snapshot per rendered frame; the Arc stays valid even if a
        // pipeline publishes a replacement mid-paint.
        let snapshot = self.annotations.current();
        draw_overlay(
            &painter,
            FrameMapping {
                screen: rect,
                frame_width: frame_size.x,
                frame_height: frame_size.y,
            },
            &snapshot,
        );
    }

    /// Shown before the first frame decodes, or when the camera is absent.
    fn draw_video_placeholder(&self, ui: &mut egui::Ui) {
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(ui.available_width(), 240.0), egui::Sense::hover());
        ui.painter()
            .rect_filled(rect, 4.0, egui::Color32::from_rgb(20, 20, 20));
        let message = if self.frames.is_some() {
            "Waiting for camera..."
        } else {
            "Camera unavailable"
        };
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            message,
            egui::FontId::proportional(14.0),
            egui::Color32::from_rgb(140, 140, 140),
        );
    }

    // ── Status + controls ────────────────────────────────────────────────

    fn draw_status(&self, ui: &mut egui::Ui) {
        let (target, guidance) = {
            let st = self.state.lock().unwrap();
            (st.target.clone(), st.guidance.clone())
        };

        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Target:")
                    .color(egui::Color32::from_rgb(160, 160, 160))
                    .size(13.0),
            );
            ui.label(
                egui::RichText::new(target)
                    .color(egui::Color32::from_rgb(80, 200, 120))
                    .size(13.0),
            );
        });
        ui.label(
            egui::RichText::new(guidance)
                .color(egui::Color32::from_rgb(220, 220, 220))
                .size(15.0),
        );
    }

    /// Typed-target field; submits on Enter or the Set button.
    fn draw_target_form(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.target_input)
                    .hint_text("Type a target...")
                    .desired_width(200.0),
            );
            let submitted =
                edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            if (ui.button("Set").clicked() || submitted) && !self.target_input.trim().is_empty() {
                self.send(PipelineCommand::SetTarget(self.target_input.clone()));
                self.target_input.clear();
            }
        });
    }

    /// Scan button plus the press-and-hold talk button.
    fn draw_action_buttons(&mut self, ui: &mut egui::Ui) {
        let (processing, recording) = {
            let st = self.state.lock().unwrap();
            (st.processing, st.recording)
        };
        let has_media = self.frames.is_some();

        ui.horizontal(|ui| {
            let scan_label = if processing { "Analyzing..." } else { "Scan surroundings" };
            if ui
                .add_enabled(has_media && !processing, egui::Button::new(scan_label))
                .clicked()
            {
                self.send(PipelineCommand::Capture);
            }

            let talk_label = if recording { "Listening..." } else { "Hold to talk" };
            let talk = ui.add_enabled(has_media, egui::Button::new(talk_label));

            // Press and release edges.  `is_pointer_button_down_on` goes
            // false on release anywhere, including outside the button, so
            // a drag-away still produces the release edge.
            let held = talk.is_pointer_button_down_on();
            if held && !self.mic_held {
                self.send(PipelineCommand::VoicePressed);
            } else if !held && self.mic_held {
                self.send(PipelineCommand::VoiceReleased);
            }
            self.mic_held = held;
        });
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for ClearPathApp {
    /// Called every frame by eframe: refresh the video texture, then render
    /// video + overlay + controls.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.refresh_texture(ctx);

        // Repaint at camera pace even without input events.
        ctx.request_repaint_after(Duration::from_millis(33));

        egui::CentralPanel::default()
            .frame(
                egui::Frame::new()
                    .fill(egui::Color32::from_rgb(12, 12, 12))
                    .inner_margin(egui::Margin::same(8)),
            )
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    self.draw_video(ui);
                });

                ui.add_space(6.0);
                self.draw_status(ui);
                ui.add_space(6.0);
                self.draw_target_form(ui);
                ui.add_space(4.0);
                self.draw_action_buttons(ui);
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("clear path viewer closing");
    }
}
