//! Live preview with the round capture button.

use super::UiApp;
use classifier_core::Frame;
use eframe::egui;

const CAPTURE_BUTTON_SIZE: f32 = 72.0;
const CAPTURE_BUTTON_MARGIN: f32 = 32.0;

pub(super) fn to_color_image(frame: &Frame) -> egui::ColorImage {
    let size = [frame.width() as usize, frame.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, frame.as_raw())
}

/// UV rect that crops an image to fill `target` without distortion.
pub(super) fn aspect_fill_uv(image: egui::Vec2, target: egui::Vec2) -> egui::Rect {
    let full = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    if image.x <= 0.0 || image.y <= 0.0 || target.x <= 0.0 || target.y <= 0.0 {
        return full;
    }
    let image_aspect = image.x / image.y;
    let target_aspect = target.x / target.y;
    if image_aspect > target_aspect {
        let visible = target_aspect / image_aspect;
        let inset = (1.0 - visible) / 2.0;
        egui::Rect::from_min_max(egui::pos2(inset, 0.0), egui::pos2(1.0 - inset, 1.0))
    } else if image_aspect < target_aspect {
        let visible = image_aspect / target_aspect;
        let inset = (1.0 - visible) / 2.0;
        egui::Rect::from_min_max(egui::pos2(0.0, inset), egui::pos2(1.0, 1.0 - inset))
    } else {
        full
    }
}

impl UiApp {
    pub(super) fn render_capture_screen(&mut self, ctx: &egui::Context) {
        if let Some(frame) = self.controller.latest_preview() {
            let color = to_color_image(&frame);
            match &mut self.preview {
                Some(tex) => tex.set(color, egui::TextureOptions::LINEAR),
                None => {
                    let options = egui::TextureOptions::LINEAR;
                    self.preview = Some(ctx.load_texture("camera-preview", color, options));
                }
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let painter = ui.painter();
                match &self.preview {
                    Some(tex) => {
                        let uv = aspect_fill_uv(tex.size_vec2(), rect.size());
                        painter.image(tex.id(), rect, uv, egui::Color32::WHITE);
                    }
                    None => {
                        painter.text(
                            rect.center(),
                            egui::Align2::CENTER_CENTER,
                            "Starting camera...",
                            egui::FontId::proportional(18.0),
                            egui::Color32::GRAY,
                        );
                    }
                }

                let center = egui::pos2(
                    rect.center().x,
                    rect.bottom() - CAPTURE_BUTTON_MARGIN - CAPTURE_BUTTON_SIZE / 2.0,
                );
                let button = egui::Rect::from_center_size(
                    center,
                    egui::Vec2::splat(CAPTURE_BUTTON_SIZE),
                );
                let response = ui.interact(button, ui.id().with("capture"), egui::Sense::click());
                let fill = if response.hovered() {
                    egui::Color32::from_rgb(230, 30, 30)
                } else {
                    egui::Color32::RED
                };
                ui.painter().circle(
                    center,
                    CAPTURE_BUTTON_SIZE / 2.0,
                    fill,
                    egui::Stroke::new(5.0, egui::Color32::WHITE),
                );
                if response.clicked() && !self.controller.request_capture() {
                    tracing::debug!("Capture ignored; camera not armed");
                }
            });

        ctx.request_repaint_after(self.frame_interval);
    }
}
