//! Result overlay: the captured still and one guess at a time.

use super::{UiApp, fatal};
use eframe::egui;

pub(super) enum ResultAction {
    Wrong,
    Done,
}

impl UiApp {
    pub(super) fn render_result_overlay(&mut self, ctx: &egui::Context) {
        let Some(screen) = self.result.as_ref() else {
            return;
        };
        let display = screen.presenter.current();
        let mut action = None;

        egui::TopBottomPanel::bottom("result-controls")
            .frame(egui::Frame::NONE.fill(egui::Color32::from_black_alpha(220)).inner_margin(16.0))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    if let Some(display) = &display {
                        ui.label(
                            egui::RichText::new(&display.confidence_text)
                                .size(44.0)
                                .strong()
                                .color(egui::Color32::WHITE),
                        );
                        ui.label(
                            egui::RichText::new(&display.label)
                                .size(22.0)
                                .color(egui::Color32::LIGHT_GRAY),
                        );
                    }
                    ui.add_space(12.0);
                    ui.horizontal(|ui| {
                        if ui.button(egui::RichText::new("Wrong").size(18.0)).clicked() {
                            action = Some(ResultAction::Wrong);
                        }
                        if ui.button(egui::RichText::new("Done").size(18.0)).clicked() {
                            action = Some(ResultAction::Done);
                        }
                    });
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    let still = egui::load::SizedTexture::from_handle(&screen.still);
                    ui.add(egui::Image::from_texture(still).shrink_to_fit());
                });
            });

        if let Some(action) = action {
            self.apply_result_action(action);
        }
    }

    pub(super) fn apply_result_action(&mut self, action: ResultAction) {
        let Some(screen) = self.result.as_mut() else {
            return;
        };
        let outcome = match action {
            ResultAction::Wrong => screen.presenter.advance(&mut self.controller),
            ResultAction::Done => screen.presenter.dismiss(&mut self.controller),
        };
        if let Err(e) = outcome {
            fatal(e);
        }
        if screen.presenter.is_dismissed() {
            self.close_result();
        }
    }
}
