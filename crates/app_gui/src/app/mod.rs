//! eframe application: camera screen plus the result overlay.

mod capture;
mod result;

use classifier_core::{
    CameraProvider, CaptureController, CaptureEvent, Classifier, ResultPresenter, StillImage,
};
use eframe::{App, Frame, egui};
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Log and print an unrecoverable error, then exit.
pub fn fatal(err: impl Into<anyhow::Error>) -> ! {
    let err = err.into();
    tracing::error!("{err:#}");
    eprintln!("Fatal error: {err:#}");
    std::process::exit(1);
}

pub struct UiApp {
    controller: CaptureController<Box<dyn CameraProvider>>,
    classifier: Box<dyn Classifier>,
    events: Receiver<CaptureEvent>,
    frame_interval: Duration,
    preview: Option<egui::TextureHandle>,
    result: Option<ResultScreen>,
}

struct ResultScreen {
    presenter: ResultPresenter,
    still: egui::TextureHandle,
}

impl UiApp {
    pub fn new(
        controller: CaptureController<Box<dyn CameraProvider>>,
        classifier: Box<dyn Classifier>,
        events: Receiver<CaptureEvent>,
        frame_interval: Duration,
    ) -> Self {
        Self {
            controller,
            classifier,
            events,
            frame_interval,
            preview: None,
            result: None,
        }
    }

    fn poll_capture_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                CaptureEvent::Still(still) if self.controller.is_current(&still) => {
                    self.show_result(ctx, still);
                }
                CaptureEvent::Still(still) => {
                    tracing::debug!(session = still.session, "Dropping still from an old session");
                }
                CaptureEvent::Failed(err) => fatal(err),
            }
        }
    }

    /// Drop the overlay and any preview left over from the previous session.
    fn close_result(&mut self) {
        self.result = None;
        self.preview = None;
    }

    fn show_result(&mut self, ctx: &egui::Context, still: StillImage) {
        self.controller.stop_session();
        let predictions = self
            .classifier
            .classify(&still.image)
            .unwrap_or_else(|e| fatal(e));
        tracing::info!("Classified still into {} guesses", predictions.len());

        let still_texture = ctx.load_texture(
            "captured-still",
            capture::to_color_image(&still.image),
            egui::TextureOptions::LINEAR,
        );
        let mut presenter = ResultPresenter::new(predictions);
        if let Err(e) = presenter.attach(&mut self.controller) {
            fatal(e);
        }
        if presenter.is_dismissed() {
            self.close_result();
            return;
        }
        self.result = Some(ResultScreen {
            presenter,
            still: still_texture,
        });
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_capture_events(ctx);
        if self.result.is_some() {
            self.render_result_overlay(ctx);
        } else {
            self.render_capture_screen(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::result::ResultAction;
    use super::*;
    use classifier_core::{
        CameraDevice, CameraError, ClassifyError, Frame, Prediction, PredictionList,
    };
    use std::sync::mpsc;
    use std::thread;

    struct Gray;

    impl CameraDevice for Gray {
        fn name(&self) -> &str {
            "gray"
        }

        fn next_frame(&mut self) -> Result<Frame, CameraError> {
            thread::sleep(Duration::from_millis(5));
            Ok(Frame::from_pixel(2, 2, image::Rgba([90, 90, 90, 255])))
        }
    }

    struct GrayProvider;

    impl CameraProvider for GrayProvider {
        fn open_default(&self) -> Result<Box<dyn CameraDevice>, CameraError> {
            Ok(Box::new(Gray))
        }
    }

    struct Fixed(PredictionList);

    impl Classifier for Fixed {
        fn classify(&self, _image: &Frame) -> Result<PredictionList, ClassifyError> {
            Ok(self.0.clone())
        }
    }

    fn app(predictions: PredictionList) -> UiApp {
        let (tx, rx) = mpsc::channel();
        let provider: Box<dyn CameraProvider> = Box::new(GrayProvider);
        let mut controller = CaptureController::new(provider, tx);
        controller.start_session().expect("gray camera");
        UiApp::new(controller, Box::new(Fixed(predictions)), rx, Duration::ZERO)
    }

    fn stale_preview(ctx: &egui::Context) -> egui::TextureHandle {
        let color = egui::ColorImage::from_rgba_unmultiplied([1, 1], &[255, 0, 0, 255]);
        ctx.load_texture("stale", color, egui::TextureOptions::LINEAR)
    }

    fn still(app: &UiApp) -> StillImage {
        StillImage {
            image: Frame::from_pixel(2, 2, image::Rgba([1, 2, 3, 255])),
            session: app.controller.generation(),
        }
    }

    #[test]
    fn done_restarts_camera_and_clears_old_preview() {
        let ctx = egui::Context::default();
        let mut app = app(PredictionList::new(vec![
            Prediction::new("Lake", 0.92),
            Prediction::new("River", 0.81),
        ]));
        app.preview = Some(stale_preview(&ctx));
        let captured = still(&app);
        app.show_result(&ctx, captured);
        assert!(app.result.is_some());
        assert!(!app.controller.is_running());

        app.apply_result_action(ResultAction::Wrong);
        assert!(app.result.is_some());
        app.apply_result_action(ResultAction::Done);

        assert!(app.result.is_none());
        assert!(app.preview.is_none());
        assert!(app.controller.is_running());
        assert_eq!(app.controller.generation(), 2);
    }

    #[test]
    fn empty_result_skips_overlay_and_clears_old_preview() {
        let ctx = egui::Context::default();
        let mut app = app(PredictionList::default());
        app.preview = Some(stale_preview(&ctx));
        let captured = still(&app);
        app.show_result(&ctx, captured);

        assert!(app.result.is_none());
        assert!(app.preview.is_none());
        assert!(app.controller.is_running());
    }
}
