mod app;

use anyhow::{Context, Result, anyhow};
use app::UiApp;
use classifier_core::{AppConfig, CaptureController, OnnxClassifier, provider_from_config};
use directories_next::ProjectDirs;
use eframe::{NativeOptions, egui};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Err(e) = run() {
        app::fatal(e);
    }
}

fn run() -> Result<()> {
    let cfg = load_config()?;
    let classifier =
        OnnxClassifier::new(&cfg.classifier).context("Could not load classification model")?;

    let provider = provider_from_config(&cfg.camera).context("No camera backend available")?;
    let (tx, rx) = mpsc::channel();
    let mut controller = CaptureController::new(provider, tx);
    controller
        .start_session()
        .context("Could not start the camera")?;

    let frame_interval = cfg.camera.frame_interval();
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 760.0])
            .with_min_inner_size([240.0, 320.0]),
        ..Default::default()
    };
    let title = format!("Camera Classifier {}", env!("APP_VERSION"));
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(UiApp::new(
                controller,
                Box::new(classifier),
                rx,
                frame_interval,
            )))
        }),
    )
    .map_err(|e| anyhow!("Window closed with error: {e}"))
}

/// An explicit path argument must exist; the per-user config file is optional.
fn load_config() -> Result<AppConfig> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        return AppConfig::load(&path)
            .with_context(|| format!("Could not load config {}", path.display()));
    }
    match ProjectDirs::from("com", "cameraclassifier", "CameraClassifier") {
        Some(dirs) => {
            let path = dirs.config_dir().join("config.toml");
            Ok(AppConfig::load_or_default(path)?)
        }
        None => Ok(AppConfig::default()),
    }
}
