//! TOML-backed application configuration.

use crate::classifier::ScoreKind;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub classifier: ClassifierConfig,
}

impl AppConfig {
    /// Load a config file. Missing sections and keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` when it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

/// Where frames come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSource {
    /// A V4L2 capture device.
    #[default]
    Webcam,
    /// A directory of images replayed in a loop.
    Folder,
}

/// Settings for the frame source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub source: CameraSource,
    /// Index `n` of `/dev/video{n}`.
    pub device_index: usize,
    /// Requested capture size; the driver may pick the nearest mode.
    pub width: u32,
    pub height: u32,
    /// Directory replayed as the camera feed.
    pub frames_dir: PathBuf,
    pub recursive: bool,
    pub frame_interval_ms: u64,
}

impl CameraConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: CameraSource::Webcam,
            device_index: 0,
            width: 640,
            height: 480,
            frames_dir: PathBuf::from("frames"),
            recursive: false,
            frame_interval_ms: 33,
        }
    }
}

/// Configuration for the ONNX image classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    /// Whether the model emits probabilities or raw logits.
    pub output: ScoreKind,
    /// Keep only the best `top_k` guesses; `None` keeps every class.
    pub top_k: Option<usize>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/classifier.onnx"),
            labels_path: PathBuf::from("models/labels.txt"),
            input_size: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
            output: ScoreKind::Probabilities,
            top_k: Some(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[camera]\nsource = \"folder\"\nframes_dir = \"/tmp/feed\"\n\n\
             [classifier]\noutput = \"logits\"\ntop_k = 3\n",
        )?;

        let cfg = AppConfig::load(&path)?;
        assert_eq!(cfg.camera.source, CameraSource::Folder);
        assert_eq!(cfg.camera.device_index, 0);
        assert_eq!(cfg.camera.frames_dir, PathBuf::from("/tmp/feed"));
        assert_eq!(cfg.camera.frame_interval_ms, 33);
        assert_eq!(cfg.classifier.output, ScoreKind::Logits);
        assert_eq!(cfg.classifier.top_k, Some(3));
        assert_eq!(cfg.classifier.input_size, 224);
        Ok(())
    }

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let cfg = AppConfig::load_or_default(dir.path().join("absent.toml"))?;
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.camera.source, CameraSource::Webcam);
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[camera\nframes_dir = 1")?;
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        Ok(())
    }
}
