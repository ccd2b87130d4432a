use std::path::PathBuf;
use thiserror::Error;

/// Failures acquiring or streaming from a camera device.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("No camera device available: {reason}")]
    NoDevice { reason: String },
    #[error("Camera {name} stream failed: {source}")]
    Stream {
        name: String,
        source: std::io::Error,
    },
    #[error("Camera {name} stopped delivering frames")]
    Exhausted { name: String },
    #[error("Failed to start capture thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Failures loading or running the classification model.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Model file is missing: {0}")]
    MissingModel(PathBuf),
    #[error("Labels file is missing: {0}")]
    MissingLabels(PathBuf),
    #[error("Failed to read labels {path}: {source}")]
    ReadLabels {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid labels file {path}: {message}")]
    InvalidLabels { path: PathBuf, message: String },
    #[error("Model runtime error: {0}")]
    Runtime(String),
    #[error("Model returned no results")]
    NoResults,
    #[error("Model returned a non-finite score for class {index}")]
    InvalidScores { index: usize },
}

/// Failures loading the application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
}
