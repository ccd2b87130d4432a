//! Capture a camera frame, classify it, and page through the ranked guesses.

pub mod camera;
pub mod capture;
pub mod classifier;
pub mod config;
pub mod error;
#[cfg(feature = "ort")]
pub mod onnx;
pub mod preprocess;
pub mod presenter;
#[cfg(all(feature = "webcam", target_os = "linux"))]
pub mod webcam;

pub use camera::{
    CameraDevice, CameraProvider, FolderCamera, FolderCameraProvider, Frame, provider_from_config,
};
pub use capture::{CaptureController, CaptureEvent, FrameHandler, FrameOutcome, StillImage};
pub use classifier::{Classifier, ScoreKind, load_labels, rank};
pub use config::{AppConfig, CameraConfig, CameraSource, ClassifierConfig};
pub use error::{CameraError, ClassifyError, ConfigError};
#[cfg(feature = "ort")]
pub use onnx::OnnxClassifier;
pub use presenter::{CameraRearm, PredictionDisplay, PresenterState, ResultPresenter};
#[cfg(all(feature = "webcam", target_os = "linux"))]
pub use webcam::{WebcamCamera, WebcamProvider};

/// A single (label, confidence) classification result.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Model confidence in [0,1].
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Confidence as a truncated whole percentage.
    pub fn percent(&self) -> u32 {
        let scaled = (self.confidence * 100.0).floor();
        if scaled.is_nan() || scaled <= 0.0 {
            0
        } else {
            scaled.min(100.0) as u32
        }
    }

    pub fn percent_text(&self) -> String {
        format!("{}%", self.percent())
    }
}

/// Predictions in the order the classifier ranked them.
///
/// The list is never re-sorted here; ranking is the classifier's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionList(Vec<Prediction>);

impl PredictionList {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self(predictions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Prediction> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&Prediction> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Prediction> {
        self.0
    }
}

impl FromIterator<Prediction> for PredictionList {
    fn from_iter<I: IntoIterator<Item = Prediction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PredictionList {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
