//! ONNX Runtime image classifier.

use crate::PredictionList;
use crate::classifier::{Classifier, ScoreKind, load_labels, rank};
use crate::config::ClassifierConfig;
use crate::error::ClassifyError;
use crate::preprocess::{resize_to_square, to_nchw_tensor};
use image::RgbaImage;
use ndarray::CowArray;
use once_cell::sync::OnceCell;
use ort::{
    GraphOptimizationLevel, SessionBuilder, environment::Environment, session::Session,
    tensor::OrtOwnedTensor, value::Value,
};
use std::sync::Arc;

static ORT_ENV: OnceCell<Arc<Environment>> = OnceCell::new();

fn environment() -> Result<Arc<Environment>, ClassifyError> {
    ORT_ENV
        .get_or_try_init(|| {
            Environment::builder()
                .with_name("camera-classifier")
                .build()
                .map(|env| env.into_arc())
        })
        .cloned()
        .map_err(runtime)
}

fn runtime(err: impl std::fmt::Display) -> ClassifyError {
    ClassifyError::Runtime(err.to_string())
}

/// Single-input image classifier backed by ONNX Runtime.
pub struct OnnxClassifier {
    session: Session,
    labels: Vec<String>,
    input_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
    output: ScoreKind,
    top_k: Option<usize>,
}

impl OnnxClassifier {
    pub fn new(cfg: &ClassifierConfig) -> Result<Self, ClassifyError> {
        if !cfg.model_path.exists() {
            return Err(ClassifyError::MissingModel(cfg.model_path.clone()));
        }
        let labels = load_labels(&cfg.labels_path)?;

        let env = environment()?;
        let session = SessionBuilder::new(&env)
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level1))
            .and_then(|b| b.with_model_from_file(&cfg.model_path))
            .map_err(runtime)?;
        tracing::info!(
            "Loaded model {} with {} labels",
            cfg.model_path.display(),
            labels.len()
        );

        Ok(Self {
            session,
            labels,
            input_size: cfg.input_size,
            mean: cfg.mean,
            std: cfg.std,
            output: cfg.output,
            top_k: cfg.top_k,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, image: &RgbaImage) -> Result<PredictionList, ClassifyError> {
        let resized = resize_to_square(image, self.input_size);
        let tensor = to_nchw_tensor(&resized, self.mean, self.std).into_dyn();
        let cow = CowArray::from(tensor.view());
        let input = Value::from_array(self.session.allocator(), &cow).map_err(runtime)?;
        let outputs: Vec<Value> = self.session.run(vec![input]).map_err(runtime)?;
        let Some(first) = outputs.first() else {
            return Err(ClassifyError::NoResults);
        };
        let scores: OrtOwnedTensor<f32, _> = first.try_extract().map_err(runtime)?;
        let scores: Vec<f32> = scores.view().iter().cloned().collect();

        let ranked = rank(&scores, &self.labels, self.top_k, self.output)?;
        if let Some(best) = ranked.first() {
            tracing::info!("Top guess {} ({})", best.label, best.percent_text());
        }
        Ok(ranked)
    }
}
