//! Classification contract and score ranking.

use crate::error::ClassifyError;
use crate::{Prediction, PredictionList};
use image::RgbaImage;
use serde::Deserialize;
use std::path::Path;

/// Turns one still image into ranked guesses.
///
/// Implementations return predictions in descending confidence order and
/// never return an empty list; a model with nothing to say is an error.
pub trait Classifier {
    fn classify(&self, image: &RgbaImage) -> Result<PredictionList, ClassifyError>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&self, image: &RgbaImage) -> Result<PredictionList, ClassifyError> {
        (**self).classify(image)
    }
}

/// What the model's output tensor holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    #[default]
    Probabilities,
    Logits,
}

/// Pair raw model scores with labels and rank them.
pub fn rank(
    scores: &[f32],
    labels: &[String],
    top_k: Option<usize>,
    kind: ScoreKind,
) -> Result<PredictionList, ClassifyError> {
    if scores.is_empty() {
        return Err(ClassifyError::NoResults);
    }
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(ClassifyError::InvalidScores { index });
    }
    let probs = match kind {
        ScoreKind::Probabilities => scores.to_vec(),
        ScoreKind::Logits => softmax(scores),
    };

    let mut ranked: Vec<Prediction> = probs
        .into_iter()
        .enumerate()
        .map(|(idx, confidence)| {
            let label = labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class_{idx}"));
            Prediction { label, confidence }
        })
        .collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    if let Some(k) = top_k {
        ranked.truncate(k.max(1));
    }
    Ok(PredictionList::new(ranked))
}

/// Read class labels, one per line, or a JSON array for `.json` files.
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<String>, ClassifyError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ClassifyError::MissingLabels(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ClassifyError::ReadLabels {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let labels: Vec<String> = if is_json {
        let parsed: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| ClassifyError::InvalidLabels {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        parsed
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    } else {
        raw.lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(|l| l.to_string())
            .collect()
    };

    if labels.is_empty() {
        return Err(ClassifyError::InvalidLabels {
            path: path.to_path_buf(),
            message: "no labels".to_string(),
        });
    }
    Ok(labels)
}

pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|x| x / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn softmax_sums_to_one_and_preserves_order() {
        let probs = softmax(&[1.0, 3.0, 2.0]);
        assert_relative_eq!(probs.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert!(probs[1] > probs[2] && probs[2] > probs[0]);
    }

    #[test]
    fn rank_sorts_descending_and_truncates() -> Result<()> {
        let list = rank(
            &[0.40, 0.92, 0.05, 0.81],
            &labels(&["Ocean", "Lake", "Desert", "River"]),
            Some(3),
            ScoreKind::Probabilities,
        )?;
        let got: Vec<(&str, u32)> = list.iter().map(|p| (p.label.as_str(), p.percent())).collect();
        assert_eq!(got, vec![("Lake", 92), ("River", 81), ("Ocean", 40)]);
        Ok(())
    }

    #[test]
    fn rank_applies_softmax_to_logits() -> Result<()> {
        let list = rank(&[0.0, 2.0], &labels(&["a", "b"]), None, ScoreKind::Logits)?;
        assert_eq!(list.first().map(|p| p.label.as_str()), Some("b"));
        let total: f32 = list.iter().map(|p| p.confidence).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn rank_names_unlabelled_classes() -> Result<()> {
        let list = rank(&[0.2, 0.8], &labels(&["only"]), None, ScoreKind::Probabilities)?;
        assert_eq!(list.first().map(|p| p.label.as_str()), Some("class_1"));
        Ok(())
    }

    #[test]
    fn rank_rejects_empty_output() {
        assert!(matches!(
            rank(&[], &[], None, ScoreKind::Probabilities),
            Err(ClassifyError::NoResults)
        ));
    }

    #[rstest]
    #[case(&[f32::NAN, 1.0], ScoreKind::Logits, 0)]
    #[case(&[0.3, f32::NAN], ScoreKind::Probabilities, 1)]
    #[case(&[0.5, f32::INFINITY], ScoreKind::Logits, 1)]
    #[case(&[f32::NEG_INFINITY, 0.5], ScoreKind::Probabilities, 0)]
    fn rank_rejects_non_finite_scores(
        #[case] scores: &[f32],
        #[case] kind: ScoreKind,
        #[case] bad: usize,
    ) {
        match rank(scores, &labels(&["a", "b"]), None, kind) {
            Err(ClassifyError::InvalidScores { index }) => assert_eq!(index, bad),
            other => panic!("expected invalid scores, got {other:?}"),
        }
    }

    #[test]
    fn labels_from_text_and_json() -> Result<()> {
        let dir = tempdir()?;
        let txt = dir.path().join("labels.txt");
        std::fs::write(&txt, "lake\n\n  river \nocean\n")?;
        assert_eq!(load_labels(&txt)?, labels(&["lake", "river", "ocean"]));

        let json = dir.path().join("labels.json");
        std::fs::write(&json, r#"["lake", " ", "river"]"#)?;
        assert_eq!(load_labels(&json)?, labels(&["lake", "river"]));
        Ok(())
    }

    #[test]
    fn empty_or_missing_labels_are_errors() -> Result<()> {
        let dir = tempdir()?;
        let empty = dir.path().join("labels.txt");
        std::fs::write(&empty, "\n  \n")?;
        assert!(matches!(
            load_labels(&empty),
            Err(ClassifyError::InvalidLabels { .. })
        ));
        assert!(matches!(
            load_labels(dir.path().join("nope.txt")),
            Err(ClassifyError::MissingLabels(_))
        ));
        Ok(())
    }
}
