//! Inference engine
//!
//! Holds the runnable model and the label mapping, both immutable after
//! load. `classify` is a bounded synchronous computation over a single
//! image: preprocess, forward pass, softmax, top-k ranking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::Serialize;
use thiserror::Error;
use tract_onnx::prelude::*;

use super::checkpoint::{self, Checkpoint};
use super::preprocess::preprocess;
use super::ClassifierConfig;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("preprocessing failed: {0}")]
    Preprocess(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// One ranked class prediction
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub species: String,
    /// Softmax probability as a percentage in `[0, 100]`
    pub confidence: f64,
    pub class_id: usize,
}

/// Result of classifying one image
pub struct Classification {
    /// Top-k predictions, descending by confidence
    pub predictions: Vec<Prediction>,
    /// The decoded (pre-resize) image, for re-encoding back to the client
    pub image: RgbImage,
}

/// Pretrained fish species classifier
pub struct FishClassifier {
    model: TypedRunnableModel<TypedModel>,
    labels: BTreeMap<usize, String>,
    config: ClassifierConfig,
    checkpoint_path: PathBuf,
}

impl std::fmt::Debug for FishClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FishClassifier")
            .field("checkpoint_path", &self.checkpoint_path)
            .field("num_classes", &self.labels.len())
            .field("top_k", &self.config.top_k)
            .finish()
    }
}

impl FishClassifier {
    /// Load the classifier from the first checkpoint `config` resolves.
    pub fn load(config: &ClassifierConfig) -> anyhow::Result<Self> {
        let Checkpoint { model, labels, path } = checkpoint::load(config)?;
        Ok(Self {
            model,
            labels,
            config: config.clone(),
            checkpoint_path: path,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &BTreeMap<usize, String> {
        &self.labels
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    /// Classify one image, returning the top-k predictions and the decoded
    /// image. Deterministic for identical input bytes.
    pub fn classify(&self, bytes: &[u8]) -> Result<Classification, ClassifierError> {
        let (input, image) = preprocess(bytes, self.config.resize_edge, self.config.input_size)?;

        let outputs = self
            .model
            .run(tvec!(input.into_tensor().into()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let logits = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let logits: Vec<f32> = logits.iter().copied().collect();

        let probabilities = softmax(&logits);
        let ranked = top_k(&probabilities, self.config.top_k);
        let predictions = assemble_predictions(&self.labels, &ranked);

        Ok(Classification { predictions, image })
    }
}

/// Numerically stable softmax over the full class dimension
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Indices of the `k` largest probabilities, descending. The sort is stable,
/// so equal probabilities keep ascending index order.
fn top_k(probabilities: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);
    ranked
}

fn assemble_predictions(
    labels: &BTreeMap<usize, String>,
    ranked: &[(usize, f32)],
) -> Vec<Prediction> {
    ranked
        .iter()
        .map(|&(class_id, probability)| Prediction {
            species: labels
                .get(&class_id)
                .cloned()
                .unwrap_or_else(|| format!("Class_{class_id}")),
            confidence: f64::from(probability) * 100.0,
            class_id,
        })
        .collect()
}
