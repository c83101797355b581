//! Classifier configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for checkpoint discovery and inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Explicit checkpoint path, tried before the candidates
    pub model_path: Option<PathBuf>,

    /// Candidate checkpoint locations, first existing wins
    pub candidate_paths: Vec<PathBuf>,

    /// Shorter image side is scaled to this before cropping
    pub resize_edge: u32,

    /// Side length of the square center crop fed to the network
    pub input_size: u32,

    /// Number of top classes returned per prediction
    pub top_k: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: std::env::var("MODEL_PATH").ok().map(PathBuf::from),
            candidate_paths: vec![
                PathBuf::from("models/fish_classifier.onnx"),
                PathBuf::from("../models/fish_classifier.onnx"),
                PathBuf::from("fish_classifier.onnx"),
            ],
            resize_edge: 256,
            input_size: 224,
            top_k: 3,
        }
    }
}

impl ClassifierConfig {
    /// Path of the label mapping file that accompanies a checkpoint
    pub fn labels_path_for(model_path: &std::path::Path) -> PathBuf {
        model_path.with_extension("classes.json")
    }
}
