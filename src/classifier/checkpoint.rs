//! Checkpoint discovery and loading
//!
//! A checkpoint is an ONNX graph (weights plus architecture) with a sidecar
//! label file next to it (`<stem>.classes.json`) carrying the
//! index-to-species and species-to-index mappings. The classifier's output
//! width is derived from the label mapping cardinality and verified against
//! the graph, never hardcoded.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::info;
use tract_onnx::prelude::*;

use super::ClassifierConfig;

/// A loaded, runnable checkpoint
pub struct Checkpoint {
    pub model: TypedRunnableModel<TypedModel>,
    pub labels: BTreeMap<usize, String>,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct LabelFile {
    idx_to_class: BTreeMap<usize, String>,
    #[serde(default)]
    #[allow(dead_code)]
    class_to_idx: BTreeMap<String, usize>,
}

/// Return the first configured checkpoint path that exists on disk
pub fn resolve_checkpoint_path(config: &ClassifierConfig) -> Option<PathBuf> {
    config
        .model_path
        .iter()
        .chain(config.candidate_paths.iter())
        .find(|p| p.exists())
        .cloned()
}

/// Load the checkpoint described by `config`.
///
/// Errors are returned rather than logged here; the caller decides whether a
/// missing model is fatal (the server treats it as a soft failure).
pub fn load(config: &ClassifierConfig) -> anyhow::Result<Checkpoint> {
    let path = resolve_checkpoint_path(config)
        .ok_or_else(|| anyhow::anyhow!("model checkpoint not found in any candidate path"))?;

    let labels = load_labels(&ClassifierConfig::labels_path_for(&path))?;
    if labels.is_empty() {
        bail!("label mapping in {} is empty", path.display());
    }

    let size = config.input_size as i64;
    let model = tract_onnx::onnx()
        .model_for_path(&path)
        .with_context(|| format!("failed to read ONNX graph from {}", path.display()))?
        .with_input_fact(
            0,
            InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
        )?
        .into_optimized()?;

    // The final layer must be sized by the label mapping, not a constant.
    let output_width = model
        .output_fact(0)?
        .shape
        .as_concrete()
        .and_then(|shape| shape.last().copied())
        .ok_or_else(|| anyhow::anyhow!("model output shape is not concrete"))?;
    if output_width != labels.len() {
        bail!(
            "checkpoint declares {} classes but model outputs {}",
            labels.len(),
            output_width
        );
    }

    let model = model.into_runnable()?;

    info!(
        path = %path.display(),
        num_classes = labels.len(),
        "Model loaded successfully"
    );

    Ok(Checkpoint { model, labels, path })
}

fn load_labels(path: &Path) -> anyhow::Result<BTreeMap<usize, String>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open label mapping {}", path.display()))?;
    let labels: LabelFile = serde_json::from_reader(file)
        .with_context(|| format!("failed to parse label mapping {}", path.display()))?;
    Ok(labels.idx_to_class)
}
