//! Application state
//!
//! The classifier is loaded once at startup and read-only afterwards, so
//! handlers share it through an `Arc<AppState>` without locking. A load
//! failure leaves the classifier absent; the server still runs and inference
//! endpoints report the model as unavailable.

use tracing::{info, warn};

use crate::classifier::FishClassifier;

use super::ServerConfig;

/// State shared across handlers, immutable after construction
pub struct AppState {
    pub config: ServerConfig,
    pub classifier: Option<FishClassifier>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let classifier = match FishClassifier::load(&config.classifier) {
            Ok(classifier) => {
                info!(
                    checkpoint = %classifier.checkpoint_path().display(),
                    num_classes = classifier.num_classes(),
                    "Classifier ready"
                );
                Some(classifier)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Model failed to load; server will run but predictions will fail"
                );
                None
            }
        };

        Self { config, classifier }
    }

    pub fn num_classes(&self) -> usize {
        self.classifier
            .as_ref()
            .map(FishClassifier::num_classes)
            .unwrap_or(0)
    }
}
