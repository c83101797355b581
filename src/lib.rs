//! Fish species classification REST API
//!
//! Serves a pretrained fish-species image classifier over HTTP:
//! - [`classifier`] - checkpoint loading, image preprocessing, inference
//! - [`server`] - axum router, request handlers, configuration
//!
//! The model is loaded once at process start and shared read-only across
//! requests; a missing or broken checkpoint keeps the server up but makes
//! every inference endpoint report a persistent failure.

pub mod classifier;
pub mod server;

pub use classifier::{ClassifierConfig, ClassifierError, FishClassifier, Prediction};
pub use server::{create_router, run_server, AppState, ServerConfig};
