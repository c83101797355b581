//! Fish species classifier
//!
//! Wraps a pretrained convolutional classifier exported to ONNX:
//! - [`checkpoint`] - checkpoint discovery and loading
//! - [`preprocess`] - image decoding and tensor preparation
//! - [`engine`] - forward pass, softmax and top-k ranking

pub mod checkpoint;
mod config;
mod engine;
pub mod preprocess;

pub use config::ClassifierConfig;
pub use engine::{Classification, ClassifierError, FishClassifier, Prediction};
