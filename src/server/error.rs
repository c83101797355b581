//! Error types for the API
//!
//! A closed set of error kinds with safe user-facing messages. Internal
//! detail goes to the structured log, never to the client. Validation
//! errors respond `400 {"error": ...}` (no `success` key); everything else
//! responds `500 {"success": false, "error": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::classifier::ClassifierError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Image decoding failed: {0}")]
    Decode(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Decode(e) => ApiError::Decode(e.to_string()),
            ClassifierError::Preprocess(msg) => ApiError::Decode(msg),
            ClassifierError::Inference(msg) => ApiError::Inference(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::ModelUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Model not loaded".to_string())
            }
            ApiError::Decode(detail) => {
                tracing::error!(detail = %detail, "Image decoding failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not decode the supplied image".to_string(),
                )
            }
            ApiError::Inference(detail) => {
                tracing::error!(detail = %detail, "Inference failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Prediction failed".to_string())
            }
            ApiError::Io(e) => {
                tracing::error!(detail = %e, "IO error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A file system error occurred".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        // 400s carry only the error text; 500s carry the success flag too.
        let body = if status == StatusCode::BAD_REQUEST {
            Json(json!({ "error": message }))
        } else {
            Json(json!({ "success": false, "error": message }))
        };

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
