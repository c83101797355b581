//! HTTP request handlers

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    http::HeaderMap,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::json;
use tracing::info;

use crate::classifier::Classification;

use super::error::{ApiError, Result};
use super::state::AppState;

/// File extensions accepted by the upload endpoint
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "avif"];

// ============================================================================
// Info Handlers
// ============================================================================

/// Landing route advertising the endpoint map
pub async fn home() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Fish Classification API",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "predict": "/predict (POST)",
            "upload": "/upload (POST)",
        },
    }))
}

/// Liveness probe; never fails, even with the model absent
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": state.classifier.is_some(),
        "num_classes": state.num_classes(),
    }))
}

/// Metadata about the loaded model
pub async fn model_info(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    let classifier = state.classifier.as_ref().ok_or(ApiError::ModelUnavailable)?;

    let sample_classes: Vec<&str> = classifier
        .labels()
        .values()
        .take(10)
        .map(String::as_str)
        .collect();

    Ok(Json(json!({
        "model_loaded": true,
        "num_classes": classifier.num_classes(),
        "sample_classes": sample_classes,
        "device": "cpu",
    })))
}

/// All known species classes
pub async fn list_classes(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    let classifier = state.classifier.as_ref().ok_or(ApiError::ModelUnavailable)?;

    let classes: Vec<serde_json::Value> = classifier
        .labels()
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name }))
        .collect();

    Ok(Json(json!({
        "success": true,
        "total": classes.len(),
        "classes": classes,
    })))
}

// ============================================================================
// Prediction Handlers
// ============================================================================

/// Classify a base64-encoded image carried in a JSON body
pub async fn predict(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    // Missing JSON content-type and unparseable bodies both get the API's
    // 400 error shape, not the framework's plain-text rejection.
    let Json(body) =
        body.map_err(|_| ApiError::BadRequest("Request must be JSON".to_string()))?;

    let image_data = body
        .get("image")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::BadRequest("No image provided".to_string()))?;

    let image_bytes = BASE64
        .decode(strip_data_uri_prefix(image_data))
        .map_err(|e| ApiError::Decode(e.to_string()))?;

    let classifier = state.classifier.as_ref().ok_or(ApiError::ModelUnavailable)?;
    let Classification { predictions, image } = classifier.classify(&image_bytes)?;

    let timestamp = headers
        .get("x-request-timestamp")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    Ok(Json(json!({
        "success": true,
        "top_prediction": predictions.first(),
        "predictions": predictions,
        "processed_image": image_to_data_uri(image)?,
        "timestamp": timestamp,
    })))
}

/// Classify an uploaded image file and persist the raw bytes
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        if file_name.is_empty() {
            return Err(ApiError::BadRequest("No file selected".to_string()));
        }
        if !allowed_file(&file_name) {
            return Err(ApiError::BadRequest(format!(
                "File type not allowed. Allowed types: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        info!(file = %file_name, bytes = data.len(), "Received upload");

        let classifier = state.classifier.as_ref().ok_or(ApiError::ModelUnavailable)?;
        let Classification { predictions, image } = classifier.classify(&data)?;

        // Same sanitized name silently overwrites an earlier upload.
        let filename = sanitize_filename(&file_name);
        let path = std::path::Path::new(&state.config.upload_dir).join(&filename);
        tokio::fs::write(&path, &data).await?;

        return Ok(Json(json!({
            "success": true,
            "filename": filename,
            "top_prediction": predictions.first(),
            "predictions": predictions,
            "processed_image": image_to_data_uri(image)?,
        })));
    }

    Err(ApiError::BadRequest("No file provided".to_string()))
}

// ============================================================================
// Helpers
// ============================================================================

/// Drop a `data:<mime>;base64,` prefix, leaving the payload untouched when
/// none is present
fn strip_data_uri_prefix(data: &str) -> &str {
    match data.split_once("base64,") {
        Some((_, payload)) => payload,
        None => data,
    }
}

/// Re-encode the decoded image as a JPEG data URI for embedding in JSON
fn image_to_data_uri(image: RgbImage) -> Result<String> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .map_err(|e| ApiError::Internal(format!("JPEG encoding failed: {e}")))?;
    Ok(format!(
        "data:image/jpeg;base64,{}",
        BASE64.encode(buf.into_inner())
    ))
}

fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied filename to a safe basename: path components are
/// stripped, spaces become underscores, anything outside `[A-Za-z0-9._-]` is
/// dropped, and leading dots are removed.
fn sanitize_filename(filename: &str) -> String {
    let basename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned: String = basename
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
