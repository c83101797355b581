//! Integration test: API endpoints
//!
//! These run without a model checkpoint on disk, exercising the soft-failure
//! contract: the server answers health checks and validation errors while
//! every inference path reports the model as unavailable.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use fishid::{create_router, AppState, ClassifierConfig, ServerConfig};
use tower::ServiceExt;

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        upload_dir: "/tmp/fishid-test-uploads".to_string(),
        max_upload_size: 16 * 1024 * 1024,
        classifier: ClassifierConfig {
            model_path: Some(PathBuf::from("/nonexistent/fish_classifier.onnx")),
            candidate_paths: vec![PathBuf::from("/nonexistent/either.onnx")],
            ..ClassifierConfig::default()
        },
    }
}

fn test_app() -> axum::Router {
    let config = test_config();
    std::fs::create_dir_all(&config.upload_dir).ok();
    let state = Arc::new(AppState::new(config.clone()));
    create_router(state, &config)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_lists_endpoints() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "running");
    assert!(body["endpoints"]["predict"].is_string());
}

#[tokio::test]
async fn health_never_fails_without_model() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["num_classes"], 0);
}

#[tokio::test]
async fn predict_without_image_key_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"not_image": "zzz"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Error shape, not success shape: an `error` text and no `success` key.
    let body = body_json(response).await;
    assert!(body["error"].is_string());
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn predict_without_json_content_type_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("just text"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Request must be JSON");
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn predict_with_malformed_json_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Request must be JSON");
}

#[tokio::test]
async fn predict_without_model_reports_failure() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/json")
                // Valid base64, so the request reaches the model check.
                .body(Body::from(r#"{"image": "aGVsbG8gZmlzaA=="}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

fn multipart_request(filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "fishid-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn upload_rejects_disallowed_extension() {
    let app = test_app();
    let response = app
        .oneshot(multipart_request("malware.exe", b"not an image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Allowed types"), "got: {error}");
    assert!(error.contains("png") && error.contains("jpg"));
}

#[tokio::test]
async fn upload_without_file_part_is_bad_request() {
    let boundary = "fishid-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let app = test_app();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "No file provided");
}

#[tokio::test]
async fn upload_without_model_reports_failure() {
    let app = test_app();
    let response = app
        .oneshot(multipart_request("fish.png", b"pretend png bytes"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn model_info_fails_when_model_absent() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/model-info").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Model not loaded");
}

#[tokio::test]
async fn classes_fails_when_model_absent() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/classes").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_is_405() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/predict").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
