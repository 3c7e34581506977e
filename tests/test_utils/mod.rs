//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};

use alergie_chat::api::{AppState, app};
use alergie_chat::core::AppConfig;

/// Creates a test application router pointed at the given inference
/// backend URL.
pub fn test_app(backend_url: &str) -> Router {
    let config = AppConfig {
        vllm_api_url: backend_url.to_string(),
        storage_path: String::from("./"),
        locale: String::from("en"),
    };
    let app_state = AppState::new(config);
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("Response body was not UTF-8")
}

pub async fn body_to_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read response body")
        .to_vec()
}
