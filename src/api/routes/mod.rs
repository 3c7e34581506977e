//! API routes module

pub mod vllm;

use std::sync::{Arc, RwLock};

use axum::Router;

use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Inference backend proxy routes
        .nest("/vllm", vllm::router())
}
