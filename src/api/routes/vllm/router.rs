//! Router for the vLLM proxy API
//!
//! A transparent relay between the browser-facing origin and the
//! internal-only inference endpoint. No authentication, rate
//! limiting, retry, or caching happens here.

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    body::Body,
    extract::{Path, RawQuery, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;

use super::public::ProxyError;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

fn backend(state: &SharedState) -> (reqwest::Client, String) {
    let state = state.read().expect("Unable to read shared state");
    (state.http.clone(), state.config.vllm_api_url.clone())
}

fn backend_url(base: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!("{}/v1/{}", base.trim_end_matches('/'), path);
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn bad_gateway(error: &str, details: String) -> Response {
    tracing::error!("{}: {}", error, details);
    (
        StatusCode::BAD_GATEWAY,
        axum::Json(ProxyError {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

/// Forward a GET verbatim and return the backend's JSON body and
/// status unchanged.
async fn forward_get(
    State(state): State<SharedState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let (http, base) = backend(&state);
    let url = backend_url(&base, &path, query.as_deref());

    let response = match http.get(&url).send().await {
        Ok(response) => response,
        Err(e) => return bad_gateway("Failed to reach inference backend", e.to_string()),
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    if !response.status().is_success() {
        let details = response.text().await.unwrap_or_default();
        tracing::error!("Inference backend returned {}: {}", status, details);
        return (
            status,
            axum::Json(ProxyError {
                error: "Inference backend returned an error".to_string(),
                details,
            }),
        )
            .into_response();
    }

    match response.json::<Value>().await {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(e) => bad_gateway("Invalid response from inference backend", e.to_string()),
    }
}

/// Forward a POST. A body requesting streaming gets the backend's
/// byte stream piped through untouched; anything else is returned as
/// buffered JSON. Backend error statuses propagate with the raw error
/// text in the details field.
async fn forward_post(
    State(state): State<SharedState>,
    Path(path): Path<String>,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    let (http, base) = backend(&state);
    let url = backend_url(&base, &path, None);
    let wants_stream = body
        .get("stream")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let response = match http.post(&url).json(&body).send().await {
        Ok(response) => response,
        Err(e) => return bad_gateway("Failed to reach inference backend", e.to_string()),
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    if !response.status().is_success() {
        let details = response.text().await.unwrap_or_default();
        tracing::error!("Inference backend returned {}: {}", status, details);
        return (
            status,
            axum::Json(ProxyError {
                error: "Inference backend returned an error".to_string(),
                details,
            }),
        )
            .into_response();
    }

    if wants_stream {
        // Pipe the event stream through without parsing or reframing
        let mut piped = Response::new(Body::from_stream(response.bytes_stream()));
        *piped.status_mut() = status;
        let headers = piped.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        return piped;
    }

    match response.json::<Value>().await {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(e) => bad_gateway("Invalid response from inference backend", e.to_string()),
    }
}

/// Create the vLLM proxy router
pub fn router() -> Router<SharedState> {
    Router::new().route("/{*path}", get(forward_get).post(forward_post))
}
