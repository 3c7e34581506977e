//! Integration tests for the vLLM proxy endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::test_utils::{body_to_bytes, body_to_string, test_app};

    /// Tests that GET requests forward the path and return the
    /// backend body and status unchanged
    #[tokio::test]
    async fn it_forwards_get_requests() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"object":"list","data":[{"id":"qwen","object":"model"}]}"#)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vllm/models")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"id\":\"qwen\""));
    }

    /// Tests that the query string is forwarded verbatim
    #[tokio::test]
    async fn it_forwards_the_query_string() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/models")
            .match_query(mockito::Matcher::UrlEncoded(
                "verbose".into(),
                "true".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vllm/models?verbose=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Tests that a backend error status on a GET propagates with
    /// the raw error text in the details field
    #[tokio::test]
    async fn it_propagates_get_backend_error_statuses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/models")
            .with_status(500)
            .with_body("engine crashed")
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vllm/models")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"error\""));
        assert!(body.contains("engine crashed"));
    }

    /// Tests that non-streaming POSTs are forwarded and returned as
    /// buffered JSON
    #[tokio::test]
    async fn it_forwards_buffered_posts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Hi"}}]}"#)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vllm/chat/completions")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "model": "qwen",
                            "messages": [{"role": "user", "content": "hello"}],
                            "stream": false
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"content\":\"Hi\""));
    }

    /// Tests that a streaming POST pipes the backend's body through
    /// byte for byte
    #[tokio::test]
    async fn it_pipes_streaming_responses_through_unmodified() {
        let sse_body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n\
                        data: [DONE]\n\n";

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vllm/chat/completions")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "model": "qwen",
                            "messages": [{"role": "user", "content": "hello"}],
                            "stream": true
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );

        let body = body_to_bytes(response.into_body()).await;
        assert_eq!(body, sse_body.as_bytes());
    }

    /// Tests that a non-200 success status from the backend survives
    /// the streaming passthrough
    #[tokio::test]
    async fn it_keeps_the_backend_success_status_on_streaming_posts() {
        let sse_body = "data: [DONE]\n\n";

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(206)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body)
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vllm/chat/completions")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"model": "qwen", "messages": [], "stream": true})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);

        let body = body_to_bytes(response.into_body()).await;
        assert_eq!(body, sse_body.as_bytes());
    }

    /// Tests that a backend error status propagates with the raw
    /// error text in the structured details field
    #[tokio::test]
    async fn it_propagates_backend_error_statuses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(400)
            .with_body("model not found")
            .create_async()
            .await;

        let app = test_app(&server.url());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vllm/chat/completions")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"model": "missing", "messages": [], "stream": true})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"error\""));
        assert!(body.contains("model not found"));
    }

    /// Tests that an unreachable backend maps to 502 with a
    /// structured error body
    #[tokio::test]
    async fn it_returns_502_when_backend_is_unreachable() {
        let app = test_app("http://127.0.0.1:1");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vllm/chat/completions")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"model": "qwen", "messages": []}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_to_string(response.into_body()).await;
        let error: alergie_chat::api::public::vllm::ProxyError =
            serde_json::from_str(&body).unwrap();
        assert_eq!(error.error, "Failed to reach inference backend");
        assert!(!error.details.is_empty());
    }

    /// Tests that GET transport failures also map to 502
    #[tokio::test]
    async fn it_returns_502_for_unreachable_get() {
        let app = test_app("http://127.0.0.1:1");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vllm/models")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
