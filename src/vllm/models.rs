//! Resolves the model identifier to place in completion requests by
//! asking the backend's model-listing endpoint.

use std::sync::RwLock;

use anyhow::{Error, Result, anyhow};
use serde_json::Value;

pub struct ModelResolver {
    http: reqwest::Client,
    api_base_url: String,
    current: RwLock<Option<String>>,
}

impl ModelResolver {
    pub fn new(api_base_url: &str) -> Self {
        ModelResolver {
            http: reqwest::Client::new(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            current: RwLock::new(None),
        }
    }

    /// The last successfully resolved model id, if any. Sends must be
    /// refused while this is None.
    pub fn current(&self) -> Option<String> {
        self.current
            .read()
            .expect("Unable to read resolved model")
            .clone()
    }

    /// Ask the backend which models it serves and cache the first
    /// one. vLLM serves a single model, so the first entry is it.
    pub async fn resolve(&self) -> Result<String, Error> {
        let url = format!("{}/v1/models", self.api_base_url);
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: Value = response.json().await?;

        let model = body["data"][0]["id"]
            .as_str()
            .ok_or(anyhow!("Model listing contained no models: {}", body))?
            .to_string();

        tracing::debug!("Resolved model {}", model);
        *self
            .current
            .write()
            .expect("Unable to write resolved model") = Some(model.clone());
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_caches_first_listed_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"object":"list","data":[{"id":"Qwen/Qwen2.5-7B-Instruct-AWQ","object":"model"}]}"#)
            .create_async()
            .await;

        let resolver = ModelResolver::new(&server.url());
        assert!(resolver.current().is_none());

        let model = resolver.resolve().await.unwrap();
        mock.assert_async().await;
        assert_eq!(model, "Qwen/Qwen2.5-7B-Instruct-AWQ");
        assert_eq!(resolver.current().as_deref(), Some("Qwen/Qwen2.5-7B-Instruct-AWQ"));
    }

    #[tokio::test]
    async fn test_resolve_fails_on_empty_listing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"object":"list","data":[]}"#)
            .create_async()
            .await;

        let resolver = ModelResolver::new(&server.url());
        assert!(resolver.resolve().await.is_err());
        assert!(resolver.current().is_none());
    }

    #[tokio::test]
    async fn test_resolve_fails_when_backend_unreachable() {
        let resolver = ModelResolver::new("http://127.0.0.1:1");
        assert!(resolver.resolve().await.is_err());
        assert!(resolver.current().is_none());
    }
}
