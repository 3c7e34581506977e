use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the vLLM OpenAI-compatible endpoint, without the
    /// /v1 suffix.
    pub vllm_api_url: String,
    /// Directory holding the persisted chat state blob.
    pub storage_path: String,
    /// Active locale tag for the prompt and error strings.
    pub locale: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let vllm_api_url = env::var("ALERGIE_VLLM_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
        let storage_path = env::var("ALERGIE_STORAGE_PATH").unwrap_or("./".to_string());
        let locale = env::var("ALERGIE_LOCALE").unwrap_or_else(|_| "en".to_string());

        Self {
            vllm_api_url,
            storage_path,
            locale,
        }
    }
}
