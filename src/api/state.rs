use crate::core::AppConfig;

pub struct AppState {
    // One client shared across requests so connections are pooled
    pub http: reqwest::Client,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}
