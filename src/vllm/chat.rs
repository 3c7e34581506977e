//! Drives one send/response cycle against the chat completion
//! endpoint, translating the event stream into session store
//! mutations.

use std::time::Duration;

use anyhow::{Error, Result};
use futures_util::StreamExt;

use crate::locale::Locale;
use crate::session::{Role, SharedStore};

use super::core::{LineBuffer, completion_request, delta_from_line};

pub struct ChatClient {
    http: reqwest::Client,
    api_base_url: String,
    locale: Locale,
}

impl ChatClient {
    /// Only the initial dial is bounded; a streaming read has no
    /// overall timeout so long generations are never cut off.
    pub fn new(api_base_url: &str, locale: Locale) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        ChatClient {
            http,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            locale,
        }
    }

    /// Send one user message and stream the response into the store.
    ///
    /// All failure modes are recovered here: they surface as a fixed
    /// localized assistant message in the chat itself, and the
    /// loading/streaming flags are cleared on every exit path.
    pub async fn send_message(
        &self,
        store: &SharedStore,
        model: Option<&str>,
        text: &str,
    ) -> Result<(), Error> {
        // One stream per send action
        if store.read().expect("Unable to read session store").is_busy() {
            tracing::warn!("Ignoring send while a response is in flight");
            return Ok(());
        }

        // Refuse client-side until a model has been resolved
        let Some(model) = model else {
            store
                .write()
                .expect("Unable to write session store")
                .add_message(Role::Assistant, self.locale.no_model_warning());
            return Ok(());
        };

        // Record the user message and bind this stream to its
        // originating session so a mid-stream session switch can't
        // misdirect appends.
        let (session_id, context) = {
            let mut store = store.write().expect("Unable to write session store");
            store.add_message(Role::User, text);
            let session_id = store
                .current_session_id()
                .expect("Current session exists after add_message")
                .to_string();
            let context = store.get_context_window();
            store.set_loading(true);
            (session_id, context)
        };

        let url = format!("{}/v1/chat/completions", self.api_base_url);
        let payload = completion_request(model, &context);
        let response = match self.http.post(url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Completion request failed: {}", e);
                self.fail(store, &session_id);
                return Ok(());
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Inference backend returned {}: {}", status, body);
            self.fail(store, &session_id);
            return Ok(());
        }

        // The placeholder fills in-place as fragments arrive
        let placeholder_id = {
            let mut store = store.write().expect("Unable to write session store");
            let placeholder_id = store.add_message_to(&session_id, Role::Assistant, "");
            store.set_loading(false);
            store.set_streaming(true);
            placeholder_id
        };
        let Some(placeholder_id) = placeholder_id else {
            // The session was deleted while the request was in flight
            self.finish(store);
            return Ok(());
        };

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::new();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::error!("Reading completion stream failed: {}", e);
                    break;
                }
            };
            for line in lines.push(&chunk) {
                if let Some(fragment) = delta_from_line(&line) {
                    store
                        .write()
                        .expect("Unable to write session store")
                        .append_to_message_in(&session_id, &placeholder_id, &fragment);
                }
            }
        }

        self.finish(store);
        Ok(())
    }

    /// Surface a failed send as an assistant message in the
    /// originating session and clear the flags.
    fn fail(&self, store: &SharedStore, session_id: &str) {
        let mut store = store.write().expect("Unable to write session store");
        store.add_message_to(session_id, Role::Assistant, self.locale.connection_error());
        store.set_loading(false);
        store.set_streaming(false);
    }

    fn finish(&self, store: &SharedStore) {
        let mut store = store.write().expect("Unable to write session store");
        store.set_streaming(false);
        store.set_loading(false);
    }
}
