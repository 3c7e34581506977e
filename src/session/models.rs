use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Placeholder title for a session that has not yet received a user
/// message (or was cleared).
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Number of trailing messages included in the context window sent to
/// the inference backend.
pub const CONTEXT_WINDOW_MESSAGES: usize = 10;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Creation time in milliseconds since the epoch. Set once.
    pub timestamp: i64,
}

impl Message {
    pub fn new(id: String, role: Role, content: &str) -> Self {
        Message {
            id,
            role,
            content: content.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl ChatSession {
    pub fn new() -> Self {
        let now = Utc::now().timestamp_millis();
        ChatSession {
            id: uuid::Uuid::new_v4().to_string(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// The only shape written to durable storage. Transient UI flags are
/// intentionally not part of this.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PersistedState {
    pub sessions: Vec<ChatSession>,
    #[serde(rename = "currentSessionId")]
    pub current_session_id: Option<String>,
}

/// Derive a session title from the first user message: newlines are
/// collapsed to spaces and the result is capped at 30 characters with
/// an ellipsis suffix when it was longer.
pub fn derive_title(content: &str) -> String {
    let flat = content.replace('\n', " ");
    let mut title: String = flat.chars().take(30).collect();
    if flat.chars().count() > 30 {
        title.push_str("...");
    }
    title
}
