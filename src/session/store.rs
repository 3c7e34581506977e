//! The session store: single source of truth for chat sessions,
//! their messages, and the transient loading/streaming flags. The
//! store is the sole writer of persisted chat state.

use chrono::Utc;

use crate::locale::PromptProvider;

use super::models::{
    CONTEXT_WINDOW_MESSAGES, ChatSession, DEFAULT_SESSION_TITLE, Message, PersistedState, Role,
    derive_title,
};
use super::storage::{STORAGE_KEY, StateStorage};

/// Emitted to subscribers after every mutation.
#[derive(Clone, Debug)]
pub enum StoreEvent {
    SessionCreated { session_id: String },
    SessionSwitched { session_id: Option<String> },
    SessionDeleted { session_id: String },
    SessionRenamed { session_id: String },
    SessionCleared { session_id: String },
    MessageAdded {
        session_id: String,
        message_id: String,
        role: Role,
        content: String,
    },
    MessageUpdated {
        session_id: String,
        message_id: String,
    },
    MessageAppended {
        session_id: String,
        message_id: String,
        fragment: String,
    },
    FlagsChanged { loading: bool, streaming: bool },
}

pub type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

/// Shared handle to the store used by the UI layer and the streaming
/// consumer.
pub type SharedStore = std::sync::Arc<std::sync::RwLock<SessionStore>>;

pub struct SessionStore {
    sessions: Vec<ChatSession>,
    current_session_id: Option<String>,
    loading: bool,
    streaming: bool,
    next_message_id: u64,
    prompts: Box<dyn PromptProvider + Send + Sync>,
    storage: Box<dyn StateStorage + Send + Sync>,
    listeners: Vec<Listener>,
}

impl SessionStore {
    /// Load persisted state from storage. A missing or unparseable
    /// record falls back to the empty state rather than failing.
    pub fn new(
        storage: Box<dyn StateStorage + Send + Sync>,
        prompts: Box<dyn PromptProvider + Send + Sync>,
    ) -> Self {
        let state = match storage.load(STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<PersistedState>(&raw).unwrap_or_else(|e| {
                tracing::warn!("Discarding unparseable chat state: {}", e);
                PersistedState::default()
            }),
            Ok(None) => PersistedState::default(),
            Err(e) => {
                tracing::warn!("Failed to load chat state: {}", e);
                PersistedState::default()
            }
        };

        // Message ids are monotonic. Pick up after the largest id
        // found in the persisted state.
        let next_message_id = state
            .sessions
            .iter()
            .flat_map(|s| s.messages.iter())
            .filter_map(|m| m.id.strip_prefix("msg-").and_then(|n| n.parse().ok()))
            .max()
            .map(|n: u64| n + 1)
            .unwrap_or(1);

        SessionStore {
            sessions: state.sessions,
            current_session_id: state.current_session_id,
            loading: false,
            streaming: false,
            next_message_id,
            prompts,
            storage,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        let id = self.current_session_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// True while a send is in flight. The UI gates new sends on this.
    pub fn is_busy(&self) -> bool {
        self.loading || self.streaming
    }

    /// Create a new session and make it current. Reuses an existing
    /// empty session if one exists so repeated new-chat actions don't
    /// accumulate empty sessions.
    pub fn create_session(&mut self) -> String {
        if let Some(existing) = self.sessions.iter().find(|s| s.messages.is_empty()) {
            let id = existing.id.clone();
            self.current_session_id = Some(id.clone());
            self.persist();
            self.notify(&StoreEvent::SessionSwitched {
                session_id: Some(id.clone()),
            });
            return id;
        }

        let session = ChatSession::new();
        let id = session.id.clone();
        // Most-recent-first ordering
        self.sessions.insert(0, session);
        self.current_session_id = Some(id.clone());
        self.persist();
        self.notify(&StoreEvent::SessionCreated {
            session_id: id.clone(),
        });
        id
    }

    /// Set the current session pointer. No existence validation.
    pub fn switch_session(&mut self, session_id: &str) {
        self.current_session_id = Some(session_id.to_string());
        self.persist();
        self.notify(&StoreEvent::SessionSwitched {
            session_id: Some(session_id.to_string()),
        });
    }

    /// Remove a session. If it was current, the first remaining
    /// session (in stored order) becomes current, or none remain.
    pub fn delete_session(&mut self, session_id: &str) {
        self.sessions.retain(|s| s.id != session_id);
        if self.current_session_id.as_deref() == Some(session_id) {
            self.current_session_id = self.sessions.first().map(|s| s.id.clone());
        }
        self.persist();
        self.notify(&StoreEvent::SessionDeleted {
            session_id: session_id.to_string(),
        });
    }

    /// Overwrite a session's title. The store performs no validation;
    /// rejecting empty titles is the caller's job.
    pub fn rename_session(&mut self, session_id: &str, title: &str) {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return;
        };
        session.title = title.to_string();
        session.updated_at = Utc::now().timestamp_millis();
        self.persist();
        self.notify(&StoreEvent::SessionRenamed {
            session_id: session_id.to_string(),
        });
    }

    /// Append a message to the current session, creating a session
    /// first if none exists. Returns the new message id.
    pub fn add_message(&mut self, role: Role, content: &str) -> String {
        let session_id = match self.current_session().map(|s| s.id.clone()) {
            Some(id) => id,
            None => self.create_session(),
        };
        self.add_message_to(&session_id, role, content)
            .expect("Session exists after create_session")
    }

    /// Append a message to a specific session. Streaming responses
    /// address their originating session by id so a session switch
    /// mid-stream cannot misdirect output. Returns None if the
    /// session no longer exists.
    pub fn add_message_to(
        &mut self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Option<String> {
        let message_id = format!("msg-{}", self.next_message_id);
        let session = self.sessions.iter_mut().find(|s| s.id == session_id)?;
        self.next_message_id += 1;

        // The first user message names the session, unless it was
        // renamed explicitly before that.
        if role == Role::User
            && session.title == DEFAULT_SESSION_TITLE
            && !session.messages.iter().any(|m| m.role == Role::User)
        {
            session.title = derive_title(content);
        }

        session
            .messages
            .push(Message::new(message_id.clone(), role, content));
        session.updated_at = Utc::now().timestamp_millis();
        self.persist();
        self.notify(&StoreEvent::MessageAdded {
            session_id: session_id.to_string(),
            message_id: message_id.clone(),
            role,
            content: content.to_string(),
        });
        Some(message_id)
    }

    /// Replace the full content of a message in the current session.
    /// No-op if not found.
    pub fn update_message(&mut self, message_id: &str, content: &str) {
        let Some(session_id) = self.current_session_id.clone() else {
            return;
        };
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return;
        };
        let Some(message) = session.messages.iter_mut().find(|m| m.id == message_id) else {
            return;
        };
        message.content = content.to_string();
        session.updated_at = Utc::now().timestamp_millis();
        self.persist();
        self.notify(&StoreEvent::MessageUpdated {
            session_id,
            message_id: message_id.to_string(),
        });
    }

    /// Concatenate a fragment onto a message in the current session.
    pub fn append_to_message(&mut self, message_id: &str, fragment: &str) {
        let Some(session_id) = self.current_session_id.clone() else {
            return;
        };
        self.append_to_message_in(&session_id, message_id, fragment);
    }

    /// Concatenate a fragment onto a message in a specific session.
    /// This is the only mutation used during streaming and is called
    /// once per arriving fragment. No-op if the target is missing.
    pub fn append_to_message_in(&mut self, session_id: &str, message_id: &str, fragment: &str) {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return;
        };
        let Some(message) = session.messages.iter_mut().find(|m| m.id == message_id) else {
            return;
        };
        message.content.push_str(fragment);
        session.updated_at = Utc::now().timestamp_millis();
        self.persist();
        self.notify(&StoreEvent::MessageAppended {
            session_id: session_id.to_string(),
            message_id: message_id.to_string(),
            fragment: fragment.to_string(),
        });
    }

    /// The bounded prompt sent to the inference backend: a
    /// synthesized system message followed by the most recent
    /// messages of the current session, oldest first. This is a fixed
    /// sliding window, not token-budget-aware truncation.
    pub fn get_context_window(&self) -> Vec<Message> {
        let mut window = vec![Message::new(
            "system".to_string(),
            Role::System,
            &self.prompts.system_prompt(),
        )];
        if let Some(session) = self.current_session() {
            let skip = session.messages.len().saturating_sub(CONTEXT_WINDOW_MESSAGES);
            window.extend(session.messages.iter().skip(skip).cloned());
        }
        window
    }

    /// Empty the current session and reset its title to the default
    /// placeholder. No-op if there is no current session.
    pub fn clear_session(&mut self) {
        let Some(session_id) = self.current_session_id.clone() else {
            return;
        };
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return;
        };
        session.messages.clear();
        session.title = DEFAULT_SESSION_TITLE.to_string();
        session.updated_at = Utc::now().timestamp_millis();
        self.persist();
        self.notify(&StoreEvent::SessionCleared { session_id });
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.notify(&StoreEvent::FlagsChanged {
            loading: self.loading,
            streaming: self.streaming,
        });
    }

    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
        self.notify(&StoreEvent::FlagsChanged {
            loading: self.loading,
            streaming: self.streaming,
        });
    }

    /// Persist sessions and the current session pointer. Best-effort:
    /// failures are logged, never surfaced to callers.
    fn persist(&self) {
        let state = PersistedState {
            sessions: self.sessions.clone(),
            current_session_id: self.current_session_id.clone(),
        };
        let raw = match serde_json::to_string(&state) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Failed to serialize chat state: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.save(STORAGE_KEY, &raw) {
            tracing::error!("Failed to persist chat state: {}", e);
        }
    }

    fn notify(&self, event: &StoreEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}
