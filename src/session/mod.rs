pub mod models;
pub mod storage;
mod store;

pub use models::{
    CONTEXT_WINDOW_MESSAGES, ChatSession, DEFAULT_SESSION_TITLE, Message, PersistedState, Role,
};
pub use storage::{FileStorage, MemoryStorage, STORAGE_KEY, StateStorage};
pub use store::{Listener, SessionStore, SharedStore, StoreEvent};
