mod chat;
mod core;
mod models;

pub use chat::ChatClient;
pub use models::ModelResolver;
pub use self::core::{LineBuffer, completion_request, delta_from_line};
