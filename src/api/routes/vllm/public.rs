//! Public types for the vLLM proxy API
use serde::{Deserialize, Serialize};

/// Structured error body returned when the backend can't be reached
/// or reports an error status.
#[derive(Serialize, Deserialize)]
pub struct ProxyError {
    pub error: String,
    pub details: String,
}
