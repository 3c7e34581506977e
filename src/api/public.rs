//! Public API types

// Re-export public types from each route

pub mod vllm {
    pub use crate::api::routes::vllm::public::*;
}
