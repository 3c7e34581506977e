pub mod api;
pub mod cli;
pub mod core;
pub mod locale;
pub mod session;
pub mod vllm;
