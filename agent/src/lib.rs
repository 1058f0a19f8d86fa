//! Language-model capability and configuration for SoM team orchestration

pub mod config;
pub mod error;
pub mod llm;

pub use config::SomFileConfig;
pub use error::LlmError;
pub use llm::{build_llm, CompletionRequest, Llm, Message, Role};
