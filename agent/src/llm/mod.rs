//! LLM abstraction layer
//!
//! Teams see the model as an opaque completion capability: a role-tagged
//! prompt goes in, text comes out, or an [`LlmError`] says why not.

mod offline;
#[cfg(feature = "ollama")]
mod ollama;
#[cfg(feature = "openai")]
mod openai;

pub use offline::OfflineLlm;
#[cfg(feature = "ollama")]
pub use ollama::OllamaClient;
#[cfg(feature = "openai")]
pub use openai::OpenAiClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{LlmConfig, Provider};
use crate::error::LlmError;

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A completion request with optional per-call sampling overrides
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    /// Overrides the backend's default model
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Trait for LLM backends
#[async_trait]
pub trait Llm: Send + Sync {
    /// Run a completion over the given messages
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Send a single message and get a response
    async fn chat(&self, message: &str) -> Result<String, LlmError> {
        self.complete(&CompletionRequest::new(vec![Message::user(message)]))
            .await
    }

    /// Get the default model name
    fn model(&self) -> &str;
}

/// Build the backend selected in configuration
///
/// The API key, when the provider needs one, is read from the environment
/// variable named in `config.api_key_env` here and nowhere else.
pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn Llm>, LlmError> {
    tracing::debug!(provider = ?config.provider, model = %config.model, "Building LLM backend");
    match config.provider {
        Provider::Offline => Ok(Arc::new(OfflineLlm::new(&config.model))),
        #[cfg(feature = "openai")]
        Provider::OpenAi => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                LlmError::Config(format!(
                    "environment variable {} is not set",
                    config.api_key_env
                ))
            })?;
            Ok(Arc::new(OpenAiClient::new(config, api_key)?))
        }
        #[cfg(feature = "ollama")]
        Provider::Ollama => Ok(Arc::new(OllamaClient::new(config))),
        #[allow(unreachable_patterns)]
        other => Err(LlmError::Config(format!(
            "provider {:?} is not compiled into this build",
            other
        ))),
    }
}
