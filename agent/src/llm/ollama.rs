//! Ollama LLM implementation

use std::time::Duration;

use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    Ollama,
};

use super::{CompletionRequest, Llm, Role};
use crate::config::LlmConfig;
use crate::error::LlmError;

/// Ollama client wrapper
pub struct OllamaClient {
    client: Ollama,
    model: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &LlmConfig) -> Self {
        // Parse URL to extract host and port
        let (host, port) = match url::Url::parse(&config.url) {
            Ok(url) => (
                url.host_str().unwrap_or("localhost").to_string(),
                url.port().unwrap_or(11434),
            ),
            Err(_) => ("localhost".to_string(), 11434),
        };

        Self {
            client: Ollama::new(format!("http://{}", host), port),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl Llm for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let messages: Vec<ChatMessage> = request
            .messages
            .iter()
            .map(|m| match m.role {
                Role::System => ChatMessage::system(m.content.clone()),
                Role::User => ChatMessage::user(m.content.clone()),
                Role::Assistant => ChatMessage::assistant(m.content.clone()),
            })
            .collect();

        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let chat = ChatMessageRequest::new(model, messages);

        let response = tokio::time::timeout(self.timeout, self.client.send_chat_messages(chat))
            .await
            .map_err(|_| {
                LlmError::ModelUnavailable(format!(
                    "ollama call timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| LlmError::classify(&e.to_string()))?;

        Ok(response.message.content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
