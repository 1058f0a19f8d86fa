//! Language-model error taxonomy
//!
//! Backends map their transport failures onto these variants so callers can
//! tell a transient condition (worth retrying) from a permanent one.

use std::time::Duration;

/// Errors surfaced by an [`Llm`](crate::llm::Llm) backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// Backend unreachable, overloaded or the call timed out
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Backend asked us to slow down
    #[error("rate limited{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Backend rejected the request
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    /// Backend answered with something we could not read
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Backend is misconfigured (missing key, bad url)
    #[error("configuration error: {0}")]
    Config(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(" (retry after {}ms)", d.as_millis()))
        .unwrap_or_default()
}

impl LlmError {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ModelUnavailable(_) | Self::RateLimited { .. })
    }

    /// Classify an error message from a backend that only reports strings
    pub fn classify(error: &str) -> Self {
        let lower = error.to_lowercase();
        if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
            Self::RateLimited { retry_after: None }
        } else if lower.contains("timed out")
            || lower.contains("deadline has elapsed")
            || lower.contains("connection refused")
            || lower.contains("failed to connect")
            || lower.contains("error sending request")
            || lower.contains("connection reset")
            || lower.contains("503")
            || lower.contains("502")
            || lower.contains("overloaded")
        {
            Self::ModelUnavailable(error.to_string())
        } else if lower.contains("failed to parse")
            || lower.contains("serialization")
            || lower.contains("invalid json")
        {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Api {
                status: 0,
                message: error.to_string(),
            }
        }
    }

    /// Short label for structured logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::RateLimited { .. } => "rate_limited",
            Self::Api { .. } => "api_error",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Config(_) => "config_error",
        }
    }
}
