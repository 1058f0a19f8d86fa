//! Offline backend
//!
//! Produces deterministic, role-shaped drafts without any network access so
//! scenarios can be rehearsed end to end before a real model is wired in.

use async_trait::async_trait;

use super::{CompletionRequest, Llm, Role};
use crate::error::LlmError;

const STOP_WORDS: &[&str] = &[
    "about", "after", "their", "there", "these", "those", "which", "while", "would", "should",
    "could", "other", "every", "within", "based", "team's", "please", "provide",
];

/// Deterministic stand-in for a language model
pub struct OfflineLlm {
    model: String,
}

impl OfflineLlm {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }

    /// First sentence of the system prompt, used as the speaker heading
    fn persona(request: &CompletionRequest) -> String {
        request
            .messages
            .iter()
            .find(|m| m.role == Role::System)
            .and_then(|m| m.content.lines().find(|l| !l.trim().is_empty()))
            .map(|l| l.trim().trim_end_matches('.').to_string())
            .unwrap_or_else(|| "Assistant".to_string())
    }

    fn keywords(text: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for word in text.split(|c: char| !c.is_alphanumeric() && c != '\'') {
            let word = word.to_lowercase();
            if word.len() >= 5 && !STOP_WORDS.contains(&word.as_str()) && !seen.contains(&word) {
                seen.push(word);
            }
            if seen.len() == 6 {
                break;
            }
        }
        seen
    }
}

#[async_trait]
impl Llm for OfflineLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .ok_or_else(|| LlmError::InvalidResponse("no user message to answer".to_string()))?;

        let focus: String = prompt
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .chars()
            .take(300)
            .collect();
        let keywords = Self::keywords(prompt);
        let topics = if keywords.is_empty() {
            "the stated objectives".to_string()
        } else {
            keywords.join(", ")
        };

        Ok(format!(
            "{persona} contribution (offline draft)\n\n\
             Focus: {focus}\n\n\
             Findings:\n\
             - The brief centres on {topics}.\n\
             - Each recommendation below is scoped to the stated objectives and constraints.\n\
             - Risks are listed with an owner and a first mitigation step.\n\n\
             Recommendations:\n\
             1. Confirm the objectives for {topics} with the stakeholders.\n\
             2. Sequence the work into short milestones with a review at each one.\n\
             3. Track progress against the success criterion and report weekly.\n",
            persona = Self::persona(request),
        ))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
