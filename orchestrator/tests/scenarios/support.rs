//! Shared test backends and builders

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use som_agent::llm::OfflineLlm;
use som_agent::{CompletionRequest, Llm, LlmError, Role};
use som_orchestrator::{
    CheckpointGate, CoordinatorConfig, OuterTeamCoordinator, RetryPolicy, RoleRegistry,
};

/// Offline backend with scripted failures
pub struct FlakyLlm {
    inner: OfflineLlm,
    failures_left: AtomicU32,
    error: LlmError,
    /// Prompts containing this text always fail
    poison: Option<String>,
    /// Calls after this many fail for good
    healthy_calls: Option<u32>,
    calls: AtomicU32,
}

impl FlakyLlm {
    pub fn healthy() -> Self {
        Self::failing_first(0, LlmError::ModelUnavailable(String::new()))
    }

    /// Fail the first `n` calls with `error`, then answer normally
    pub fn failing_first(n: u32, error: LlmError) -> Self {
        Self {
            inner: OfflineLlm::new("flaky"),
            failures_left: AtomicU32::new(n),
            error,
            poison: None,
            healthy_calls: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_first(
            u32::MAX,
            LlmError::ModelUnavailable("connection refused".to_string()),
        )
    }

    /// Fail every call whose user prompt mentions `text`
    pub fn poisoned(text: &str) -> Self {
        Self {
            poison: Some(text.to_lowercase()),
            ..Self::healthy()
        }
    }

    /// Answer the first `n` calls, then fail every call
    pub fn failing_after(n: u32) -> Self {
        Self {
            healthy_calls: Some(n),
            ..Self::healthy()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Llm for FlakyLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.healthy_calls.is_some_and(|n| previous >= n) {
            return Err(LlmError::ModelUnavailable("backend went away".to_string()));
        }

        if let Some(poison) = &self.poison {
            let poisoned = request
                .messages
                .iter()
                .filter(|m| m.role == Role::User)
                .any(|m| m.content.to_lowercase().contains(poison.as_str()));
            if poisoned {
                return Err(LlmError::ModelUnavailable("backend overloaded".to_string()));
            }
        }

        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(self.error.clone());
        }

        self.inner.complete(request).await
    }

    fn model(&self) -> &str {
        "flaky"
    }
}

/// Default coordinator settings with millisecond backoff
pub fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig::default().with_retry(
        RetryPolicy::default().with_backoff(Duration::from_millis(1), Duration::from_millis(2)),
    )
}

pub fn coordinator(
    config: CoordinatorConfig,
    llm: Arc<dyn Llm>,
    gate: Arc<dyn CheckpointGate>,
) -> OuterTeamCoordinator {
    OuterTeamCoordinator::new(config, RoleRegistry::default(), llm, gate)
}
