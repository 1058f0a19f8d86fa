//! Inner teams: roles that speak in turn over a shared sub-brief
//!
//! Each role sees the sub-brief plus everything said before it; the last
//! role's reply is the team's synthesis and becomes the draft.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use som_agent::Llm;

use crate::artifact::{Artifact, Owner, Section};
use crate::error::TeamError;
use crate::retry::RetryPolicy;
use crate::roles::{AgentRole, Capability, RoleConfig, RoleRegistry, TeamKind};

/// Model call counters shared by every team in a run
#[derive(Debug, Default)]
pub struct CallStats {
    calls: AtomicU32,
    retries: AtomicU32,
}

impl CallStats {
    /// Model calls made, retries included
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::Relaxed)
    }
}

/// Calls the model on behalf of a role, applying the retry policy
#[derive(Clone)]
pub struct ModelCaller {
    llm: Arc<dyn Llm>,
    retry: RetryPolicy,
    stats: Arc<CallStats>,
}

impl ModelCaller {
    pub fn new(llm: Arc<dyn Llm>, retry: RetryPolicy) -> Self {
        Self {
            llm,
            retry,
            stats: Arc::new(CallStats::default()),
        }
    }

    pub fn stats(&self) -> &CallStats {
        &self.stats
    }

    /// One logical model call for `role`
    pub async fn call(&self, role: &RoleConfig, prompt: &str) -> Result<String, TeamError> {
        let request = &role.request(prompt);
        let llm = &self.llm;
        let stats = &self.stats;

        let outcome = self
            .retry
            .run(|| {
                stats.calls.fetch_add(1, Ordering::Relaxed);
                llm.complete(request)
            })
            .await;
        self.stats
            .retries
            .fetch_add(outcome.retries(), Ordering::Relaxed);

        let attempts = outcome.attempts;
        outcome.result.map_err(|source| TeamError::Model {
            team: role.role.team(),
            role: role.role,
            source,
            attempts,
        })
    }
}

/// Work order for one team in one drafting round
#[derive(Debug, Clone)]
pub struct SubBrief {
    pub scenario_id: String,
    /// Version of the artifact being drafted
    pub version: u32,
    pub text: String,
}

/// A contribution made while drafting
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub role: AgentRole,
    pub content: String,
}

/// A group of roles that produces a draft
pub struct InnerTeam {
    kind: TeamKind,
    members: Vec<RoleConfig>,
    caller: ModelCaller,
}

impl InnerTeam {
    pub fn new(kind: TeamKind, registry: &RoleRegistry, caller: ModelCaller) -> Self {
        Self {
            kind,
            members: registry.team(kind),
            caller,
        }
    }

    /// Replace the members (order matters; the last one synthesises)
    pub fn with_members(mut self, members: Vec<RoleConfig>) -> Self {
        self.members = members;
        self
    }

    pub fn kind(&self) -> TeamKind {
        self.kind
    }

    pub fn members(&self) -> &[RoleConfig] {
        &self.members
    }

    /// Produce a draft for the sub-brief
    pub async fn draft(&self, brief: &SubBrief) -> Result<Artifact, TeamError> {
        let Some(synthesiser) = self.members.last() else {
            return Err(TeamError::EmptyTeam(self.kind));
        };

        tracing::info!(
            team = self.kind.id(),
            scenario = %brief.scenario_id,
            version = brief.version,
            "Team drafting"
        );

        let mut contributions: Vec<Contribution> = Vec::with_capacity(self.members.len());
        for (index, member) in self.members.iter().enumerate() {
            let is_last = index + 1 == self.members.len();
            let prompt = self.member_prompt(member, brief, &contributions, is_last);
            let content = self.caller.call(member, &prompt).await?;
            tracing::debug!(
                team = self.kind.id(),
                role = member.role.id(),
                chars = content.len(),
                "Contribution received"
            );
            contributions.push(Contribution {
                role: member.role,
                content,
            });
        }

        let synthesis = contributions
            .pop()
            .map(|c| c.content)
            .unwrap_or_default();

        Ok(Artifact::new(&brief.scenario_id, Owner::Inner(self.kind))
            .with_version(brief.version)
            .with_section(
                Section::new(self.kind.display_name(), synthesis)
                    .with_team(self.kind)
                    .with_author(synthesiser.role),
            ))
    }

    fn member_prompt(
        &self,
        member: &RoleConfig,
        brief: &SubBrief,
        previous: &[Contribution],
        is_last: bool,
    ) -> String {
        let mut prompt = format!(
            "Team: {}\nObjective: {}\n\n{}\n",
            self.kind.display_name(),
            self.kind.objectives(),
            brief.text.trim()
        );

        if !previous.is_empty() {
            prompt.push_str("\nContributions so far:\n");
            for contribution in previous {
                prompt.push_str(&format!(
                    "\n### {}\n{}\n",
                    contribution.role.display_name(),
                    contribution.content.trim()
                ));
            }
        }

        let capability = if is_last {
            Capability::Synthesise
        } else {
            member
                .role
                .capabilities()
                .first()
                .copied()
                .unwrap_or(Capability::Draft)
        };
        prompt.push('\n');
        prompt.push_str(capability.instruction());
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use som_agent::{CompletionRequest, LlmError};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Echoes the persona line and records every prompt
    struct RecordingLlm {
        prompts: Mutex<Vec<String>>,
        failures: AtomicU32,
        error: LlmError,
    }

    impl RecordingLlm {
        fn new(failures: u32, error: LlmError) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                failures: AtomicU32::new(failures),
                error,
            }
        }
    }

    #[async_trait]
    impl Llm for RecordingLlm {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(self.error.clone());
            }
            let user = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.prompts.lock().unwrap().push(user);
            let persona = request.messages[0].content.lines().next().unwrap_or_default();
            Ok(format!("reply from: {}", persona))
        }

        fn model(&self) -> &str {
            "recording"
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::none()
            .with_max_attempts(3)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(1))
    }

    fn brief() -> SubBrief {
        SubBrief {
            scenario_id: "product_launch".to_string(),
            version: 2,
            text: "Launch Product X".to_string(),
        }
    }

    #[tokio::test]
    async fn test_roles_speak_in_order_and_last_synthesises() {
        let llm = Arc::new(RecordingLlm::new(0, LlmError::ModelUnavailable(String::new())));
        let caller = ModelCaller::new(llm.clone(), fast_retry());
        let team = InnerTeam::new(TeamKind::ResearchAnalysis, &RoleRegistry::default(), caller.clone());

        let draft = team.draft(&brief()).await.unwrap();

        assert_eq!(draft.version, 2);
        assert_eq!(draft.owner, Owner::Inner(TeamKind::ResearchAnalysis));
        let section = draft.section_for(TeamKind::ResearchAnalysis).unwrap();
        assert_eq!(section.author, Some(AgentRole::ReportWriter));
        assert!(section.content.contains("Report Writer"));

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(!prompts[0].contains("Contributions so far"));
        assert!(prompts[1].contains("### Research Specialist"));
        assert!(prompts[2].contains("### Data Analyst"));
        assert!(prompts[0].ends_with(Capability::Analyse.instruction()));
        assert!(prompts[2].ends_with(Capability::Synthesise.instruction()));
        assert_eq!(caller.stats().calls(), 3);
        assert_eq!(caller.stats().retries(), 0);
    }

    #[tokio::test]
    async fn test_rate_limits_are_absorbed() {
        let llm = Arc::new(RecordingLlm::new(2, LlmError::RateLimited { retry_after: None }));
        let caller = ModelCaller::new(llm, fast_retry());
        let team = InnerTeam::new(TeamKind::CreativeDesign, &RoleRegistry::default(), caller.clone());

        assert!(team.draft(&brief()).await.is_ok());
        assert_eq!(caller.stats().calls(), 5);
        assert_eq!(caller.stats().retries(), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_team_error() {
        let llm = Arc::new(RecordingLlm::new(
            u32::MAX,
            LlmError::ModelUnavailable("connection refused".to_string()),
        ));
        let team = InnerTeam::new(
            TeamKind::TechnicalImplementation,
            &RoleRegistry::default(),
            ModelCaller::new(llm, fast_retry()),
        );

        match team.draft(&brief()).await {
            Err(TeamError::Model { team, role, attempts, .. }) => {
                assert_eq!(team, TeamKind::TechnicalImplementation);
                assert_eq!(role, AgentRole::SystemArchitect);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected model error, got {:?}", other.map(|a| a.version)),
        }
    }

    #[tokio::test]
    async fn test_empty_team() {
        let llm = Arc::new(RecordingLlm::new(0, LlmError::ModelUnavailable(String::new())));
        let team = InnerTeam::new(
            TeamKind::CreativeDesign,
            &RoleRegistry::default(),
            ModelCaller::new(llm, fast_retry()),
        )
        .with_members(Vec::new());

        assert!(matches!(
            team.draft(&brief()).await,
            Err(TeamError::EmptyTeam(TeamKind::CreativeDesign))
        ));
    }
}
