//! Outer team coordinator
//!
//! Runs one scenario to a terminal state:
//! - Inner teams draft in sequence
//! - The coordination team adds an integration summary, a resource
//!   allocation and a QA review
//! - The assembled artifact is scored and presented at a checkpoint
//! - Revision requests loop back into drafting, bounded by `max_revisions`

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use som_agent::config::OnTimeout;
use som_agent::{Llm, SomFileConfig};

use crate::approval::{ApprovalLog, ApprovalRecord, ApprovalSource, Decision, RevisionRequest};
use crate::artifact::{Artifact, ArtifactState, Owner, Section};
use crate::checkpoint::{Checkpoint, CheckpointGate};
use crate::error::ScenarioError;
use crate::metrics::{RejectReason, RunCounters, RunMetrics, RunOutcome};
use crate::quality::QualityRubric;
use crate::retry::RetryPolicy;
use crate::roles::{Capability, RoleRegistry, TeamKind};
use crate::scenario::Scenario;
use crate::state::RunState;
use crate::team::{InnerTeam, ModelCaller, SubBrief};

/// How long a checkpoint may wait and what happens after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointTimeout {
    #[default]
    Unbounded,
    After { timeout: Duration, on_timeout: OnTimeout },
}

/// Configuration for the coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Revision rounds allowed before a revise ends the run
    pub max_revisions: u32,

    /// Approve without a checkpoint when the quality score reaches this
    pub auto_approve_threshold: Option<f64>,

    pub checkpoint_timeout: CheckpointTimeout,

    pub retry: RetryPolicy,

    pub rubric: QualityRubric,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_revisions: 5,
            auto_approve_threshold: None,
            checkpoint_timeout: CheckpointTimeout::Unbounded,
            retry: RetryPolicy::default(),
            rubric: QualityRubric::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Create from file config
    pub fn from_file_config(config: &SomFileConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let checkpoint_timeout = match (config.checkpoint.timeout_secs, config.checkpoint.on_timeout) {
            (None, _) => CheckpointTimeout::Unbounded,
            (Some(secs), Some(on_timeout)) => CheckpointTimeout::After {
                timeout: Duration::from_secs(secs),
                on_timeout,
            },
            (Some(_), None) => anyhow::bail!("checkpoint.timeout_secs requires checkpoint.on_timeout"),
        };

        Ok(Self {
            max_revisions: config.run.max_revisions,
            auto_approve_threshold: config.run.auto_approve_threshold,
            checkpoint_timeout,
            retry: RetryPolicy::from_config(&config.retry),
            rubric: QualityRubric::default(),
        })
    }

    pub fn with_max_revisions(mut self, max_revisions: u32) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    pub fn with_auto_approve_threshold(mut self, threshold: f64) -> Self {
        self.auto_approve_threshold = Some(threshold);
        self
    }

    pub fn with_checkpoint_timeout(mut self, timeout: Duration, on_timeout: OnTimeout) -> Self {
        self.checkpoint_timeout = CheckpointTimeout::After {
            timeout,
            on_timeout,
        };
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario_id: String,
    pub state: RunState,
    pub artifact: Artifact,
    pub metrics: RunMetrics,
    pub approvals: ApprovalLog,
    /// Whether the final artifact meets the scenario's success criterion
    pub criterion_met: bool,
}

impl RunReport {
    pub fn outcome(&self) -> &RunOutcome {
        &self.metrics.outcome
    }
}

/// A run that ended in an error, with the metrics it had gathered
#[derive(Debug, Clone)]
pub struct FailedRun {
    pub error: ScenarioError,
    pub metrics: RunMetrics,
}

/// Sections the coordination team adds each round, in order
const OUTER_SECTIONS: [(Capability, &str); 3] = [
    (Capability::Coordinate, "Integration Summary"),
    (Capability::Allocate, "Resource Allocation"),
    (Capability::Review, "QA Review"),
];

/// What a run has recorded so far
struct RunProgress {
    started: Instant,
    caller: ModelCaller,
    log: ApprovalLog,
    rounds: u32,
    /// Last artifact drafted, decided on or not
    latest: Option<Artifact>,
}

impl RunProgress {
    fn metrics(
        &self,
        scenario_id: &str,
        outcome: RunOutcome,
        artifact: Option<&Artifact>,
    ) -> RunMetrics {
        RunMetrics::from_run(
            scenario_id,
            outcome,
            self.started.elapsed(),
            &self.log,
            artifact,
            RunCounters {
                drafting_rounds: self.rounds,
                model_calls: self.caller.stats().calls(),
                model_retries: self.caller.stats().retries(),
            },
        )
    }
}

/// Sequences inner teams, places checkpoints and loops on revisions
pub struct OuterTeamCoordinator {
    config: CoordinatorConfig,
    registry: RoleRegistry,
    llm: Arc<dyn Llm>,
    gate: Arc<dyn CheckpointGate>,
}

impl OuterTeamCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        registry: RoleRegistry,
        llm: Arc<dyn Llm>,
        gate: Arc<dyn CheckpointGate>,
    ) -> Self {
        Self {
            config,
            registry,
            llm,
            gate,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Run a scenario to `Final` or `Rejected`
    pub async fn run(&self, scenario: &Scenario) -> Result<RunReport, ScenarioError> {
        self.run_tracked(scenario).await.map_err(|failed| failed.error)
    }

    /// Like [`run`](Self::run), keeping what a failed run recorded
    pub async fn run_tracked(&self, scenario: &Scenario) -> Result<RunReport, FailedRun> {
        let started = Instant::now();
        let teams = match validate(scenario) {
            Ok(teams) => teams,
            Err(error) => {
                let metrics = RunMetrics::failed(&scenario.id, &error, started.elapsed());
                return Err(FailedRun { error, metrics });
            }
        };

        let mut progress = RunProgress {
            started,
            caller: ModelCaller::new(self.llm.clone(), self.config.retry.clone()),
            log: ApprovalLog::new(),
            rounds: 0,
            latest: None,
        };

        match self.drive(scenario, &teams, &mut progress).await {
            Ok(report) => Ok(report),
            Err(error) => {
                let metrics = progress.metrics(
                    &scenario.id,
                    RunOutcome::Failed {
                        error: error.to_string(),
                    },
                    progress.latest.as_ref(),
                );
                tracing::info!(
                    scenario = %scenario.id,
                    rounds = progress.rounds,
                    decisions = metrics.decisions(),
                    "Run failed part-way"
                );
                Err(FailedRun { error, metrics })
            }
        }
    }

    async fn drive(
        &self,
        scenario: &Scenario,
        teams: &[TeamKind],
        progress: &mut RunProgress,
    ) -> Result<RunReport, ScenarioError> {
        let artifact_id = Uuid::new_v4();
        let mut state = RunState::default();
        let mut revision: Option<RevisionRequest> = None;
        let mut revisions_used = 0;
        let mut version = 1;

        println!("\n{}", "═".repeat(60));
        println!("  SCENARIO: {}", scenario.name);
        println!("  Success criterion: {}", scenario.success_criterion);
        println!("{}", "═".repeat(60));

        tracing::info!(scenario = %scenario.id, teams = teams.len(), "Run started");

        let (mut artifact, outcome) = loop {
            progress.rounds += 1;
            println!("\n[Round {}] Drafting version {}", progress.rounds, version);

            let artifact = self
                .draft_round(
                    scenario,
                    teams,
                    artifact_id,
                    version,
                    revision.as_ref(),
                    &progress.caller,
                )
                .await?;
            progress.latest = Some(artifact.clone());
            state.advance(RunState::AwaitingApproval)?;

            let revisions_left = self.config.max_revisions.saturating_sub(revisions_used);
            let record = self.decide(scenario, &artifact, revisions_left).await?;
            let decision = record.decision();
            let timed_out = *record.source() == ApprovalSource::Timeout;
            progress.log.append(record.clone());

            match decision {
                Decision::Approve => {
                    state.advance(RunState::Final)?;
                    debug_assert!(progress.log.finalises(artifact.version));
                    println!("  ✓ Approved version {}", artifact.version);
                    break (artifact, RunOutcome::Final);
                }
                Decision::Reject => {
                    state.advance(RunState::Rejected)?;
                    let reason = if timed_out {
                        RejectReason::CheckpointTimeout
                    } else {
                        RejectReason::Rejected
                    };
                    println!("  ✗ Rejected version {} ({})", artifact.version, reason);
                    break (artifact, RunOutcome::Rejected { reason });
                }
                Decision::Revise if revisions_used >= self.config.max_revisions => {
                    state.advance(RunState::Rejected)?;
                    println!(
                        "  ✗ Revision requested but the limit of {} was reached",
                        self.config.max_revisions
                    );
                    break (
                        artifact,
                        RunOutcome::Rejected {
                            reason: RejectReason::RevisionLimit,
                        },
                    );
                }
                Decision::Revise => {
                    state.advance(RunState::Drafting)?;
                    revisions_used += 1;
                    revision = RevisionRequest::from_record(&record);
                    version += 1;
                    println!(
                        "  ✎ Revision requested ({} of {})",
                        revisions_used, self.config.max_revisions
                    );
                }
            }
        };

        artifact.state = match outcome {
            RunOutcome::Final => ArtifactState::Final,
            _ => ArtifactState::Rejected,
        };

        let criterion_met = outcome == RunOutcome::Final
            && scenario
                .success_criterion
                .is_met_by(artifact.quality_score().unwrap_or_default());

        let metrics = progress.metrics(&scenario.id, outcome, Some(&artifact));

        tracing::info!(
            scenario = %scenario.id,
            outcome = metrics.outcome.label(),
            rounds = progress.rounds,
            elapsed_ms = metrics.elapsed_ms,
            "Run finished"
        );

        println!("\n{}", "═".repeat(60));
        println!("  SCENARIO {}: {}", metrics.outcome.label().to_uppercase(), scenario.name);
        println!("{}\n", "═".repeat(60));

        Ok(RunReport {
            scenario_id: scenario.id.clone(),
            state,
            artifact,
            metrics,
            approvals: progress.log.clone(),
            criterion_met,
        })
    }

    /// One drafting round: inner teams, then the outer coordination sections
    async fn draft_round(
        &self,
        scenario: &Scenario,
        teams: &[TeamKind],
        artifact_id: Uuid,
        version: u32,
        revision: Option<&RevisionRequest>,
        caller: &ModelCaller,
    ) -> Result<Artifact, ScenarioError> {
        let brief = SubBrief {
            scenario_id: scenario.id.clone(),
            version,
            text: sub_brief_text(scenario, revision),
        };

        let mut artifact = Artifact::new(&scenario.id, Owner::Outer)
            .with_id(artifact_id)
            .with_version(version);
        for team in teams {
            let draft = InnerTeam::new(*team, &self.registry, caller.clone())
                .draft(&brief)
                .await
                .map_err(|e| ScenarioError::failed(&scenario.id, e))?;
            println!("  ✓ {} drafted", team);
            artifact.sections.extend(draft.sections);
        }

        for (capability, title) in OUTER_SECTIONS {
            let Some(role) = TeamKind::Coordination.member_with(capability) else {
                tracing::warn!(?capability, "No coordination role for section");
                continue;
            };
            let content = caller
                .call(
                    &self.registry.get(role),
                    &outer_prompt(&brief, &artifact, capability),
                )
                .await
                .map_err(|e| ScenarioError::failed(&scenario.id, e))?;
            println!("  ✓ {} written by {}", title, role);
            artifact.push_section(Section::new(title, content).with_author(role));
        }

        let assessment = self.config.rubric.assess(&artifact, &scenario.brief);
        tracing::debug!(
            scenario = %scenario.id,
            version,
            quality = assessment.overall,
            "Artifact scored"
        );
        artifact.quality = Some(assessment);
        Ok(artifact)
    }

    /// Decide on an artifact: quality threshold first, then the gate
    async fn decide(
        &self,
        scenario: &Scenario,
        artifact: &Artifact,
        revisions_left: u32,
    ) -> Result<ApprovalRecord, ScenarioError> {
        let version = artifact.version;

        if let (Some(threshold), Some(score)) =
            (self.config.auto_approve_threshold, artifact.quality_score())
        {
            if score >= threshold {
                tracing::info!(scenario = %scenario.id, version, score, threshold, "Auto-approved");
                return Ok(ApprovalRecord::approve(version).with_source(ApprovalSource::Auto {
                    reason: format!("quality {:.1} >= {:.1}", score, threshold),
                }));
            }
        }

        let checkpoint = Checkpoint::for_artifact(
            artifact,
            format!(
                "Approve version {} of \"{}\"? Success criterion: {}",
                version, scenario.name, scenario.success_criterion
            ),
        )
        .with_revisions_left(revisions_left);

        let answer = match self.config.checkpoint_timeout {
            CheckpointTimeout::Unbounded => self.gate.checkpoint(&checkpoint).await,
            CheckpointTimeout::After {
                timeout,
                on_timeout,
            } => match tokio::time::timeout(timeout, self.gate.checkpoint(&checkpoint)).await {
                Ok(answer) => answer,
                Err(_) => {
                    tracing::warn!(
                        scenario = %scenario.id,
                        version,
                        timeout_secs = timeout.as_secs_f64(),
                        policy = ?on_timeout,
                        "Checkpoint timed out"
                    );
                    let decision = match on_timeout {
                        OnTimeout::Revise => Decision::Revise,
                        OnTimeout::Abort => Decision::Reject,
                    };
                    Ok(ApprovalRecord::new(version, decision, None, ApprovalSource::Timeout))
                }
            },
        };

        answer.map_err(|e| ScenarioError::failed(&scenario.id, e))
    }
}

/// Teams to run, or why the scenario cannot run at all
fn validate(scenario: &Scenario) -> Result<Vec<TeamKind>, ScenarioError> {
    if !scenario.has_brief() {
        return Err(ScenarioError::InvalidScenario(format!(
            "scenario {} has an empty brief",
            scenario.id
        )));
    }
    let teams = scenario.inner_teams();
    if teams.is_empty() {
        return Err(ScenarioError::InvalidScenario(format!(
            "scenario {} selects no inner teams",
            scenario.id
        )));
    }
    Ok(teams)
}

/// Brief handed to every inner team in a round
fn sub_brief_text(scenario: &Scenario, revision: Option<&RevisionRequest>) -> String {
    let mut text = format!(
        "Scenario: {}\n\n{}\n\nSuccess criterion: {}",
        scenario.name,
        scenario.full_brief(),
        scenario.success_criterion
    );
    if let Some(request) = revision {
        if request.has_comments() {
            text.push_str(&format!(
                "\n\nRevision requested on version {}: {}",
                request.artifact_version,
                request.comments.trim()
            ));
        } else {
            text.push_str(&format!(
                "\n\nVersion {} was sent back without comments; strengthen weak sections.",
                request.artifact_version
            ));
        }
    }
    text
}

/// Prompt for an outer role: the brief, every section so far, then its task
fn outer_prompt(brief: &SubBrief, artifact: &Artifact, capability: Capability) -> String {
    let mut prompt = format!("{}\n\n{}\n", brief.text.trim(), capability.instruction());
    for section in &artifact.sections {
        prompt.push_str(&format!("\n### {}\n{}\n", section.title, section.content.trim()));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{AutoApproveGate, RejectGate, ScriptStep, ScriptedGate};
    use crate::roles::AgentRole;
    use crate::scenario::SuccessCriterion;
    use som_agent::llm::OfflineLlm;

    fn coordinator(config: CoordinatorConfig, gate: Arc<dyn CheckpointGate>) -> OuterTeamCoordinator {
        OuterTeamCoordinator::new(
            config,
            RoleRegistry::default(),
            Arc::new(OfflineLlm::new("offline")),
            gate,
        )
    }

    fn scenario() -> Scenario {
        Scenario::new(
            "launch",
            "Launch Product X",
            SuccessCriterion::Text("approved".to_string()),
        )
    }

    #[test]
    fn test_config_from_file() {
        let file = SomFileConfig::from_toml(
            r#"
                [run]
                max_revisions = 2
                [checkpoint]
                timeout_secs = 30
                on_timeout = "revise"
            "#,
        )
        .unwrap();
        let config = CoordinatorConfig::from_file_config(&file).unwrap();
        assert_eq!(config.max_revisions, 2);
        assert_eq!(
            config.checkpoint_timeout,
            CheckpointTimeout::After {
                timeout: Duration::from_secs(30),
                on_timeout: OnTimeout::Revise
            }
        );
    }

    #[tokio::test]
    async fn test_empty_brief_is_invalid() {
        let gate = Arc::new(ScriptedGate::default());
        let coordinator = coordinator(CoordinatorConfig::default(), gate.clone());
        let err = coordinator
            .run(&scenario().with_brief("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidScenario(_)));
        assert!(gate.presented().is_empty());
    }

    #[tokio::test]
    async fn test_revise_then_approve() {
        let gate = Arc::new(ScriptedGate::new([ScriptStep::Decide(
            Decision::Revise,
            Some("add a pricing section".to_string()),
        )]));
        let report = coordinator(CoordinatorConfig::default(), gate.clone())
            .run(&scenario())
            .await
            .unwrap();

        assert_eq!(report.state, RunState::Final);
        assert_eq!(report.artifact.version, 2);
        assert_eq!(report.artifact.state, ArtifactState::Final);
        assert_eq!(gate.presented(), vec![1, 2]);
        assert_eq!(report.approvals.records()[0].artifact_version(), 1);
        assert!(report.approvals.finalises(2));
        assert_eq!(report.metrics.drafting_rounds, 2);
        // three inner teams of three roles plus three coordination roles, twice
        assert_eq!(report.metrics.model_calls, 24);
    }

    #[tokio::test]
    async fn test_versions_share_the_artifact_id() {
        let gate = Arc::new(ScriptedGate::decisions([Decision::Revise, Decision::Revise]));
        let report = coordinator(CoordinatorConfig::default(), gate.clone())
            .run(&scenario())
            .await
            .unwrap();

        assert_eq!(gate.presented(), vec![1, 2, 3]);
        let ids = gate.presented_artifacts();
        assert!(ids.iter().all(|id| *id == report.artifact.id));
    }

    #[tokio::test]
    async fn test_coordination_team_adds_its_sections() {
        let report = coordinator(CoordinatorConfig::default(), Arc::new(AutoApproveGate))
            .run(&scenario())
            .await
            .unwrap();

        let outer: Vec<_> = report
            .artifact
            .sections
            .iter()
            .filter(|s| s.team.is_none())
            .map(|s| (s.title.as_str(), s.author))
            .collect();
        assert_eq!(
            outer,
            vec![
                ("Integration Summary", Some(AgentRole::TeamCoordinator)),
                ("Resource Allocation", Some(AgentRole::ResourceManager)),
                ("QA Review", Some(AgentRole::QualityAssurance)),
            ]
        );
    }

    #[test]
    fn test_outer_prompt_sees_earlier_sections() {
        let brief = SubBrief {
            scenario_id: "launch".to_string(),
            version: 1,
            text: "Launch Product X".to_string(),
        };
        let artifact = Artifact::new("launch", Owner::Outer)
            .with_section(
                Section::new("Creative & Design", "Bold teal campaign")
                    .with_team(TeamKind::CreativeDesign),
            )
            .with_section(Section::new("Integration Summary", "Creative hands copy to tech"));

        let prompt = outer_prompt(&brief, &artifact, Capability::Review);
        assert!(prompt.starts_with("Launch Product X"));
        assert!(prompt.contains(Capability::Review.instruction()));
        assert!(prompt.contains("### Creative & Design\nBold teal campaign"));
        assert!(prompt.contains("### Integration Summary"));
    }

    #[tokio::test]
    async fn test_revision_limit() {
        let gate = Arc::new(ScriptedGate::decisions([
            Decision::Revise,
            Decision::Revise,
            Decision::Revise,
        ]));
        let report = coordinator(CoordinatorConfig::default().with_max_revisions(1), gate.clone())
            .run(&scenario())
            .await
            .unwrap();

        assert_eq!(report.state, RunState::Rejected);
        assert_eq!(
            report.metrics.outcome,
            RunOutcome::Rejected {
                reason: RejectReason::RevisionLimit
            }
        );
        assert_eq!(gate.presented(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_reject_gate_ends_rejected() {
        let report = coordinator(CoordinatorConfig::default(), Arc::new(RejectGate))
            .run(&scenario())
            .await
            .unwrap();
        assert_eq!(report.artifact.state, ArtifactState::Rejected);
        assert_eq!(report.metrics.rejections, 1);
        assert_eq!(report.metrics.approval_rate, 0.0);
    }

    #[tokio::test]
    async fn test_auto_approve_threshold_skips_gate() {
        let gate = Arc::new(ScriptedGate::decisions([Decision::Reject]));
        let report = coordinator(
            CoordinatorConfig::default().with_auto_approve_threshold(0.0),
            gate.clone(),
        )
        .run(&scenario())
        .await
        .unwrap();

        assert_eq!(report.state, RunState::Final);
        assert!(gate.presented().is_empty());
        assert_eq!(report.metrics.human_interventions, 0);
        assert!(matches!(
            report.approvals.records()[0].source(),
            ApprovalSource::Auto { .. }
        ));
    }

    #[tokio::test]
    async fn test_single_team_selection() {
        let report = coordinator(CoordinatorConfig::default(), Arc::new(AutoApproveGate))
            .run(&scenario().with_teams(vec![TeamKind::CreativeDesign]))
            .await
            .unwrap();
        assert_eq!(report.artifact.team_sections().count(), 1);
        assert_eq!(report.metrics.model_calls, 6);
    }

    #[test]
    fn test_sub_brief_carries_revision_comments() {
        let request = RevisionRequest {
            artifact_version: 3,
            comments: "cut the budget".to_string(),
        };
        let text = sub_brief_text(&scenario(), Some(&request));
        assert!(text.contains("Launch Product X"));
        assert!(text.contains("Revision requested on version 3: cut the budget"));
    }
}
