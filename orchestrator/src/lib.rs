//! Society-of-Mind team orchestration with human-in-the-loop checkpoints
//!
//! This crate provides:
//! - Tagged agent roles grouped into inner teams and an outer coordination team
//! - Inner teams that draft through a sequential group chat
//! - An outer coordination team that integrates, allocates and reviews the drafts
//! - A bounded revision loop with human checkpoint gates
//! - A scenario driver that runs batches and collects per-run metrics
//! - Built-in scenarios and custom TOML scenario support
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use som_orchestrator::{AutoApproveGate, DriverConfig, RoleRegistry, ScenarioCatalog, ScenarioDriver};
//! use som_agent::llm::OfflineLlm;
//!
//! let driver = ScenarioDriver::new(
//!     DriverConfig::default(),
//!     ScenarioCatalog::builtin(),
//!     RoleRegistry::default(),
//!     Arc::new(OfflineLlm::new("offline")),
//!     Arc::new(AutoApproveGate),
//! );
//!
//! let results = driver.execute(&["product_launch"]).await?;
//! ```

pub mod approval;
pub mod artifact;
pub mod checkpoint;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod prompts;
pub mod quality;
pub mod results;
pub mod retry;
pub mod roles;
pub mod scenario;
pub mod state;
pub mod team;

pub use approval::{ApprovalLog, ApprovalRecord, ApprovalSource, Decision, RevisionRequest};
pub use artifact::{Artifact, ArtifactState, Owner, Section};
pub use checkpoint::{
    AutoApproveGate, Checkpoint, CheckpointGate, InteractiveGate, RejectGate, ScriptStep,
    ScriptedGate,
};
pub use coordinator::{
    CheckpointTimeout, CoordinatorConfig, FailedRun, OuterTeamCoordinator, RunReport,
};
pub use driver::{DriverConfig, ScenarioDriver};
pub use error::{DriverError, GateError, ScenarioError, TeamError};
pub use metrics::{BatchSummary, RejectReason, RunMetrics, RunOutcome};
pub use quality::{QualityAssessment, QualityRubric};
pub use results::{JsonResultsStore, ResultsStore};
pub use retry::RetryPolicy;
pub use roles::{AgentRole, Capability, RoleConfig, RoleRegistry, TeamKind};
pub use scenario::{Scenario, ScenarioCatalog, SuccessCriterion};
pub use state::RunState;
pub use team::{InnerTeam, ModelCaller, SubBrief};

/// Re-export commonly used types from the agent crate
pub use som_agent::config::OnTimeout;
pub use som_agent::{Llm, LlmError, SomFileConfig};
