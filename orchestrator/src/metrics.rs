//! Run metrics and batch summaries
//!
//! Computed once at the end of each run from its approval log; nothing
//! here is updated while a run is in progress.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::approval::{ApprovalLog, Decision};
use crate::artifact::Artifact;

// ============================================================================
// Outcomes
// ============================================================================

/// Why a run ended rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// A checkpoint decision rejected the artifact
    Rejected,
    /// A revision was requested with no rounds left
    RevisionLimit,
    /// The checkpoint timed out under the `abort` policy
    CheckpointTimeout,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected => write!(f, "rejected at checkpoint"),
            Self::RevisionLimit => write!(f, "revision limit reached"),
            Self::CheckpointTimeout => write!(f, "checkpoint timed out"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunOutcome {
    Final,
    Rejected { reason: RejectReason },
    Failed { error: String },
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Final => "final",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Final => write!(f, "final"),
            Self::Rejected { reason } => write!(f, "rejected ({})", reason),
            Self::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

// ============================================================================
// Per-Run Metrics
// ============================================================================

/// Metrics for a single scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub scenario_id: String,
    pub outcome: RunOutcome,
    pub elapsed_ms: u64,
    /// Decisions made by a person at a gate
    pub human_interventions: u32,
    pub approvals: u32,
    pub revisions: u32,
    pub rejections: u32,
    /// approvals / all decisions; 0 with no decisions
    pub approval_rate: f64,
    /// Score of the last drafted artifact
    pub quality_score: Option<f64>,
    pub drafting_rounds: u32,
    pub model_calls: u32,
    pub model_retries: u32,
}

/// Inputs gathered by the coordinator while a run executes
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounters {
    pub drafting_rounds: u32,
    pub model_calls: u32,
    pub model_retries: u32,
}

impl RunMetrics {
    /// Compute metrics for a finished run
    pub fn from_run(
        scenario_id: impl Into<String>,
        outcome: RunOutcome,
        elapsed: Duration,
        log: &ApprovalLog,
        artifact: Option<&Artifact>,
        counters: RunCounters,
    ) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            outcome,
            elapsed_ms: elapsed.as_millis() as u64,
            human_interventions: log.human_decisions() as u32,
            approvals: log.count(Decision::Approve) as u32,
            revisions: log.count(Decision::Revise) as u32,
            rejections: log.count(Decision::Reject) as u32,
            approval_rate: log.approval_rate(),
            quality_score: artifact.and_then(|a| a.quality_score()),
            drafting_rounds: counters.drafting_rounds,
            model_calls: counters.model_calls,
            model_retries: counters.model_retries,
        }
    }

    /// Metrics for a run that produced nothing
    pub fn failed(scenario_id: impl Into<String>, error: impl ToString, elapsed: Duration) -> Self {
        Self::from_run(
            scenario_id,
            RunOutcome::Failed {
                error: error.to_string(),
            },
            elapsed,
            &ApprovalLog::new(),
            None,
            RunCounters::default(),
        )
    }

    pub fn decisions(&self) -> u32 {
        self.approvals + self.revisions + self.rejections
    }

    pub fn is_final(&self) -> bool {
        self.outcome == RunOutcome::Final
    }
}

// ============================================================================
// Batch Summary
// ============================================================================

/// Aggregate over a driver batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_runs: usize,
    pub finalised: usize,
    pub rejected: usize,
    pub failed: usize,
    pub total_interventions: u32,
    /// approvals / decisions over every run; 0 with no decisions
    pub approval_rate: f64,
    /// Mean over runs that drafted something
    pub average_quality: Option<f64>,
    pub average_elapsed_ms: u64,
}

impl BatchSummary {
    pub fn from_metrics(metrics: &[RunMetrics]) -> Self {
        if metrics.is_empty() {
            return Self::default();
        }

        let count = |label: &str| metrics.iter().filter(|m| m.outcome.label() == label).count();
        let decisions: u32 = metrics.iter().map(|m| m.decisions()).sum();
        let approvals: u32 = metrics.iter().map(|m| m.approvals).sum();
        let scores: Vec<f64> = metrics.iter().filter_map(|m| m.quality_score).collect();
        let elapsed: u64 = metrics.iter().map(|m| m.elapsed_ms).sum();

        Self {
            total_runs: metrics.len(),
            finalised: count("final"),
            rejected: count("rejected"),
            failed: count("failed"),
            total_interventions: metrics.iter().map(|m| m.human_interventions).sum(),
            approval_rate: if decisions == 0 {
                0.0
            } else {
                approvals as f64 / decisions as f64
            },
            average_quality: (!scores.is_empty())
                .then(|| scores.iter().sum::<f64>() / scores.len() as f64),
            average_elapsed_ms: elapsed / metrics.len() as u64,
        }
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", "═".repeat(60))?;
        writeln!(f, "  BATCH SUMMARY")?;
        writeln!(f, "{}", "═".repeat(60))?;
        writeln!(f, "  Runs:                {}", self.total_runs)?;
        writeln!(f, "  Final:               {}", self.finalised)?;
        writeln!(f, "  Rejected:            {}", self.rejected)?;
        writeln!(f, "  Failed:              {}", self.failed)?;
        writeln!(f, "  Human interventions: {}", self.total_interventions)?;
        writeln!(f, "  Approval rate:       {:.1}%", self.approval_rate * 100.0)?;
        match self.average_quality {
            Some(q) => writeln!(f, "  Average quality:     {:.1}/100", q)?,
            None => writeln!(f, "  Average quality:     n/a")?,
        }
        writeln!(f, "  Average time:        {}ms", self.average_elapsed_ms)?;
        write!(f, "{}", "═".repeat(60))
    }
}
