//! Approval records, the append-only approval log and revision requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A checkpoint decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Revise,
    Reject,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Approve => "approve",
            Self::Revise => "revise",
            Self::Reject => "reject",
        };
        f.write_str(name)
    }
}

/// Who or what made a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ApprovalSource {
    /// A person at a checkpoint gate
    Human,
    /// A policy decided without asking (e.g. quality threshold)
    Auto { reason: String },
    /// The checkpoint timed out and the timeout policy decided
    Timeout,
}

impl ApprovalSource {
    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human)
    }
}

/// An immutable checkpoint decision for one artifact version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    artifact_version: u32,
    decision: Decision,
    comments: Option<String>,
    timestamp: DateTime<Utc>,
    source: ApprovalSource,
}

impl ApprovalRecord {
    /// Create a record timestamped now
    pub fn new(
        artifact_version: u32,
        decision: Decision,
        comments: Option<String>,
        source: ApprovalSource,
    ) -> Self {
        Self {
            artifact_version,
            decision,
            comments: comments.filter(|c| !c.trim().is_empty()),
            timestamp: Utc::now(),
            source,
        }
    }

    pub fn approve(artifact_version: u32) -> Self {
        Self::new(artifact_version, Decision::Approve, None, ApprovalSource::Human)
    }

    pub fn revise(artifact_version: u32, comments: impl Into<String>) -> Self {
        Self::new(
            artifact_version,
            Decision::Revise,
            Some(comments.into()),
            ApprovalSource::Human,
        )
    }

    pub fn reject(artifact_version: u32) -> Self {
        Self::new(artifact_version, Decision::Reject, None, ApprovalSource::Human)
    }

    /// Same decision attributed to another source
    pub fn with_source(mut self, source: ApprovalSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        let comments = comments.into();
        self.comments = (!comments.trim().is_empty()).then_some(comments);
        self
    }

    pub fn artifact_version(&self) -> u32 {
        self.artifact_version
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> &ApprovalSource {
        &self.source
    }
}

/// Ordered, append-only decisions for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalLog {
    records: Vec<ApprovalRecord>,
}

impl ApprovalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: ApprovalRecord) {
        tracing::debug!(
            version = record.artifact_version(),
            decision = %record.decision(),
            "Approval recorded"
        );
        self.records.push(record);
    }

    pub fn records(&self) -> &[ApprovalRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&ApprovalRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count(&self, decision: Decision) -> usize {
        self.records.iter().filter(|r| r.decision() == decision).count()
    }

    /// Decisions made by a human at a gate
    pub fn human_decisions(&self) -> usize {
        self.records.iter().filter(|r| r.source().is_human()).count()
    }

    /// Approvals over all decisions; 0 when nothing was decided
    pub fn approval_rate(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            self.count(Decision::Approve) as f64 / self.records.len() as f64
        }
    }

    /// Whether the last entry approves `version`
    pub fn finalises(&self, version: u32) -> bool {
        self.last()
            .is_some_and(|r| r.decision() == Decision::Approve && r.artifact_version() == version)
    }
}

/// Feedback carried into the next drafting round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRequest {
    /// Version the comments apply to
    pub artifact_version: u32,
    pub comments: String,
}

impl RevisionRequest {
    /// Build from a `Revise` record; `None` for other decisions
    pub fn from_record(record: &ApprovalRecord) -> Option<Self> {
        (record.decision() == Decision::Revise).then(|| Self {
            artifact_version: record.artifact_version(),
            comments: record.comments().unwrap_or_default().to_string(),
        })
    }

    pub fn has_comments(&self) -> bool {
        !self.comments.trim().is_empty()
    }
}
