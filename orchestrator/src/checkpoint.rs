//! Checkpoint gates for human-in-loop approval
//!
//! A run pauses at each checkpoint until its gate returns an approval
//! record. The interactive gate asks a person on stdin; the other gates
//! decide by policy for CI, demos and tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::approval::{ApprovalRecord, ApprovalSource, Decision};
use crate::artifact::Artifact;
use crate::error::GateError;

/// An artifact presented for approval
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub scenario_id: String,
    /// Stable across the versions of one run
    pub artifact_id: Uuid,
    /// Message to display to the user
    pub message: String,
    pub artifact_version: u32,
    /// Rendered artifact shown before the prompt
    pub content: String,
    pub quality_score: Option<f64>,
    /// Revision rounds still available after this one
    pub revisions_left: u32,
}

impl Checkpoint {
    /// Build a checkpoint for an artifact
    pub fn for_artifact(artifact: &Artifact, message: impl Into<String>) -> Self {
        Self {
            scenario_id: artifact.scenario_id.clone(),
            artifact_id: artifact.id,
            message: message.into(),
            artifact_version: artifact.version,
            content: artifact.render(),
            quality_score: artifact.quality_score(),
            revisions_left: 0,
        }
    }

    pub fn with_revisions_left(mut self, revisions_left: u32) -> Self {
        self.revisions_left = revisions_left;
        self
    }

    fn display(&self) {
        println!("\n{}", "═".repeat(60));
        println!(
            "  CHECKPOINT: {} (version {})",
            self.scenario_id, self.artifact_version
        );
        println!("{}\n", "═".repeat(60));

        println!("{}\n", self.content.trim_end());
        println!("{}", "─".repeat(60));

        if let Some(score) = self.quality_score {
            println!("  Quality score: {:.1}/100", score);
        }
        println!("  Revisions left: {}", self.revisions_left);
        println!("\n{}\n", self.message);
    }
}

/// A decision source for checkpoints
#[async_trait]
pub trait CheckpointGate: Send + Sync {
    /// Present the checkpoint and wait for a decision
    async fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<ApprovalRecord, GateError>;
}

/// Operator input understood by the interactive gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorInput {
    Approve(Option<String>),
    Revise(Option<String>),
    Reject,
    /// Anything else; treated as a rejection
    Unrecognised(String),
}

impl OperatorInput {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let (command, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, Some(rest.trim().to_string())),
            None => (trimmed, None),
        };
        let rest = rest.filter(|r| !r.is_empty());

        match command.to_lowercase().as_str() {
            "" | "y" | "yes" | "approve" if rest.is_none() => Self::Approve(None),
            "note" if rest.is_some() => Self::Approve(rest),
            "r" | "revise" => Self::Revise(rest),
            "n" | "no" | "reject" if rest.is_none() => Self::Reject,
            _ => Self::Unrecognised(trimmed.to_string()),
        }
    }

    /// Record for the given artifact version
    pub fn into_record(self, artifact_version: u32) -> ApprovalRecord {
        let (decision, comments) = match self {
            Self::Approve(note) => (Decision::Approve, note),
            Self::Revise(comments) => (Decision::Revise, comments),
            Self::Reject | Self::Unrecognised(_) => (Decision::Reject, None),
        };
        ApprovalRecord::new(artifact_version, decision, comments, ApprovalSource::Human)
    }
}

/// Asks a person on stdin
///
/// Lines come from a single reader thread through a channel, so a checkpoint
/// abandoned on timeout leaves nothing blocked; answers typed after that
/// are dropped before the next prompt.
pub struct InteractiveGate {
    lines: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

impl InteractiveGate {
    /// Gate reading from the process's stdin
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Stopped reading checkpoint input");
                        break;
                    }
                }
            }
        });
        Self::from_lines(rx)
    }

    /// Gate reading operator lines from a channel
    pub fn from_lines(lines: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            lines: tokio::sync::Mutex::new(lines),
        }
    }

    fn print_options() -> Result<(), GateError> {
        println!("Options:");
        println!("  [y/yes]        - Approve this version");
        println!("  [r/revise ...] - Request a revision with comments");
        println!("  [n/no]         - Reject and stop the run");
        println!("  [note TEXT]    - Approve with a note");
        println!();

        print!("Your choice: ");
        io::stdout().flush()?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointGate for InteractiveGate {
    async fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<ApprovalRecord, GateError> {
        let mut lines = self.lines.lock().await;

        let mut stale = 0;
        while lines.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            tracing::debug!(stale, "Discarded input typed after an earlier checkpoint closed");
        }

        checkpoint.display();
        Self::print_options()?;

        let line = lines.recv().await.ok_or(GateError::Closed)?;
        let mut input = OperatorInput::parse(&line);
        if input == OperatorInput::Revise(None) {
            println!("\nEnter revision comments (end with empty line):");
            let mut comments = Vec::new();
            while let Some(line) = lines.recv().await {
                if line.trim().is_empty() {
                    break;
                }
                comments.push(line);
            }
            let comments = comments.join("\n");
            input = OperatorInput::Revise(Some(comments).filter(|c| !c.trim().is_empty()));
        }
        if let OperatorInput::Unrecognised(raw) = &input {
            println!("Unrecognised input {:?}, treating as rejection.", raw);
        }

        println!("\n{}", "═".repeat(60));
        Ok(input.into_record(checkpoint.artifact_version))
    }
}

/// Approves every checkpoint (non-interactive mode)
pub struct AutoApproveGate;

#[async_trait]
impl CheckpointGate for AutoApproveGate {
    async fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<ApprovalRecord, GateError> {
        println!(
            "\n[Checkpoint: {} v{}] Auto-approved (non-interactive mode)",
            checkpoint.scenario_id, checkpoint.artifact_version
        );
        Ok(ApprovalRecord::approve(checkpoint.artifact_version).with_source(
            ApprovalSource::Auto {
                reason: "non-interactive mode".to_string(),
            },
        ))
    }
}

/// Rejects every checkpoint
pub struct RejectGate;

#[async_trait]
impl CheckpointGate for RejectGate {
    async fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<ApprovalRecord, GateError> {
        println!(
            "\n[Checkpoint: {} v{}] Auto-rejected",
            checkpoint.scenario_id, checkpoint.artifact_version
        );
        Ok(ApprovalRecord::reject(checkpoint.artifact_version).with_source(
            ApprovalSource::Auto {
                reason: "reject gate".to_string(),
            },
        ))
    }
}

/// One scripted answer
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Decide(Decision, Option<String>),
    /// Never answer (exercises checkpoint timeouts)
    Hang,
    Fail(GateError),
}

/// Replays scripted answers in order, approving once the script runs out
#[derive(Debug, Default)]
pub struct ScriptedGate {
    steps: Mutex<VecDeque<ScriptStep>>,
    seen: Mutex<Vec<(Uuid, u32)>>,
}

impl ScriptedGate {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Gate that answers with the given decisions, without comments
    pub fn decisions(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self::new(decisions.into_iter().map(|d| ScriptStep::Decide(d, None)))
    }

    /// Artifact versions presented so far, in order
    pub fn presented(&self) -> Vec<u32> {
        self.seen
            .lock()
            .map(|s| s.iter().map(|(_, version)| *version).collect())
            .unwrap_or_default()
    }

    /// Artifact ids presented so far, in order
    pub fn presented_artifacts(&self) -> Vec<Uuid> {
        self.seen
            .lock()
            .map(|s| s.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    fn next_step(&self) -> Option<ScriptStep> {
        self.steps.lock().ok().and_then(|mut s| s.pop_front())
    }
}

#[async_trait]
impl CheckpointGate for ScriptedGate {
    async fn checkpoint(&self, checkpoint: &Checkpoint) -> Result<ApprovalRecord, GateError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((checkpoint.artifact_id, checkpoint.artifact_version));
        }
        let version = checkpoint.artifact_version;
        match self.next_step() {
            Some(ScriptStep::Decide(decision, comments)) => Ok(ApprovalRecord::new(
                version,
                decision,
                comments,
                ApprovalSource::Human,
            )),
            Some(ScriptStep::Hang) => std::future::pending().await,
            Some(ScriptStep::Fail(err)) => Err(err),
            None => Ok(ApprovalRecord::approve(version)),
        }
    }
}
