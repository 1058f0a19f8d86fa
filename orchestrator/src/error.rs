//! Error types for teams, gates, runs and batches

use som_agent::LlmError;
use thiserror::Error;

use crate::roles::{AgentRole, TeamKind};
use crate::state::RunState;

/// Errors from an inner (or the outer) team while drafting
#[derive(Debug, Clone, Error)]
pub enum TeamError {
    /// A model call failed after the retry policy was exhausted, or with a
    /// non-transient error
    #[error("{team} / {role}: model call failed after {attempts} attempt(s): {source}")]
    Model {
        team: TeamKind,
        role: AgentRole,
        #[source]
        source: LlmError,
        attempts: u32,
    },

    #[error("team {0} has no members")]
    EmptyTeam(TeamKind),
}

/// Errors from a checkpoint gate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("checkpoint I/O error: {0}")]
    Io(String),

    /// The operator went away (EOF on stdin, script closed)
    #[error("checkpoint input closed")]
    Closed,
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors that end a single scenario run
#[derive(Debug, Clone, Error)]
pub enum ScenarioError {
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("scenario {scenario} failed: {reason}")]
    ScenarioFailed { scenario: String, reason: String },

    #[error("invalid run state transition: {from} -> {to}")]
    InvalidTransition { from: RunState, to: RunState },
}

impl ScenarioError {
    pub fn failed(scenario: impl Into<String>, reason: impl ToString) -> Self {
        Self::ScenarioFailed {
            scenario: scenario.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors that stop a whole driver batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("results store error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_error_display() {
        let err = TeamError::Model {
            team: TeamKind::CreativeDesign,
            role: AgentRole::ContentCreator,
            source: LlmError::ModelUnavailable("connection refused".to_string()),
            attempts: 3,
        };
        let text = err.to_string();
        assert!(text.contains("Creative & Design / Content Creator"));
        assert!(text.contains("3 attempt(s)"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_scenario_failed_helper() {
        let err = ScenarioError::failed("product_launch", "model down");
        assert_eq!(err.to_string(), "scenario product_launch failed: model down");
    }

    #[test]
    fn test_gate_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        assert_eq!(GateError::from(io), GateError::Io("pipe closed".to_string()));
    }
}
