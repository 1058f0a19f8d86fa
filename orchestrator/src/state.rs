//! Per-run state machine
//!
//! ```text
//! Drafting -> AwaitingApproval -> Drafting  (revise)
//!                              -> Final     (approve)
//!                              -> Rejected  (reject)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Drafting,
    AwaitingApproval,
    Final,
    Rejected,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Final | Self::Rejected)
    }

    /// Whether `self -> next` is a legal move
    pub fn can_advance(&self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Drafting, AwaitingApproval)
                | (AwaitingApproval, Drafting)
                | (AwaitingApproval, Final)
                | (AwaitingApproval, Rejected)
        )
    }

    /// Move to `next`, or fail with `InvalidTransition`
    pub fn advance(&mut self, next: RunState) -> Result<(), ScenarioError> {
        if !self.can_advance(next) {
            return Err(ScenarioError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::trace!(from = %self, to = %next, "Run state transition");
        *self = next;
        Ok(())
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Drafting => "drafting",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Final => "final",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = RunState::default();
        assert_eq!(state, RunState::Drafting);
        state.advance(RunState::AwaitingApproval).unwrap();
        state.advance(RunState::Drafting).unwrap();
        state.advance(RunState::AwaitingApproval).unwrap();
        state.advance(RunState::Final).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        for terminal in [RunState::Final, RunState::Rejected] {
            for next in [
                RunState::Drafting,
                RunState::AwaitingApproval,
                RunState::Final,
                RunState::Rejected,
            ] {
                let mut state = terminal;
                assert!(state.advance(next).is_err());
                assert_eq!(state, terminal);
            }
        }
    }

    #[test]
    fn test_only_a_checkpoint_can_reject() {
        let mut state = RunState::Drafting;
        assert!(!state.can_advance(RunState::Rejected));
        assert!(matches!(
            state.advance(RunState::Rejected),
            Err(ScenarioError::InvalidTransition {
                from: RunState::Drafting,
                to: RunState::Rejected
            })
        ));
        assert_eq!(state, RunState::Drafting);

        state.advance(RunState::AwaitingApproval).unwrap();
        state.advance(RunState::Rejected).unwrap();
    }

    #[test]
    fn test_cannot_finalise_without_checkpoint() {
        let mut state = RunState::Drafting;
        let err = state.advance(RunState::Final).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid run state transition: drafting -> final"
        );
    }
}
