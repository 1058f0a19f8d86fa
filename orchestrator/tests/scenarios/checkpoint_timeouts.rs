//! Checkpoint timeout policies

use std::sync::Arc;
use std::time::Duration;

use som_orchestrator::{
    ApprovalSource, Decision, InteractiveGate, OnTimeout, RejectReason, RunOutcome, RunState,
    Scenario, ScriptStep, ScriptedGate, SuccessCriterion,
};

use crate::support::{coordinator, fast_config, FlakyLlm};

fn scenario() -> Scenario {
    Scenario::new(
        "outage",
        "Respond to a regional payments outage",
        SuccessCriterion::QualityAtLeast(0.0),
    )
}

#[tokio::test]
async fn test_timeout_with_revise_policy_starts_another_round() {
    let gate = Arc::new(ScriptedGate::new([ScriptStep::Hang]));
    let config = fast_config().with_checkpoint_timeout(Duration::from_millis(20), OnTimeout::Revise);

    let report = coordinator(config, Arc::new(FlakyLlm::healthy()), gate.clone())
        .run(&scenario())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Final);
    assert_eq!(report.artifact.version, 2);

    let first = &report.approvals.records()[0];
    assert_eq!(first.decision(), Decision::Revise);
    assert_eq!(first.source(), &ApprovalSource::Timeout);
    assert!(first.comments().is_none());
    assert_eq!(report.metrics.human_interventions, 1);
    assert!(report.criterion_met);
}

#[tokio::test]
async fn test_timeout_with_abort_policy_rejects() {
    let gate = Arc::new(ScriptedGate::new([ScriptStep::Hang]));
    let config = fast_config().with_checkpoint_timeout(Duration::from_millis(20), OnTimeout::Abort);

    let report = coordinator(config, Arc::new(FlakyLlm::healthy()), gate.clone())
        .run(&scenario())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Rejected);
    assert_eq!(
        report.metrics.outcome,
        RunOutcome::Rejected {
            reason: RejectReason::CheckpointTimeout
        }
    );
    assert_eq!(gate.presented(), vec![1]);
    assert!(!report.criterion_met);
}

#[tokio::test]
async fn test_prompt_answer_beats_the_timeout() {
    let gate = Arc::new(ScriptedGate::decisions([Decision::Approve]));
    let config = fast_config().with_checkpoint_timeout(Duration::from_secs(30), OnTimeout::Abort);

    let report = coordinator(config, Arc::new(FlakyLlm::healthy()), gate)
        .run(&scenario())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Final);
    assert!(report.approvals.last().unwrap().source().is_human());
}

#[tokio::test]
async fn test_interactive_gate_times_out_cleanly() {
    // input stays open but nobody answers
    let (operator, lines) = tokio::sync::mpsc::unbounded_channel::<String>();
    let gate = Arc::new(InteractiveGate::from_lines(lines));
    let config = fast_config().with_checkpoint_timeout(Duration::from_millis(20), OnTimeout::Abort);

    let report = coordinator(config, Arc::new(FlakyLlm::healthy()), gate)
        .run(&scenario())
        .await
        .unwrap();

    assert_eq!(
        report.metrics.outcome,
        RunOutcome::Rejected {
            reason: RejectReason::CheckpointTimeout
        }
    );
    assert_eq!(report.approvals.last().unwrap().source(), &ApprovalSource::Timeout);
    drop(operator);
}
