//! Single runs through the outer coordinator

use std::sync::Arc;

use som_agent::LlmError;
use som_orchestrator::{
    ApprovalSource, ArtifactState, Decision, RejectReason, RunOutcome, RunState, Scenario,
    ScenarioCatalog, ScenarioError, ScriptStep, ScriptedGate, SuccessCriterion,
};

use crate::support::{coordinator, fast_config, FlakyLlm};

fn launch_product_x() -> Scenario {
    Scenario::new(
        "launch_x",
        "Launch Product X",
        SuccessCriterion::Text("Launch plan approved".to_string()),
    )
}

#[tokio::test]
async fn test_first_approval_finalises_after_one_checkpoint() {
    let gate = Arc::new(ScriptedGate::decisions([Decision::Approve]));
    let report = coordinator(fast_config(), Arc::new(FlakyLlm::healthy()), gate.clone())
        .run(&launch_product_x())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Final);
    assert_eq!(report.metrics.outcome, RunOutcome::Final);
    assert_eq!(gate.presented(), vec![1]);
    assert_eq!(report.metrics.human_interventions, 1);
    assert_eq!(report.metrics.approval_rate, 1.0);
}

#[tokio::test]
async fn test_final_artifact_has_single_trailing_approval() {
    let gate = Arc::new(ScriptedGate::new([
        ScriptStep::Decide(Decision::Revise, Some("name an owner per milestone".to_string())),
        ScriptStep::Decide(Decision::Revise, None),
        ScriptStep::Decide(Decision::Approve, Some("good to go".to_string())),
    ]));
    let report = coordinator(fast_config(), Arc::new(FlakyLlm::healthy()), gate.clone())
        .run(&launch_product_x())
        .await
        .unwrap();

    assert_eq!(report.artifact.state, ArtifactState::Final);
    assert_eq!(report.artifact.version, 3);

    let records = report.approvals.records();
    assert_eq!(report.approvals.count(Decision::Approve), 1);
    let last = records.last().unwrap();
    assert_eq!(last.decision(), Decision::Approve);
    assert_eq!(last.artifact_version(), report.artifact.version);
    assert_eq!(last.comments(), Some("good to go"));

    // every revise references the version it was made on; the next round is v+1
    let versions: Vec<u32> = records.iter().map(|r| r.artifact_version()).collect();
    assert_eq!(versions, vec![1, 2, 3]);
    assert_eq!(gate.presented(), versions);
    assert!((report.metrics.approval_rate - 1.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_brief_is_rejected_before_any_work() {
    let llm = Arc::new(FlakyLlm::healthy());
    let gate = Arc::new(ScriptedGate::default());
    let err = coordinator(fast_config(), llm.clone(), gate.clone())
        .run(&launch_product_x().with_brief(""))
        .await
        .unwrap_err();

    assert!(matches!(err, ScenarioError::InvalidScenario(_)));
    assert_eq!(llm.calls(), 0);
    assert!(gate.presented().is_empty());
}

#[tokio::test]
async fn test_rate_limits_do_not_reach_the_coordinator() {
    let llm = Arc::new(FlakyLlm::failing_first(
        2,
        LlmError::RateLimited { retry_after: None },
    ));
    let report = coordinator(
        fast_config(),
        llm.clone(),
        Arc::new(ScriptedGate::decisions([Decision::Approve])),
    )
    .run(&launch_product_x())
    .await
    .unwrap();

    assert_eq!(report.state, RunState::Final);
    assert_eq!(report.metrics.model_retries, 2);
    assert_eq!(report.metrics.model_calls, llm.calls());
    // nine inner roles and three coordination roles, plus two retries
    assert_eq!(report.metrics.model_calls, 14);
}

#[tokio::test]
async fn test_always_failing_model_fails_the_scenario() {
    let gate = Arc::new(ScriptedGate::default());
    let err = coordinator(fast_config(), Arc::new(FlakyLlm::always_failing()), gate.clone())
        .run(&launch_product_x())
        .await
        .unwrap_err();

    match err {
        ScenarioError::ScenarioFailed { scenario, reason } => {
            assert_eq!(scenario, "launch_x");
            assert!(reason.contains("3 attempt(s)"), "{}", reason);
        }
        other => panic!("expected ScenarioFailed, got {:?}", other),
    }
    assert!(gate.presented().is_empty());
}

#[tokio::test]
async fn test_permanent_model_error_is_not_retried() {
    let llm = Arc::new(FlakyLlm::failing_first(
        1,
        LlmError::Api {
            status: 401,
            message: "invalid api key".to_string(),
        },
    ));
    let result = coordinator(fast_config(), llm.clone(), Arc::new(ScriptedGate::default()))
        .run(&launch_product_x())
        .await;

    assert!(matches!(result, Err(ScenarioError::ScenarioFailed { .. })));
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_every_builtin_scenario_terminates() {
    let mut catalog = ScenarioCatalog::builtin();
    catalog.set_brief("interactive", "Plan a two-day developer conference");

    for scenario in catalog.iter() {
        // a reviewer who never stops asking for changes
        let gate = Arc::new(ScriptedGate::decisions(vec![Decision::Revise; 20]));
        let report = coordinator(fast_config(), Arc::new(FlakyLlm::healthy()), gate.clone())
            .run(scenario)
            .await
            .unwrap();

        assert!(report.state.is_terminal(), "{}", scenario.id);
        assert_eq!(
            report.metrics.outcome,
            RunOutcome::Rejected {
                reason: RejectReason::RevisionLimit
            }
        );
        // default limit of five revisions: versions 1..=6 are presented
        assert_eq!(gate.presented(), (1..=6).collect::<Vec<u32>>());
        assert_eq!(report.metrics.drafting_rounds, 6);
        assert!((0.0..=1.0).contains(&report.metrics.approval_rate));

        let quality = report.metrics.quality_score.unwrap();
        assert!((0.0..=100.0).contains(&quality), "{}", quality);
    }
}

#[tokio::test]
async fn test_gate_failure_fails_the_scenario() {
    let gate = Arc::new(ScriptedGate::new([ScriptStep::Fail(
        som_orchestrator::GateError::Closed,
    )]));
    let result = coordinator(fast_config(), Arc::new(FlakyLlm::healthy()), gate)
        .run(&launch_product_x())
        .await;
    assert!(matches!(result, Err(ScenarioError::ScenarioFailed { .. })));
}

#[tokio::test]
async fn test_quality_threshold_auto_approves() {
    let gate = Arc::new(ScriptedGate::decisions([Decision::Reject]));
    let report = coordinator(
        fast_config().with_auto_approve_threshold(0.0),
        Arc::new(FlakyLlm::healthy()),
        gate.clone(),
    )
    .run(&launch_product_x())
    .await
    .unwrap();

    assert_eq!(report.state, RunState::Final);
    assert!(gate.presented().is_empty());
    let record = report.approvals.last().unwrap();
    assert!(matches!(record.source(), ApprovalSource::Auto { .. }));
}

#[tokio::test]
async fn test_failure_after_a_revise_keeps_what_the_run_recorded() {
    // one full round is twelve calls; the second round never gets going
    let llm = Arc::new(FlakyLlm::failing_after(12));
    let gate = Arc::new(ScriptedGate::new([ScriptStep::Decide(
        Decision::Revise,
        Some("tighten the budget".to_string()),
    )]));

    let failed = coordinator(fast_config(), llm.clone(), gate.clone())
        .run_tracked(&launch_product_x())
        .await
        .unwrap_err();

    assert!(matches!(failed.error, ScenarioError::ScenarioFailed { .. }));
    assert_eq!(gate.presented(), vec![1]);

    let metrics = &failed.metrics;
    assert!(matches!(metrics.outcome, RunOutcome::Failed { .. }));
    assert_eq!(metrics.revisions, 1);
    assert_eq!(metrics.decisions(), 1);
    assert_eq!(metrics.human_interventions, 1);
    assert_eq!(metrics.drafting_rounds, 2);
    assert_eq!(metrics.model_calls, llm.calls());
    assert_eq!(metrics.model_calls, 15);
    assert_eq!(metrics.model_retries, 2);
    assert!(metrics.quality_score.is_some());
}

#[tokio::test]
async fn test_revision_limit_rejects_from_the_checkpoint() {
    let gate = Arc::new(ScriptedGate::decisions([Decision::Revise, Decision::Revise]));
    let report = coordinator(
        fast_config().with_max_revisions(1),
        Arc::new(FlakyLlm::healthy()),
        gate,
    )
    .run(&launch_product_x())
    .await
    .unwrap();

    assert_eq!(report.state, RunState::Rejected);
    assert_eq!(report.artifact.version, 2);
    assert_eq!(report.approvals.count(Decision::Revise), 2);
}
