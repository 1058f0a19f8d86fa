//! Driver batches

use std::sync::Arc;

use som_orchestrator::{
    AutoApproveGate, CheckpointGate, Decision, DriverConfig, DriverError, RoleRegistry,
    RunOutcome, ScenarioCatalog, ScenarioDriver, ScriptedGate,
};

use crate::support::{fast_config, FlakyLlm};

fn driver(llm: Arc<FlakyLlm>, parallel: bool) -> ScenarioDriver {
    driver_with_gate(llm, parallel, Arc::new(AutoApproveGate))
}

fn driver_with_gate(
    llm: Arc<FlakyLlm>,
    parallel: bool,
    gate: Arc<dyn CheckpointGate>,
) -> ScenarioDriver {
    let config = DriverConfig {
        coordinator: fast_config(),
        ..DriverConfig::default()
    }
    .with_parallel(parallel);

    ScenarioDriver::new(
        config,
        ScenarioCatalog::builtin(),
        RoleRegistry::default(),
        llm,
        gate,
    )
}

#[tokio::test]
async fn test_unknown_id_stops_the_batch_before_any_run() {
    let llm = Arc::new(FlakyLlm::healthy());
    let err = driver(llm.clone(), false)
        .execute(&["crisis_management", "does_not_exist"])
        .await
        .unwrap_err();

    assert_eq!(err, DriverError::UnknownScenario("does_not_exist".to_string()));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_failed_run_is_recorded_and_batch_continues() {
    for parallel in [false, true] {
        let llm = Arc::new(FlakyLlm::poisoned("data breach"));
        let results = driver(llm, parallel)
            .execute(&["crisis_management", "product_launch"])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        let (crisis, crisis_metrics) = &results[0];
        assert_eq!(crisis.id, "crisis_management");
        match &crisis_metrics.outcome {
            RunOutcome::Failed { error } => assert!(error.contains("crisis_management")),
            other => panic!("expected failure, got {:?}", other),
        }

        let (launch, launch_metrics) = &results[1];
        assert_eq!(launch.id, "product_launch");
        assert!(launch_metrics.is_final());

        let metrics: Vec<_> = results.iter().map(|(_, m)| m.clone()).collect();
        let summary = ScenarioDriver::summary(&metrics);
        assert_eq!(summary.total_runs, 2);
        assert_eq!(summary.finalised, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.approval_rate, 1.0);
    }
}

#[tokio::test]
async fn test_failed_run_metrics_keep_earlier_decisions() {
    let llm = Arc::new(FlakyLlm::failing_after(12));
    let gate = Arc::new(ScriptedGate::decisions([Decision::Revise]));
    let results = driver_with_gate(llm, false, gate)
        .execute(&["product_launch"])
        .await
        .unwrap();

    let (_, metrics) = &results[0];
    assert!(matches!(metrics.outcome, RunOutcome::Failed { .. }));
    assert_eq!(metrics.revisions, 1);
    assert_eq!(metrics.drafting_rounds, 2);
    assert!(metrics.model_calls > 12);

    let summary = ScenarioDriver::summary(&[metrics.clone()]);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total_interventions, 1);
}
