//! Scenario driver
//!
//! Selects scenarios by id, runs each through the coordinator and collects
//! per-run metrics. Unknown ids stop the batch before anything runs; a
//! failing run is recorded in its metrics, with whatever it drafted and
//! decided before the failure, and the batch carries on.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::join_all;

use som_agent::{Llm, SomFileConfig};

use crate::checkpoint::CheckpointGate;
use crate::coordinator::{CoordinatorConfig, OuterTeamCoordinator};
use crate::error::DriverError;
use crate::metrics::{BatchSummary, RunMetrics};
use crate::results::{JsonResultsStore, ResultsStore};
use crate::roles::RoleRegistry;
use crate::scenario::{Scenario, ScenarioCatalog};

/// Configuration for the scenario driver
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    pub coordinator: CoordinatorConfig,

    /// Run the scenarios of a batch concurrently
    pub parallel: bool,

    /// Write each run report here when set
    pub results_dir: Option<PathBuf>,
}

impl DriverConfig {
    /// Create from file config
    pub fn from_file_config(config: &SomFileConfig) -> anyhow::Result<Self> {
        Ok(Self {
            coordinator: CoordinatorConfig::from_file_config(config)?,
            parallel: config.run.parallel,
            results_dir: config.run.results_dir.clone(),
        })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(dir.into());
        self
    }
}

/// Runs batches of scenarios
pub struct ScenarioDriver {
    catalog: ScenarioCatalog,
    coordinator: OuterTeamCoordinator,
    parallel: bool,
    store: Option<Box<dyn ResultsStore>>,
}

impl ScenarioDriver {
    pub fn new(
        config: DriverConfig,
        catalog: ScenarioCatalog,
        registry: RoleRegistry,
        llm: Arc<dyn Llm>,
        gate: Arc<dyn CheckpointGate>,
    ) -> Self {
        let store = config
            .results_dir
            .map(|dir| Box::new(JsonResultsStore::new(dir)) as Box<dyn ResultsStore>);

        Self {
            catalog,
            coordinator: OuterTeamCoordinator::new(config.coordinator, registry, llm, gate),
            parallel: config.parallel,
            store,
        }
    }

    /// Set a custom results store
    pub fn with_store(mut self, store: Box<dyn ResultsStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// Run the given scenarios in the given order
    pub async fn execute<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<Vec<(Scenario, RunMetrics)>, DriverError> {
        let scenarios = ids
            .iter()
            .map(|id| {
                self.catalog
                    .get(id.as_ref())
                    .cloned()
                    .ok_or_else(|| DriverError::UnknownScenario(id.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(runs = scenarios.len(), parallel = self.parallel, "Batch started");

        let metrics = if self.parallel {
            join_all(scenarios.iter().map(|s| self.run_one(s)))
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut metrics = Vec::with_capacity(scenarios.len());
            for scenario in &scenarios {
                metrics.push(self.run_one(scenario).await?);
            }
            metrics
        };

        Ok(scenarios.into_iter().zip(metrics).collect())
    }

    /// Run every catalog scenario in id order
    pub async fn execute_all(&self) -> Result<Vec<(Scenario, RunMetrics)>, DriverError> {
        let ids = self.catalog.ids();
        self.execute(ids.as_slice()).await
    }

    /// Aggregate metrics of a batch
    pub fn summary(metrics: &[RunMetrics]) -> BatchSummary {
        BatchSummary::from_metrics(metrics)
    }

    async fn run_one(&self, scenario: &Scenario) -> Result<RunMetrics, DriverError> {
        match self.coordinator.run_tracked(scenario).await {
            Ok(report) => {
                if let Some(store) = &self.store {
                    let path = store.save(&report)?;
                    println!("  Results saved to {}", path.display());
                }
                Ok(report.metrics)
            }
            Err(failed) => {
                tracing::warn!(scenario = %scenario.id, error = %failed.error, "Run failed");
                println!("  ✗ {}: {}", scenario.id, failed.error);
                Ok(failed.metrics)
            }
        }
    }
}
