//! Persisted run reports

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::coordinator::RunReport;
use crate::error::DriverError;

/// Where finished run reports go
pub trait ResultsStore: Send + Sync {
    /// Persist a report, returning where it was written
    fn save(&self, report: &RunReport) -> Result<PathBuf, DriverError>;
}

/// Writes `scenario_<id>_<YYYYmmdd_HHMMSS>_<artifact>.json` files into a
/// directory, where `<artifact>` is the first eight hex digits of the run's
/// artifact id
#[derive(Debug, Clone)]
pub struct JsonResultsStore {
    dir: PathBuf,
}

impl JsonResultsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(scenario_id: &str, artifact_id: Uuid) -> String {
        let mut short = artifact_id.simple().to_string();
        short.truncate(8);
        format!(
            "scenario_{}_{}_{}.json",
            scenario_id,
            Utc::now().format("%Y%m%d_%H%M%S"),
            short
        )
    }
}

impl ResultsStore for JsonResultsStore {
    fn save(&self, report: &RunReport) -> Result<PathBuf, DriverError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            DriverError::Store(format!("failed to create {}: {}", self.dir.display(), e))
        })?;

        let path = self
            .dir
            .join(Self::file_name(&report.scenario_id, report.artifact.id));
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| DriverError::Store(format!("failed to serialize report: {}", e)))?;
        std::fs::write(&path, json)
            .map_err(|e| DriverError::Store(format!("failed to write {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Run report saved");
        Ok(path)
    }
}
