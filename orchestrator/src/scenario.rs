//! Scenario definitions and catalog
//!
//! A scenario is a named business situation with a brief and a success
//! criterion. Built-in scenarios cover a product launch, a crisis response
//! and an interactive brief supplied at run time; custom scenarios load
//! from TOML files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::roles::TeamKind;

/// How a run decides it met its goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SuccessCriterion {
    /// Free-text statement for the human reviewer
    Text(String),
    /// Minimum rubric score (0-100) of the final artifact
    QualityAtLeast(f64),
}

impl SuccessCriterion {
    /// Whether a final quality score satisfies the criterion
    ///
    /// Text criteria are judged by the human at the checkpoint, so an
    /// approved artifact always satisfies them.
    pub fn is_met_by(&self, quality: f64) -> bool {
        match self {
            Self::Text(_) => true,
            Self::QualityAtLeast(threshold) => quality >= *threshold,
        }
    }
}

impl std::fmt::Display for SuccessCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::QualityAtLeast(score) => write!(f, "quality score of at least {:.0}/100", score),
        }
    }
}

/// A named business situation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique identifier (e.g. "product_launch")
    pub id: String,

    /// Human-readable name
    #[serde(default)]
    pub name: String,

    /// Initial brief handed to the teams
    #[serde(default)]
    pub brief: String,

    pub success_criterion: SuccessCriterion,

    /// Additional facts (budget, timeline, ...) in a stable order
    #[serde(default)]
    pub context: BTreeMap<String, String>,

    /// Inner teams to involve; all inner teams when empty
    #[serde(default)]
    pub teams: Vec<TeamKind>,
}

impl Scenario {
    /// Create a new scenario
    pub fn new(
        id: impl Into<String>,
        brief: impl Into<String>,
        success_criterion: SuccessCriterion,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            brief: brief.into(),
            success_criterion,
            context: BTreeMap::new(),
            teams: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_teams(mut self, teams: Vec<TeamKind>) -> Self {
        self.teams = teams;
        self
    }

    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = brief.into();
        self
    }

    /// Inner teams that take part, in execution order
    pub fn inner_teams(&self) -> Vec<TeamKind> {
        if self.teams.is_empty() {
            TeamKind::INNER.to_vec()
        } else {
            self.teams.iter().copied().filter(|t| t.is_inner()).collect()
        }
    }

    /// Whether the brief carries any content
    pub fn has_brief(&self) -> bool {
        !self.brief.trim().is_empty()
    }

    /// Brief followed by context lines
    pub fn full_brief(&self) -> String {
        let mut text = self.brief.trim().to_string();
        if !self.context.is_empty() {
            text.push_str("\n\nContext:");
            for (key, value) in &self.context {
                text.push_str(&format!("\n- {}: {}", key.replace('_', " "), value));
            }
        }
        text
    }

    /// Load scenario from TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ScenarioLoadError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScenarioLoadError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Load scenario from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ScenarioLoadError> {
        let mut scenario: Scenario =
            toml::from_str(toml_str).map_err(|e| ScenarioLoadError::Parse(e.to_string()))?;
        if scenario.name.is_empty() {
            scenario.name = scenario.id.clone();
        }
        Ok(scenario)
    }
}

/// Errors loading scenario files
#[derive(Debug, thiserror::Error)]
pub enum ScenarioLoadError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Built-in scenarios
pub fn builtin_scenarios() -> BTreeMap<String, Scenario> {
    let mut scenarios = BTreeMap::new();

    scenarios.insert(
        "product_launch".to_string(),
        Scenario::new(
            "product_launch",
            "Plan a comprehensive launch strategy for an AI-powered fitness tracking \
             mobile app: market penetration analysis, brand positioning and messaging, \
             technical launch infrastructure and the marketing campaign.",
            SuccessCriterion::QualityAtLeast(80.0),
        )
        .with_name("Product Launch Planning")
        .with_context("product", "AI-powered fitness tracking mobile app")
        .with_context("target_market", "Health-conscious millennials and Gen Z")
        .with_context("launch_timeline", "3 months")
        .with_context("budget", "$500,000"),
    );

    scenarios.insert(
        "crisis_management".to_string(),
        Scenario::new(
            "crisis_management",
            "Develop a rapid response to a potential data breach affecting user \
             accounts: incident assessment and containment, stakeholder communication, \
             technical remediation and the legal and compliance response.",
            SuccessCriterion::Text(
                "Containment, notification and remediation steps are owned and time-boxed"
                    .to_string(),
            ),
        )
        .with_name("Crisis Management Response")
        .with_context("incident", "Potential data breach affecting user accounts")
        .with_context("severity", "High")
        .with_context("affected_users", "~50,000 users")
        .with_context("discovery_time", "2 hours ago"),
    );

    // Brief is supplied at run time
    scenarios.insert(
        "interactive".to_string(),
        Scenario::new(
            "interactive",
            "",
            SuccessCriterion::Text("The human reviewer approves the deliverable".to_string()),
        )
        .with_name("Interactive Demonstration"),
    );

    scenarios
}

/// Load custom scenarios from a directory
pub fn load_custom_scenarios(dir: &Path) -> Result<BTreeMap<String, Scenario>, ScenarioLoadError> {
    let mut scenarios = BTreeMap::new();

    if !dir.exists() {
        return Ok(scenarios);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ScenarioLoadError::Io(e.to_string()))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            match Scenario::from_toml_file(&path) {
                Ok(scenario) => {
                    scenarios.insert(scenario.id.clone(), scenario);
                }
                Err(e) => {
                    tracing::warn!("Failed to load scenario from {:?}: {}", path, e);
                }
            }
        }
    }

    Ok(scenarios)
}

/// Built-in plus custom scenarios, custom entries taking precedence
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: BTreeMap<String, Scenario>,
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ScenarioCatalog {
    /// Catalog with only the built-in scenarios
    pub fn builtin() -> Self {
        Self {
            scenarios: builtin_scenarios(),
        }
    }

    /// Empty catalog
    pub fn empty() -> Self {
        Self {
            scenarios: BTreeMap::new(),
        }
    }

    /// Built-ins plus custom scenarios from the given and standard locations
    ///
    /// Search order (later entries override earlier ones):
    /// 1. ~/.config/som/scenarios
    /// 2. ./.som/scenarios
    /// 3. `dir`, when given
    pub fn discover(dir: Option<&Path>) -> Self {
        let mut catalog = Self::builtin();

        let mut dirs = Vec::new();
        if let Some(global) = som_agent::config::global_config_dir() {
            dirs.push(global.join("scenarios"));
        }
        if let Ok(cwd) = std::env::current_dir() {
            dirs.push(cwd.join(".som").join("scenarios"));
        }
        if let Some(dir) = dir {
            dirs.push(dir.to_path_buf());
        }

        for dir in dirs {
            match load_custom_scenarios(&dir) {
                Ok(custom) => catalog.scenarios.extend(custom),
                Err(e) => tracing::warn!("Failed to load custom scenarios: {}", e),
            }
        }

        catalog
    }

    pub fn insert(&mut self, scenario: Scenario) {
        self.scenarios.insert(scenario.id.clone(), scenario);
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenarios.contains_key(id)
    }

    /// Identifiers in sorted order
    pub fn ids(&self) -> Vec<String> {
        self.scenarios.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    /// Replace the brief of a scenario (used for the interactive scenario)
    pub fn set_brief(&mut self, id: &str, brief: impl Into<String>) -> bool {
        match self.scenarios.get_mut(id) {
            Some(scenario) => {
                scenario.brief = brief.into();
                true
            }
            None => false,
        }
    }
}
