//! Configuration loading

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the project/global configuration file
pub const CONFIG_FILE: &str = ".som.toml";

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at ~/.config/som/
///
/// Returns the path if found, None otherwise.
fn find_config_file(filename: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("som").join(filename);
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

/// Global configuration directory (~/.config/som), if the platform has one
pub fn global_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("som"))
}

// ============================================================================
// File configuration (.som.toml)
// ============================================================================

/// Top-level configuration (from .som.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SomFileConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub run: RunSectionConfig,
    #[serde(default)]
    pub retry: RetrySectionConfig,
    #[serde(default)]
    pub checkpoint: CheckpointSectionConfig,
    /// Per-role overrides, keyed by role identifier (e.g. "data_analyst")
    #[serde(default)]
    pub roles: Vec<RoleOverride>,
}

/// Which backend answers completion requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(alias = "open_ai")]
    OpenAi,
    Ollama,
    Offline,
}

impl std::str::FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "offline" => Ok(Self::Offline),
            _ => Err(anyhow::anyhow!("Unknown provider: {}", s)),
        }
    }
}

/// LLM configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-call timeout; expiry is reported as model unavailable
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Run configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct RunSectionConfig {
    /// Revision rounds allowed before a run is closed as rejected
    #[serde(default = "default_max_revisions")]
    pub max_revisions: u32,
    /// Run scenarios of a batch concurrently
    #[serde(default)]
    pub parallel: bool,
    /// Directory where run reports are written
    #[serde(default)]
    pub results_dir: Option<PathBuf>,
    /// Skip the human gate when the quality score reaches this value (0-100)
    #[serde(default)]
    pub auto_approve_threshold: Option<f64>,
    /// Directory with custom scenario definitions
    #[serde(default)]
    pub scenarios_dir: Option<PathBuf>,
}

/// Retry configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySectionConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

/// What happens when a human does not answer a checkpoint in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnTimeout {
    /// Record a revision request without comments
    Revise,
    /// End the run as rejected
    Abort,
}

/// Checkpoint configuration section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckpointSectionConfig {
    /// Unbounded when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Required whenever `timeout_secs` is set
    #[serde(default)]
    pub on_timeout: Option<OnTimeout>,
}

/// Override for a single role
#[derive(Debug, Clone, Deserialize)]
pub struct RoleOverride {
    pub role: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

// Default value functions
fn default_provider() -> Provider {
    Provider::OpenAi
}

fn default_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_revisions() -> u32 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    8000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url: default_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RunSectionConfig {
    fn default() -> Self {
        Self {
            max_revisions: default_max_revisions(),
            parallel: false,
            results_dir: None,
            auto_approve_threshold: None,
            scenarios_dir: None,
        }
    }
}

impl Default for RetrySectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl SomFileConfig {
    /// Load config from .som.toml
    ///
    /// Search order:
    /// 1. Walk up directory tree from cwd looking for .som.toml
    /// 2. Check ~/.config/som/.som.toml (global fallback)
    /// 3. Fall back to defaults
    pub fn load() -> Result<Self> {
        if let Some(config_path) = find_config_file(CONFIG_FILE) {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SomFileConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that would leave a policy implicit
    pub fn validate(&self) -> Result<()> {
        if self.checkpoint.timeout_secs.is_some() && self.checkpoint.on_timeout.is_none() {
            anyhow::bail!(
                "checkpoint.timeout_secs is set but checkpoint.on_timeout is missing (use \"revise\" or \"abort\")"
            );
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if let Some(threshold) = self.run.auto_approve_threshold {
            if !(0.0..=100.0).contains(&threshold) {
                anyhow::bail!("run.auto_approve_threshold must be within 0..=100, got {}", threshold);
            }
        }
        Ok(())
    }
}
