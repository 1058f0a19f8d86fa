//! Agent roles, team membership and per-role configuration
//!
//! Roles are a closed set. Each variant declares its team, prompt, default
//! sampling temperature and the capabilities it contributes to a draft.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use som_agent::config::RoleOverride;
use som_agent::{CompletionRequest, Message};

use crate::prompts;

/// A team of roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamKind {
    ResearchAnalysis,
    CreativeDesign,
    TechnicalImplementation,
    /// The outer coordination layer
    Coordination,
}

impl TeamKind {
    /// Inner teams in their default execution order
    pub const INNER: [TeamKind; 3] = [
        TeamKind::ResearchAnalysis,
        TeamKind::CreativeDesign,
        TeamKind::TechnicalImplementation,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::ResearchAnalysis => "research_analysis",
            Self::CreativeDesign => "creative_design",
            Self::TechnicalImplementation => "technical_implementation",
            Self::Coordination => "coordination",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ResearchAnalysis => "Research & Analysis",
            Self::CreativeDesign => "Creative & Design",
            Self::TechnicalImplementation => "Technical Implementation",
            Self::Coordination => "Coordination",
        }
    }

    pub fn is_inner(&self) -> bool {
        !matches!(self, Self::Coordination)
    }

    /// First member offering `capability`
    pub fn member_with(&self, capability: Capability) -> Option<AgentRole> {
        self.roles()
            .iter()
            .copied()
            .find(|role| role.has_capability(capability))
    }

    /// Members in speaking order; the last member synthesises
    pub fn roles(&self) -> &'static [AgentRole] {
        match self {
            Self::ResearchAnalysis => &[
                AgentRole::ResearchSpecialist,
                AgentRole::DataAnalyst,
                AgentRole::ReportWriter,
            ],
            Self::CreativeDesign => &[
                AgentRole::CreativeStrategist,
                AgentRole::ContentCreator,
                AgentRole::VisualDesigner,
            ],
            Self::TechnicalImplementation => &[
                AgentRole::SystemArchitect,
                AgentRole::Developer,
                AgentRole::QaEngineer,
            ],
            Self::Coordination => &[
                AgentRole::TeamCoordinator,
                AgentRole::ResourceManager,
                AgentRole::QualityAssurance,
            ],
        }
    }

    /// What the team is expected to deliver for any scenario
    pub fn objectives(&self) -> &'static str {
        match self {
            Self::ResearchAnalysis => {
                "Deliver a market and situation analysis: size and trends, competitive \
                 landscape, affected segments, risks with mitigations, and data-driven \
                 recommendations with success metrics."
            }
            Self::CreativeDesign => {
                "Deliver a communication strategy: positioning, primary and supporting \
                 messages, channel copy, voice guidelines and the visual identity the \
                 plan needs."
            }
            Self::TechnicalImplementation => {
                "Deliver an implementation plan: architecture, delivery phases, \
                 security and scalability concerns, test strategy and deployment steps."
            }
            Self::Coordination => {
                "Integrate the inner team drafts, resolve conflicts between them and \
                 prepare the deliverable for human approval."
            }
        }
    }
}

impl std::fmt::Display for TeamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for TeamKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        [
            Self::ResearchAnalysis,
            Self::CreativeDesign,
            Self::TechnicalImplementation,
            Self::Coordination,
        ]
        .into_iter()
        .find(|t| t.id() == normalized)
        .ok_or_else(|| UnknownName::Team(s.to_string()))
    }
}

/// What a role contributes to a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Analyse,
    Draft,
    Synthesise,
    Review,
    Coordinate,
    Allocate,
}

impl Capability {
    /// What a role is asked to do when it speaks with this capability
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Analyse => {
                "Add your analysis from your role's perspective: findings, supporting \
                 data and the risks they imply."
            }
            Self::Draft => "Add your contribution from your role's perspective.",
            Self::Synthesise => {
                "Synthesise the contributions above into the team's draft. \
                 Keep every concrete recommendation and resolve disagreements."
            }
            Self::Review => {
                "Assess each section below against the brief and the success criterion, \
                 one finding per team, then say whether the deliverable is ready for approval."
            }
            Self::Coordinate => {
                "Integrate the team drafts below into one coherent plan. Name owners, \
                 sequence the work and flag conflicts between teams."
            }
            Self::Allocate => {
                "Allocate budget, time and people across the teams below within the \
                 constraints of the brief, and flag anything that does not fit."
            }
        }
    }
}

/// A named persona bound to a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    ResearchSpecialist,
    DataAnalyst,
    ReportWriter,
    CreativeStrategist,
    ContentCreator,
    VisualDesigner,
    SystemArchitect,
    Developer,
    QaEngineer,
    TeamCoordinator,
    ResourceManager,
    QualityAssurance,
}

impl AgentRole {
    pub const ALL: [AgentRole; 12] = [
        AgentRole::ResearchSpecialist,
        AgentRole::DataAnalyst,
        AgentRole::ReportWriter,
        AgentRole::CreativeStrategist,
        AgentRole::ContentCreator,
        AgentRole::VisualDesigner,
        AgentRole::SystemArchitect,
        AgentRole::Developer,
        AgentRole::QaEngineer,
        AgentRole::TeamCoordinator,
        AgentRole::ResourceManager,
        AgentRole::QualityAssurance,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::ResearchSpecialist => "research_specialist",
            Self::DataAnalyst => "data_analyst",
            Self::ReportWriter => "report_writer",
            Self::CreativeStrategist => "creative_strategist",
            Self::ContentCreator => "content_creator",
            Self::VisualDesigner => "visual_designer",
            Self::SystemArchitect => "system_architect",
            Self::Developer => "developer",
            Self::QaEngineer => "qa_engineer",
            Self::TeamCoordinator => "team_coordinator",
            Self::ResourceManager => "resource_manager",
            Self::QualityAssurance => "quality_assurance",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ResearchSpecialist => "Research Specialist",
            Self::DataAnalyst => "Data Analyst",
            Self::ReportWriter => "Report Writer",
            Self::CreativeStrategist => "Creative Strategist",
            Self::ContentCreator => "Content Creator",
            Self::VisualDesigner => "Visual Designer",
            Self::SystemArchitect => "System Architect",
            Self::Developer => "Developer",
            Self::QaEngineer => "QA Engineer",
            Self::TeamCoordinator => "Team Coordinator",
            Self::ResourceManager => "Resource Manager",
            Self::QualityAssurance => "Quality Assurance",
        }
    }

    pub fn team(&self) -> TeamKind {
        match self {
            Self::ResearchSpecialist | Self::DataAnalyst | Self::ReportWriter => {
                TeamKind::ResearchAnalysis
            }
            Self::CreativeStrategist | Self::ContentCreator | Self::VisualDesigner => {
                TeamKind::CreativeDesign
            }
            Self::SystemArchitect | Self::Developer | Self::QaEngineer => {
                TeamKind::TechnicalImplementation
            }
            Self::TeamCoordinator | Self::ResourceManager | Self::QualityAssurance => {
                TeamKind::Coordination
            }
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::ResearchSpecialist => prompts::RESEARCH_SPECIALIST_PROMPT,
            Self::DataAnalyst => prompts::DATA_ANALYST_PROMPT,
            Self::ReportWriter => prompts::REPORT_WRITER_PROMPT,
            Self::CreativeStrategist => prompts::CREATIVE_STRATEGIST_PROMPT,
            Self::ContentCreator => prompts::CONTENT_CREATOR_PROMPT,
            Self::VisualDesigner => prompts::VISUAL_DESIGNER_PROMPT,
            Self::SystemArchitect => prompts::SYSTEM_ARCHITECT_PROMPT,
            Self::Developer => prompts::DEVELOPER_PROMPT,
            Self::QaEngineer => prompts::QA_ENGINEER_PROMPT,
            Self::TeamCoordinator => prompts::TEAM_COORDINATOR_PROMPT,
            Self::ResourceManager => prompts::RESOURCE_MANAGER_PROMPT,
            Self::QualityAssurance => prompts::QUALITY_ASSURANCE_PROMPT,
        }
    }

    /// Default sampling temperature (0.0 = deterministic, 1.0 = creative)
    pub fn temperature(&self) -> f32 {
        match self {
            Self::DataAnalyst | Self::QaEngineer | Self::QualityAssurance => 0.1,
            Self::ResearchSpecialist | Self::SystemArchitect | Self::Developer => 0.3,
            Self::ReportWriter | Self::TeamCoordinator | Self::ResourceManager => 0.4,
            Self::CreativeStrategist | Self::ContentCreator | Self::VisualDesigner => 0.8,
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Self::ResearchSpecialist | Self::DataAnalyst => &[Capability::Analyse],
            Self::SystemArchitect => &[Capability::Analyse, Capability::Draft],
            Self::CreativeStrategist | Self::ContentCreator | Self::Developer => {
                &[Capability::Draft]
            }
            Self::ReportWriter | Self::VisualDesigner => {
                &[Capability::Draft, Capability::Synthesise]
            }
            Self::QaEngineer => &[Capability::Review, Capability::Synthesise],
            Self::TeamCoordinator => &[Capability::Coordinate, Capability::Synthesise],
            Self::ResourceManager => &[Capability::Allocate],
            Self::QualityAssurance => &[Capability::Review],
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|r| r.id() == normalized)
            .ok_or_else(|| UnknownName::Role(s.to_string()))
    }
}

/// A role or team name that does not exist
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnknownName {
    #[error("unknown role: {0}")]
    Role(String),
    #[error("unknown team: {0}")]
    Team(String),
}

/// Model and sampling configuration for one role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleConfig {
    pub role: AgentRole,

    /// Model override; the backend default is used when absent
    pub model: Option<String>,

    pub temperature: f32,

    pub max_tokens: Option<u32>,
}

impl RoleConfig {
    /// Configuration with the role's own defaults
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            model: None,
            temperature: role.temperature(),
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Build a completion request carrying this role's system prompt
    pub fn request(&self, prompt: impl Into<String>) -> CompletionRequest {
        CompletionRequest::new(vec![
            Message::system(self.role.system_prompt()),
            Message::user(prompt),
        ])
        .with_model(self.model.clone())
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens)
    }
}

/// Registry of role configurations
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: HashMap<AgentRole, RoleConfig>,
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RoleRegistry {
    /// Create a registry with every role at its defaults
    pub fn with_defaults() -> Self {
        Self {
            roles: AgentRole::ALL
                .into_iter()
                .map(|role| (role, RoleConfig::new(role)))
                .collect(),
        }
    }

    /// Replace a role's configuration
    pub fn register(&mut self, config: RoleConfig) {
        self.roles.insert(config.role, config);
    }

    /// Get a role's configuration
    pub fn get(&self, role: AgentRole) -> RoleConfig {
        self.roles
            .get(&role)
            .cloned()
            .unwrap_or_else(|| RoleConfig::new(role))
    }

    /// Configurations for a team's members in speaking order
    pub fn team(&self, team: TeamKind) -> Vec<RoleConfig> {
        team.roles().iter().map(|r| self.get(*r)).collect()
    }

    /// Iterate over all roles in declaration order
    pub fn iter(&self) -> impl Iterator<Item = RoleConfig> + '_ {
        AgentRole::ALL.into_iter().map(|r| self.get(r))
    }

    /// Apply overrides from the configuration file
    pub fn apply_overrides(&mut self, overrides: &[RoleOverride]) -> Result<(), UnknownName> {
        for entry in overrides {
            let role: AgentRole = entry.role.parse()?;
            let mut config = self.get(role);
            if let Some(model) = &entry.model {
                config.model = Some(model.clone());
            }
            if let Some(temperature) = entry.temperature {
                config.temperature = temperature;
            }
            if let Some(max_tokens) = entry.max_tokens {
                config.max_tokens = Some(max_tokens);
            }
            tracing::debug!(role = role.id(), "Applied role override");
            self.register(config);
        }
        Ok(())
    }
}
