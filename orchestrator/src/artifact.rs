//! Work products passed between teams and to the human

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quality::QualityAssessment;
use crate::roles::{AgentRole, TeamKind};

/// Who produced an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "team")]
pub enum Owner {
    Inner(TeamKind),
    Outer,
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inner(team) => write!(f, "{} team", team),
            Self::Outer => f.write_str("Outer coordinator"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    #[default]
    Draft,
    Final,
    Rejected,
}

/// One titled piece of an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,

    /// Team that wrote the section; `None` for the integration summary
    #[serde(default)]
    pub team: Option<TeamKind>,

    /// Role whose output became the section body
    #[serde(default)]
    pub author: Option<AgentRole>,

    pub content: String,
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            team: None,
            author: None,
            content: content.into(),
        }
    }

    pub fn with_team(mut self, team: TeamKind) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_author(mut self, author: AgentRole) -> Self {
        self.author = Some(author);
        self
    }
}

/// A versioned work product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,

    pub scenario_id: String,

    /// Starts at 1, one per drafting round
    pub version: u32,

    pub owner: Owner,

    #[serde(default)]
    pub state: ArtifactState,

    pub sections: Vec<Section>,

    #[serde(default)]
    pub quality: Option<QualityAssessment>,

    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Create an empty version-1 draft
    pub fn new(scenario_id: impl Into<String>, owner: Owner) -> Self {
        Self {
            id: Uuid::new_v4(),
            scenario_id: scenario_id.into(),
            version: 1,
            owner,
            state: ArtifactState::Draft,
            sections: Vec::new(),
            quality: None,
            created_at: Utc::now(),
        }
    }

    /// Keep the id of an earlier version
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Sections written by inner teams
    pub fn team_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.team.is_some())
    }

    /// Section for a team, if present
    pub fn section_for(&self, team: TeamKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.team == Some(team))
    }

    pub fn quality_score(&self) -> Option<f64> {
        self.quality.as_ref().map(|q| q.overall)
    }

    pub fn is_final(&self) -> bool {
        self.state == ArtifactState::Final
    }

    /// Render as Markdown-style text, one heading per section
    pub fn render(&self) -> String {
        let mut out = format!(
            "# {} (version {}, {})\n",
            self.scenario_id, self.version, self.owner
        );
        for section in &self.sections {
            out.push_str(&format!("\n## {}\n\n{}\n", section.title, section.content.trim()));
        }
        if let Some(quality) = &self.quality {
            out.push_str(&format!("\nQuality score: {:.1}/100\n", quality.overall));
        }
        out
    }
}
