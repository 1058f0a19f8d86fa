//! Quality rubric for assembled artifacts
//!
//! Scores on a 0-100 scale from five weighted criteria. The scoring is
//! text-only so every run is scored the same way regardless of backend.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;

/// Minimum overall score for an artifact to pass
pub const PASS_THRESHOLD: f64 = 80.0;

const PLACEHOLDER_MARKERS: &[&str] = &[
    "lorem ipsum",
    "[insert",
    "tbd",
    "as an ai language model",
    "i cannot",
];

const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "both", "each", "from", "have", "here",
    "into", "more", "most", "much", "must", "only", "other", "over", "some", "such", "than",
    "that", "their", "them", "then", "there", "these", "they", "this", "those", "through",
    "under", "very", "were", "what", "when", "where", "which", "while", "will", "with", "within",
    "would", "your",
];

/// Criterion weights; they sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RubricWeights {
    pub completeness: f64,
    pub accuracy: f64,
    pub consistency: f64,
    pub clarity: f64,
    pub alignment: f64,
}

impl Default for RubricWeights {
    fn default() -> Self {
        Self {
            completeness: 0.25,
            accuracy: 0.25,
            consistency: 0.20,
            clarity: 0.15,
            alignment: 0.15,
        }
    }
}

impl RubricWeights {
    pub fn total(&self) -> f64 {
        self.completeness + self.accuracy + self.consistency + self.clarity + self.alignment
    }
}

/// Scores of one artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub overall: f64,
    pub completeness: f64,
    pub accuracy: f64,
    pub consistency: f64,
    pub clarity: f64,
    pub alignment: f64,
    /// One entry per criterion below the pass threshold
    #[serde(default)]
    pub issues: Vec<String>,
}

impl QualityAssessment {
    pub fn passed(&self) -> bool {
        self.overall >= PASS_THRESHOLD
    }
}

/// Text rubric over artifact sections and the scenario brief
#[derive(Debug, Clone)]
pub struct QualityRubric {
    pub weights: RubricWeights,
    /// Sections shorter than this count as incomplete
    pub min_section_chars: usize,
}

impl Default for QualityRubric {
    fn default() -> Self {
        Self {
            weights: RubricWeights::default(),
            min_section_chars: 200,
        }
    }
}

impl QualityRubric {
    pub fn with_min_section_chars(mut self, chars: usize) -> Self {
        self.min_section_chars = chars;
        self
    }

    /// Score an artifact against the brief it answers
    pub fn assess(&self, artifact: &Artifact, brief: &str) -> QualityAssessment {
        let text = artifact
            .sections
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let lowered = text.to_lowercase();
        let keywords = brief_keywords(brief);

        let completeness = self.completeness(artifact);
        let accuracy = accuracy(&lowered);
        let consistency = consistency(artifact, &keywords);
        let clarity = clarity(&text);
        let alignment = alignment(&lowered, &keywords);

        let w = &self.weights;
        let overall = (completeness * w.completeness
            + accuracy * w.accuracy
            + consistency * w.consistency
            + clarity * w.clarity
            + alignment * w.alignment)
            .clamp(0.0, 100.0);

        let mut issues = Vec::new();
        for (name, score) in [
            ("completeness", completeness),
            ("accuracy", accuracy),
            ("consistency", consistency),
            ("clarity", clarity),
            ("alignment", alignment),
        ] {
            if score < PASS_THRESHOLD {
                issues.push(format!("{} scored {:.0}/100", name, score));
            }
        }

        QualityAssessment {
            overall,
            completeness,
            accuracy,
            consistency,
            clarity,
            alignment,
            issues,
        }
    }

    fn completeness(&self, artifact: &Artifact) -> f64 {
        if artifact.sections.is_empty() {
            return 0.0;
        }
        let complete = artifact
            .sections
            .iter()
            .filter(|s| s.content.trim().chars().count() >= self.min_section_chars)
            .count();
        percent(complete, artifact.sections.len())
    }
}

/// Distinct brief words of four or more letters, minus stop words
pub fn brief_keywords(brief: &str) -> BTreeSet<String> {
    brief
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() >= 4)
        .map(|w| w.to_lowercase())
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

fn accuracy(lowered: &str) -> f64 {
    let found: usize = PLACEHOLDER_MARKERS
        .iter()
        .map(|m| lowered.matches(m).count())
        .sum();
    (100.0 - 20.0 * found as f64).max(0.0)
}

fn consistency(artifact: &Artifact, keywords: &BTreeSet<String>) -> f64 {
    let sections: Vec<_> = artifact.team_sections().collect();
    if sections.is_empty() {
        return 0.0;
    }
    if keywords.is_empty() {
        return 100.0;
    }
    let consistent = sections
        .iter()
        .filter(|s| {
            let lowered = s.content.to_lowercase();
            keywords.iter().any(|k| lowered.contains(k.as_str()))
        })
        .count();
    percent(consistent, sections.len())
}

fn clarity(text: &str) -> f64 {
    let lengths: Vec<usize> = text
        .split(['.', '!', '?', '\n'])
        .map(|s| s.split_whitespace().count())
        .filter(|n| *n > 0)
        .collect();
    if lengths.is_empty() {
        return 0.0;
    }
    let average = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    if average <= 25.0 {
        100.0
    } else if average >= 60.0 {
        0.0
    } else {
        100.0 * (60.0 - average) / 35.0
    }
}

fn alignment(lowered: &str, keywords: &BTreeSet<String>) -> f64 {
    if keywords.is_empty() {
        return 100.0;
    }
    let present = keywords.iter().filter(|k| lowered.contains(k.as_str())).count();
    percent(present, keywords.len())
}

fn percent(part: usize, whole: usize) -> f64 {
    100.0 * part as f64 / whole as f64
}
