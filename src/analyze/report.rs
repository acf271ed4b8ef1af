//! Report shapes written by the pipeline stages and returned to callers.
//! JSON keys are camelCase to match the browser UI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::patterns::Category;
use super::risk::RiskLevel;

/// Keywords of one category found in the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    pub category: Category,
    pub description: String,
    /// Catalog order, deduplicated.
    pub matched_keywords: Vec<String>,
    /// `matched_keywords.len() * weight`
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    pub total_score: f64,
    pub detected_patterns: Vec<PatternMatch>,
    pub analysis: String,
}

impl PatternReport {
    /// Set of detected categories.
    pub fn categories(&self) -> BTreeSet<Category> {
        self.detected_patterns.iter().map(|p| p.category).collect()
    }

    pub fn has(&self, category: Category) -> bool {
        self.detected_patterns.iter().any(|p| p.category == category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Unknown,
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    /// 0 risks -> low, 1 -> medium, 2+ -> high.
    pub fn from_risk_count(n: usize) -> Self {
        match n {
            0 => ThreatLevel::Low,
            1 => ThreatLevel::Medium,
            _ => ThreatLevel::High,
        }
    }
}

/// Social-engineering view of the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinguisticReport {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indicators: Vec<String>,
    pub analysis: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Technical-risk view of the message (links, data and money requests).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<String>,
    pub analysis: String,
    pub threat_level: ThreatLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The three stage reports the collaborator summarized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedAnalysis {
    pub pattern: PatternReport,
    pub linguistic: Option<LinguisticReport>,
    pub security: Option<SecurityReport>,
}

/// Final verdict handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalDiagnosis {
    pub risk_level: RiskLevel,
    /// Integer percentage in [0, 100].
    pub risk_score: u8,
    pub detected_patterns: Vec<PatternMatch>,
    pub recommendations: Vec<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<DetailedAnalysis>,
    #[serde(default)]
    pub analyzed_text: String,
}

impl FinalDiagnosis {
    pub fn detected_categories(&self) -> Vec<Category> {
        self.detected_patterns.iter().map(|p| p.category).collect()
    }
}
