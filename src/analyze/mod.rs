// src/analyze/mod.rs
//! Analysis building blocks: pattern catalog, scorer, risk tiers,
//! recommendations, the collaborator adapter and the pipeline stages.

pub mod ai_adapter;
pub mod patterns;
pub mod recommend;
pub mod report;
pub mod risk;
pub mod scorer;
pub mod stages;

// Re-export convenient types.
pub use crate::analyze::ai_adapter::{build_collaborator, Collaborator, DynCollaborator};
pub use crate::analyze::patterns::{catalog, Category, CategoryDefinition};
pub use crate::analyze::recommend::recommendations;
pub use crate::analyze::report::{
    Confidence, DetailedAnalysis, FinalDiagnosis, LinguisticReport, PatternMatch, PatternReport,
    SecurityReport, ThreatLevel,
};
pub use crate::analyze::risk::{classify, Classification, RiskLevel};
pub use crate::analyze::scorer::{score_text, score_with_catalog};

/// Recommendation returned for blank input.
pub const ENTER_TEXT: &str = "분석할 텍스트를 입력해주세요.";

/// Short, non-reversible id for logging a text without logging the text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher
        .finalize()
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("긴급 송금");
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(a, anon_hash("긴급 송금"));
        assert_ne!(a, anon_hash("긴급 송금!"));
    }
}
