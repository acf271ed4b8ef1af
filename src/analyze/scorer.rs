//! Keyword-weighted pattern scan.
//!
//! For each catalog category, the keywords occurring anywhere in the lowercased
//! text (plain substring, each keyword counted once) contribute
//! `count * weight` to the total score. Pure and deterministic.

use std::collections::HashSet;

use super::patterns::{catalog, CategoryDefinition};
use super::report::{PatternMatch, PatternReport};

/// Summary used when there is nothing to scan.
pub const NO_TEXT_ANALYSIS: &str = "분석할 텍스트가 없습니다.";

/// Scan `text` against the built-in catalog.
pub fn score_text(text: &str) -> PatternReport {
    score_with_catalog(text, catalog())
}

/// Scan `text` against an explicit catalog (used by tests and custom catalogs).
pub fn score_with_catalog(text: &str, catalog: &[CategoryDefinition]) -> PatternReport {
    if text.trim().is_empty() {
        return PatternReport {
            total_score: 0.0,
            detected_patterns: Vec::new(),
            analysis: NO_TEXT_ANALYSIS.to_string(),
        };
    }

    let normalized = text.to_lowercase();
    let mut total_score = 0.0;
    let mut detected_patterns = Vec::new();

    for def in catalog {
        let matched = matched_keywords(&normalized, &def.keywords);
        if matched.is_empty() {
            continue;
        }
        let score = matched.len() as f64 * def.weight;
        total_score += score;
        detected_patterns.push(PatternMatch {
            category: def.category,
            description: def.description.clone(),
            matched_keywords: matched,
            score,
        });
    }

    let analysis = format!(
        "{}개의 의심 패턴 발견 (총점: {:.1})",
        detected_patterns.len(),
        total_score
    );

    PatternReport {
        total_score,
        detected_patterns,
        analysis,
    }
}

/// Keywords (original spelling, catalog order) found in already-lowercased text.
fn matched_keywords(normalized: &str, keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .filter(|kw| {
            let needle = kw.to_lowercase();
            !needle.is_empty() && normalized.contains(needle.as_str()) && seen.insert(needle)
        })
        .cloned()
        .collect()
}
