//! Phishing pattern catalog: category -> {keywords, weight, description}.
//!
//! The catalog ships with the binary (`phishing_patterns.json` at the repo root)
//! and is parsed once per process. Catalog order is significant: it fixes the
//! order of detected patterns and matched keywords in every report.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

static CATALOG: Lazy<Vec<CategoryDefinition>> = Lazy::new(|| {
    let raw = include_str!("../../phishing_patterns.json");
    serde_json::from_str::<Vec<CategoryDefinition>>(raw).expect("valid phishing pattern catalog")
});

/// One phishing tactic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Urgency,
    Money,
    PersonalInfo,
    Authority,
    Threat,
    Link,
    Contact,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Urgency => "urgency",
            Category::Money => "money",
            Category::PersonalInfo => "personal_info",
            Category::Authority => "authority",
            Category::Threat => "threat",
            Category::Link => "link",
            Category::Contact => "contact",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub category: Category,
    /// Matched case-insensitively as plain substrings.
    pub keywords: Vec<String>,
    /// Severity multiplier per matched keyword.
    pub weight: f64,
    pub description: String,
}

/// The process-wide catalog, in catalog order.
pub fn catalog() -> &'static [CategoryDefinition] {
    CATALOG.as_slice()
}

/// Lookup by category (None only if the catalog file drops a category).
pub fn definition(category: Category) -> Option<&'static CategoryDefinition> {
    catalog().iter().find(|d| d.category == category)
}
