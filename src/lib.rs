// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod simulation;

// Pattern scan, risk tiers, recommendations, stages, collaborator adapter
pub mod analyze;

pub mod ai_bootstrap;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use analyze::report::FinalDiagnosis;
pub use analyze::risk::{color_for, emoji_for, label_for, RiskLevel};
pub use api::router;
pub use pipeline::Pipeline;

use analyze::ai_adapter::DynCollaborator;

/// Analyze `text` in pattern-only mode (no language model).
pub async fn analyze(text: &str) -> FinalDiagnosis {
    Pipeline::pattern_only().analyze(text).await
}

/// Analyze `text`, consulting `collaborator` when present.
pub async fn analyze_with(text: &str, collaborator: Option<DynCollaborator>) -> FinalDiagnosis {
    Pipeline::new(collaborator).analyze(text).await
}

/// One-off smoke test of the configured collaborator. Logs the result; only
/// errors if an explicit config file cannot be read.
///
/// ```ignore
/// if let Err(e) = scam_risk_analyzer::run_ai_quick_probe(Some("config/ai.json")).await {
///     tracing::warn!(error=?e, "AI quick probe didn't run");
/// }
/// ```
pub async fn run_ai_quick_probe(path: Option<&str>) -> anyhow::Result<bool> {
    let ai = match path {
        Some(p) => ai_bootstrap::AiRuntime::from_path(p)?,
        None => ai_bootstrap::AiRuntime::discover(),
    };
    let ok = ai.quick_probe().await;
    tracing::info!(ok, "AI quick probe finished");
    Ok(ok)
}
