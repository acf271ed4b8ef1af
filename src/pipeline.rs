//! # Pipeline orchestrator
//! Fixed, strictly sequential state machine:
//! `PatternAnalysis -> LinguisticAnalysis -> SecurityAnalysis -> Synthesis -> Done`.
//!
//! Each run owns a fresh `AnalysisState`. A stage sees the state by reference
//! and returns a `StageOutput`; the orchestrator merges it by value. Report
//! fields are write-once.

use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::analyze::ai_adapter::DynCollaborator;
use crate::analyze::report::{FinalDiagnosis, LinguisticReport, PatternReport, SecurityReport};
use crate::analyze::risk::{classify, RiskLevel};
use crate::analyze::scorer::NO_TEXT_ANALYSIS;
use crate::analyze::stages::{
    template_diagnosis, LinguisticStage, PatternStage, SecurityStage, Stage, SynthesisStage,
};
use crate::analyze::{anon_hash, ENTER_TEXT};
use crate::metrics::ensure_metrics_described;

/// Per-run record threaded through the stages.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisState {
    pub input_text: String,
    pub pattern_report: Option<PatternReport>,
    pub linguistic_report: Option<LinguisticReport>,
    pub security_report: Option<SecurityReport>,
    pub final_diagnosis: Option<FinalDiagnosis>,
}

/// What a stage hands back: exactly one report field.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Pattern(PatternReport),
    Linguistic(LinguisticReport),
    Security(SecurityReport),
    Diagnosis(FinalDiagnosis),
}

impl AnalysisState {
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            pattern_report: None,
            linguistic_report: None,
            security_report: None,
            final_diagnosis: None,
        }
    }

    /// Merge one stage output. A field that is already set keeps its first value.
    pub fn merge(mut self, output: StageOutput) -> Self {
        match output {
            StageOutput::Pattern(r) => write_once(&mut self.pattern_report, r, "pattern_report"),
            StageOutput::Linguistic(r) => {
                write_once(&mut self.linguistic_report, r, "linguistic_report")
            }
            StageOutput::Security(r) => write_once(&mut self.security_report, r, "security_report"),
            StageOutput::Diagnosis(d) => write_once(&mut self.final_diagnosis, d, "final_diagnosis"),
        }
        self
    }

    /// The pattern report, or an empty one if the pattern stage has not run.
    pub fn pattern_or_empty(&self) -> PatternReport {
        self.pattern_report.clone().unwrap_or_default()
    }
}

fn write_once<T>(slot: &mut Option<T>, value: T, field: &'static str) {
    if slot.is_some() {
        warn!(field, "report already written; keeping first value");
        return;
    }
    *slot = Some(value);
}

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    PatternAnalysis,
    LinguisticAnalysis,
    SecurityAnalysis,
    Synthesis,
    Done,
}

impl PipelineStep {
    pub const START: PipelineStep = PipelineStep::PatternAnalysis;

    /// Unconditional successor.
    pub fn next(self) -> Self {
        match self {
            PipelineStep::PatternAnalysis => PipelineStep::LinguisticAnalysis,
            PipelineStep::LinguisticAnalysis => PipelineStep::SecurityAnalysis,
            PipelineStep::SecurityAnalysis => PipelineStep::Synthesis,
            PipelineStep::Synthesis | PipelineStep::Done => PipelineStep::Done,
        }
    }

    /// Stage executed in this state (`None` for `Done`).
    pub fn stage(self) -> Option<&'static dyn Stage> {
        match self {
            PipelineStep::PatternAnalysis => Some(&PatternStage),
            PipelineStep::LinguisticAnalysis => Some(&LinguisticStage),
            PipelineStep::SecurityAnalysis => Some(&SecurityStage),
            PipelineStep::Synthesis => Some(&SynthesisStage),
            PipelineStep::Done => None,
        }
    }
}

/// Orchestrator. Cheap to clone; the collaborator (if any) is shared.
#[derive(Clone, Default)]
pub struct Pipeline {
    collaborator: Option<DynCollaborator>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("provider", &self.provider_name())
            .finish()
    }
}

impl Pipeline {
    pub fn new(collaborator: Option<DynCollaborator>) -> Self {
        Self { collaborator }
    }

    /// Degraded mode: every report comes from the keyword scan.
    pub fn pattern_only() -> Self {
        Self::default()
    }

    pub fn is_enhanced(&self) -> bool {
        self.collaborator.is_some()
    }

    pub fn provider_name(&self) -> &'static str {
        self.collaborator
            .as_ref()
            .map_or("none", |c| c.provider_name())
    }

    /// Run all stages over `text` and return the final state.
    /// Blank text is not special-cased here; see [`Pipeline::analyze`].
    pub async fn run(&self, text: &str) -> AnalysisState {
        let collaborator = self.collaborator.as_deref();
        let mut state = AnalysisState::new(text);
        let mut step = PipelineStep::START;

        while let Some(stage) = step.stage() {
            debug!(stage = stage.name(), "stage start");
            let output = stage.run(&state, collaborator).await;
            state = state.merge(output);
            step = step.next();
        }
        state
    }

    /// Entry point: blank input short-circuits, otherwise run the pipeline.
    /// Never fails.
    pub async fn analyze(&self, text: &str) -> FinalDiagnosis {
        ensure_metrics_described();
        counter!("scam_analyze_requests_total").increment(1);

        if text.trim().is_empty() {
            return blank_input_diagnosis(text);
        }

        let t0 = Instant::now();
        let state = self.run(text).await;
        let mut diagnosis = match state.final_diagnosis {
            Some(d) => d,
            None => {
                // unreachable with the fixed step table; keep the contract anyway
                let pattern = state.pattern_report.unwrap_or_default();
                template_diagnosis(&pattern, classify(pattern.total_score))
            }
        };
        diagnosis.analyzed_text = text.to_string();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("scam_analyze_duration_ms").record(ms);
        counter!("scam_analyze_risk_level_total", "level" => diagnosis.risk_level.as_str())
            .increment(1);
        info!(
            id = %anon_hash(text),
            level = %diagnosis.risk_level,
            score = diagnosis.risk_score,
            patterns = diagnosis.detected_patterns.len(),
            provider = self.provider_name(),
            degraded = diagnosis.error.is_some(),
            "analysis complete"
        );
        diagnosis
    }
}

/// Canned result for empty or whitespace-only text.
fn blank_input_diagnosis(text: &str) -> FinalDiagnosis {
    FinalDiagnosis {
        risk_level: RiskLevel::Safe,
        risk_score: 0,
        detected_patterns: Vec::new(),
        recommendations: vec![ENTER_TEXT.to_string()],
        summary: NO_TEXT_ANALYSIS.to_string(),
        error: None,
        detailed_analysis: None,
        analyzed_text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::report::{Confidence, ThreatLevel};

    #[test]
    fn steps_run_in_fixed_order() {
        let mut seen = Vec::new();
        let mut step = PipelineStep::START;
        while let Some(stage) = step.stage() {
            seen.push(stage.name());
            step = step.next();
        }
        assert_eq!(seen, vec!["pattern", "linguistic", "security", "synthesis"]);
        assert_eq!(PipelineStep::Done.next(), PipelineStep::Done);
    }

    #[test]
    fn merge_is_write_once() {
        let first = PatternReport {
            total_score: 1.0,
            ..Default::default()
        };
        let second = PatternReport {
            total_score: 9.0,
            ..Default::default()
        };
        let state = AnalysisState::new("x")
            .merge(StageOutput::Pattern(first.clone()))
            .merge(StageOutput::Pattern(second));
        assert_eq!(state.pattern_report, Some(first));
        assert!(state.linguistic_report.is_none());
    }

    #[tokio::test]
    async fn run_populates_every_field_in_pattern_only_mode() {
        let state = Pipeline::pattern_only()
            .run("긴급! 국세청입니다. 세금 환급을 위해 계좌번호를 회신해주세요.")
            .await;
        let pattern = state.pattern_report.as_ref().unwrap();
        assert!(pattern.total_score > 0.0);

        let ling = state.linguistic_report.as_ref().unwrap();
        assert_eq!(ling.confidence, Confidence::Medium);
        assert_eq!(ling.indicators, vec!["긴박감 조성", "권위 사칭"]);

        let sec = state.security_report.as_ref().unwrap();
        assert_eq!(sec.threat_level, ThreatLevel::High);

        let d = state.final_diagnosis.as_ref().unwrap();
        assert_eq!(d.risk_level, RiskLevel::Critical);
        assert!(d.error.is_none());
        assert!(d.detailed_analysis.is_none());
    }

    #[tokio::test]
    async fn blank_text_short_circuits() {
        let d = Pipeline::pattern_only().analyze("  \n ").await;
        assert_eq!(d.risk_level, RiskLevel::Safe);
        assert_eq!(d.risk_score, 0);
        assert_eq!(d.recommendations, vec![ENTER_TEXT]);
        assert!(d.detected_patterns.is_empty());
    }
}
