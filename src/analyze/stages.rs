//! The four pipeline stages.
//!
//! Every stage reads the state produced so far and returns exactly one
//! `StageOutput`. Collaborator failures are absorbed here: the stage logs,
//! counts the failure and writes a low-confidence report instead.

use async_trait::async_trait;
use metrics::counter;
use tracing::warn;

use super::ai_adapter::Collaborator;
use super::patterns::Category;
use super::recommend::recommendations;
use super::report::{
    Confidence, DetailedAnalysis, FinalDiagnosis, LinguisticReport, PatternReport,
    SecurityReport, ThreatLevel,
};
use super::risk::{classify, Classification};
use super::scorer::score_text;
use crate::pipeline::{AnalysisState, StageOutput};

/// Completion budget for the linguistic and security prompts.
pub const STAGE_MAX_TOKENS: u32 = 300;
/// Completion budget for the synthesis prompt.
pub const SYNTHESIS_MAX_TOKENS: u32 = 400;

/// One step of the pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        state: &AnalysisState,
        collaborator: Option<&dyn Collaborator>,
    ) -> StageOutput;
}

/// Keyword scan. Never consults the collaborator.
pub struct PatternStage;

/// Social-engineering tactics (urgency, fear, impersonation).
pub struct LinguisticStage;

/// Technical risk (links, personal data, money transfer).
pub struct SecurityStage;

/// Tier, recommendations and the user-facing summary.
pub struct SynthesisStage;

#[async_trait]
impl Stage for PatternStage {
    fn name(&self) -> &'static str {
        "pattern"
    }

    async fn run(&self, state: &AnalysisState, _: Option<&dyn Collaborator>) -> StageOutput {
        StageOutput::Pattern(score_text(&state.input_text))
    }
}

#[async_trait]
impl Stage for LinguisticStage {
    fn name(&self) -> &'static str {
        "linguistic"
    }

    async fn run(
        &self,
        state: &AnalysisState,
        collaborator: Option<&dyn Collaborator>,
    ) -> StageOutput {
        let Some(c) = collaborator else {
            return StageOutput::Linguistic(linguistic_from_patterns(&state.pattern_or_empty()));
        };

        let report = match c
            .complete_limited(&linguistic_prompt(&state.input_text), STAGE_MAX_TOKENS)
            .await {
            Ok(analysis) => LinguisticReport {
                indicators: Vec::new(),
                analysis,
                confidence: Confidence::High,
                error: None,
            },
            Err(e) => {
                let msg = collaborator_failed(self.name(), c, &e);
                LinguisticReport {
                    indicators: Vec::new(),
                    analysis: format!("분석 중 오류 발생: {msg}"),
                    confidence: Confidence::Low,
                    error: Some(msg),
                }
            }
        };
        StageOutput::Linguistic(report)
    }
}

#[async_trait]
impl Stage for SecurityStage {
    fn name(&self) -> &'static str {
        "security"
    }

    async fn run(
        &self,
        state: &AnalysisState,
        collaborator: Option<&dyn Collaborator>,
    ) -> StageOutput {
        let Some(c) = collaborator else {
            return StageOutput::Security(security_from_patterns(&state.pattern_or_empty()));
        };

        let report = match c
            .complete_limited(&security_prompt(&state.input_text), STAGE_MAX_TOKENS)
            .await {
            Ok(analysis) => SecurityReport {
                risks: Vec::new(),
                analysis,
                threat_level: ThreatLevel::High,
                error: None,
            },
            Err(e) => {
                let msg = collaborator_failed(self.name(), c, &e);
                SecurityReport {
                    risks: Vec::new(),
                    analysis: format!("분석 중 오류 발생: {msg}"),
                    threat_level: ThreatLevel::Unknown,
                    error: Some(msg),
                }
            }
        };
        StageOutput::Security(report)
    }
}

#[async_trait]
impl Stage for SynthesisStage {
    fn name(&self) -> &'static str {
        "synthesis"
    }

    async fn run(
        &self,
        state: &AnalysisState,
        collaborator: Option<&dyn Collaborator>,
    ) -> StageOutput {
        let pattern = state.pattern_or_empty();
        let classification = classify(pattern.total_score);
        let mut diagnosis = template_diagnosis(&pattern, classification);

        let Some(c) = collaborator else {
            return StageOutput::Diagnosis(diagnosis);
        };

        let prompt = synthesis_prompt(state, &pattern, classification);
        match c.complete_limited(&prompt, SYNTHESIS_MAX_TOKENS).await {
            Ok(summary) => {
                diagnosis.summary = summary;
                diagnosis.detailed_analysis = Some(DetailedAnalysis {
                    pattern,
                    linguistic: state.linguistic_report.clone(),
                    security: state.security_report.clone(),
                });
            }
            Err(e) => {
                let msg = collaborator_failed(self.name(), c, &e);
                diagnosis.summary = format!(
                    "{} 위험도 - 종합 분석 완료",
                    classification.level.as_str().to_uppercase()
                );
                diagnosis.error = Some(msg);
            }
        }
        StageOutput::Diagnosis(diagnosis)
    }
}

/// Linguistic report derived from detected categories alone.
pub fn linguistic_from_patterns(pattern: &PatternReport) -> LinguisticReport {
    const RULES: [(Category, &str); 3] = [
        (Category::Urgency, "긴박감 조성"),
        (Category::Threat, "공포 유도"),
        (Category::Authority, "권위 사칭"),
    ];
    let indicators = indicators_for(pattern, &RULES);
    LinguisticReport {
        analysis: format!("사회공학 기법 {}개 감지", indicators.len()),
        indicators,
        confidence: Confidence::Medium,
        error: None,
    }
}

/// Security report derived from detected categories alone.
pub fn security_from_patterns(pattern: &PatternReport) -> SecurityReport {
    const RULES: [(Category, &str); 3] = [
        (Category::Link, "의심스러운 링크 포함"),
        (Category::PersonalInfo, "개인정보 요청"),
        (Category::Money, "금전 거래 유도"),
    ];
    let risks = indicators_for(pattern, &RULES);
    SecurityReport {
        analysis: format!("보안 위험 {}개 발견", risks.len()),
        threat_level: ThreatLevel::from_risk_count(risks.len()),
        risks,
        error: None,
    }
}

/// Diagnosis with the templated summary; synthesis starts from this.
pub fn template_diagnosis(pattern: &PatternReport, classification: Classification) -> FinalDiagnosis {
    let level = classification.level;
    FinalDiagnosis {
        risk_level: level,
        risk_score: classification.risk_score(),
        detected_patterns: pattern.detected_patterns.clone(),
        recommendations: recommendations(level, &pattern.categories()),
        summary: format!(
            "{} 위험도 - {}개 패턴 감지",
            level.as_str().to_uppercase(),
            pattern.detected_patterns.len()
        ),
        error: None,
        detailed_analysis: None,
        analyzed_text: String::new(),
    }
}

fn indicators_for(pattern: &PatternReport, rules: &[(Category, &str)]) -> Vec<String> {
    rules
        .iter()
        .filter(|(cat, _)| pattern.has(*cat))
        .map(|(_, label)| label.to_string())
        .collect()
}

fn collaborator_failed(stage: &'static str, c: &dyn Collaborator, e: &anyhow::Error) -> String {
    warn!(stage, provider = c.provider_name(), error = ?e, "collaborator call failed; stage degraded");
    counter!("scam_collaborator_failures_total", "stage" => stage).increment(1);
    format!("{e:#}")
}

fn linguistic_prompt(text: &str) -> String {
    format!(
        "다음 문구의 사회공학적 기만 수법을 분석해주세요:\n\n\
         텍스트: {text}\n\n\
         다음 관점에서 분석하세요:\n\
         1. 긴박함/시간 압박 사용 여부\n\
         2. 공포/불안 유도 여부\n\
         3. 권위/신뢰 사칭 여부\n\
         4. 보상/이득 제시 여부\n\n\
         간결하게 한국어로 답변하세요."
    )
}

fn security_prompt(text: &str) -> String {
    format!(
        "다음 메시지에 포함된 링크나 발신 형식의 기술적 위험성을 분석해주세요:\n\n\
         텍스트: {text}\n\n\
         다음 관점에서 분석하세요:\n\
         1. URL/링크의 의심스러운 패턴\n\
         2. 개인정보 요청 여부\n\
         3. 금전 거래 유도 여부\n\
         4. 악성 행위 가능성\n\n\
         위험도(낮음/보통/높음/매우높음)와 함께 간결하게 한국어로 답변하세요."
    )
}

fn synthesis_prompt(
    state: &AnalysisState,
    pattern: &PatternReport,
    classification: Classification,
) -> String {
    let linguistic = state
        .linguistic_report
        .as_ref()
        .map_or("N/A", |r| r.analysis.as_str());
    let security = state
        .security_report
        .as_ref()
        .map_or("N/A", |r| r.analysis.as_str());
    format!(
        "아래 세 가지 분석 결과를 종합하여 최종 판별 리포트를 작성하세요.\n\n\
         패턴 분석: {}\n\
         언어 분석: {linguistic}\n\
         보안 분석: {security}\n\n\
         판정 등급: {} (위험도: {}%)\n\
         사용자가 취해야 할 행동 요령을 포함하여 간결하게 한국어로 작성하세요.",
        pattern.analysis,
        classification.level,
        classification.risk_score()
    )
}
