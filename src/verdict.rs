use serde::{Deserialize, Serialize};

use crate::classifier::{AiJudgment, AttackType, RiskLevel};
use crate::enrichment::EnrichmentBundle;
use crate::extractor::ExtractedEvidence;
use crate::fusion::{build_provenance, Action, FusionResult, ProvenanceRecord};
use crate::marketing::MarketingAssessment;
use crate::url_resolver::UrlResolution;

const EDUCATION_TIP: &str = "Always verify suspicious requests through official channels. \
     This tool is educational and is not a replacement for official incident response.";

// Consent thresholds for automated remediation
const ADMIN_CONSENT_SCORE: i32 = 85;
const BLOCK_CONFIDENCE_REQUIRED: i32 = 85;
const QUARANTINE_CONFIDENCE_REQUIRED: i32 = 70;

/// One of the up-to-three headline reasons behind a verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopReason {
    pub reason: String,
    pub evidence: String,
    pub source: String,
    pub weight: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationStep {
    pub action: String,
    pub required_consent: String,
    pub confidence_required_pct: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationAdvice {
    pub can_automate: bool,
    pub recommended_actions: Vec<AutomationStep>,
}

/// The complete response for one submission. Every field is always
/// populated; degraded inputs lower quality, never completeness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub final_score: i32,
    pub heuristic_score: i32,
    pub llm_score: i32,
    pub ai_score: i32,
    pub risk_level: RiskLevel,
    pub action: Action,
    pub confidence_pct: i32,
    pub attack_type: AttackType,
    pub extracted_url: Option<String>,
    pub multiple_urls: bool,
    pub top_reasons: Vec<TopReason>,
    pub provenance: Vec<ProvenanceRecord>,
    pub attacker_intent_explanation: String,
    pub ai_reasoning: String,
    pub is_ai_powered: bool,
    pub url_resolution: Option<UrlResolution>,
    pub marketing_analysis: Option<MarketingAssessment>,
    pub suggested_action_text: String,
    pub marketing_notice: Option<String>,
    pub automation_advice: AutomationAdvice,
    pub education_tip: String,
    pub note: String,
}

/// Assemble the boundary response from the pipeline's pieces
pub fn assemble_verdict(
    evidence: &ExtractedEvidence,
    enrichment: &EnrichmentBundle,
    judgment: AiJudgment,
    fusion: FusionResult,
    url_resolution: Option<UrlResolution>,
    marketing_analysis: Option<MarketingAssessment>,
) -> Verdict {
    let top_reasons = top_reasons(&judgment, evidence);

    let mut note = "Analysis includes enrichment data when available".to_string();
    if evidence.multiple_urls {
        note.push_str("; multiple URLs detected");
    }

    Verdict {
        final_score: fusion.final_score,
        heuristic_score: fusion.heuristic_score,
        llm_score: judgment.confidence_score,
        ai_score: judgment.confidence_score,
        risk_level: fusion.risk_level,
        action: fusion.action,
        confidence_pct: judgment.confidence_score,
        attack_type: judgment.attack_type,
        extracted_url: evidence.url.clone(),
        multiple_urls: evidence.multiple_urls,
        top_reasons,
        provenance: build_provenance(enrichment),
        attacker_intent_explanation: judgment.attacker_intent,
        ai_reasoning: judgment.reasoning,
        is_ai_powered: judgment.is_ai_powered,
        url_resolution,
        marketing_analysis,
        suggested_action_text: suggested_action_text(fusion.action).to_string(),
        marketing_notice: if judgment.attack_type == AttackType::MarketingLink {
            Some("This appears to be a legitimate marketing link".to_string())
        } else {
            None
        },
        automation_advice: automation_advice(fusion.action, fusion.final_score),
        education_tip: EDUCATION_TIP.to_string(),
        note,
    }
}

// The first three indicators become the headline reasons
fn top_reasons(judgment: &AiJudgment, evidence: &ExtractedEvidence) -> Vec<TopReason> {
    judgment
        .indicators
        .iter()
        .take(3)
        .map(|indicator| TopReason {
            reason: indicator.description.clone(),
            evidence: evidence_snippet(evidence),
            source: indicator
                .kind
                .clone()
                .unwrap_or_else(|| "ai_analysis".to_string()),
            weight: indicator.confidence / 2,
        })
        .collect()
}

fn evidence_snippet(evidence: &ExtractedEvidence) -> String {
    if !evidence.message_text.is_empty() {
        evidence.message_text.chars().take(100).collect()
    } else if let Some(url) = &evidence.url {
        url.clone()
    } else {
        "No evidence".to_string()
    }
}

fn suggested_action_text(action: Action) -> &'static str {
    match action {
        Action::BlockClick => "Do NOT click this link. Block access immediately.",
        Action::QuarantineEmail => {
            "Move this email to quarantine. Do not interact with any links or attachments."
        }
        Action::VerifyViaKnownChannel => {
            "Verify this request through official channels before taking any action."
        }
        Action::SandboxAnalyze => "Analyze in a secure sandbox environment before accessing.",
        Action::SafeToClickAfterChecks => "Exercise normal caution when accessing this content.",
    }
}

fn automation_advice(action: Action, final_score: i32) -> AutomationAdvice {
    let can_automate = matches!(action, Action::BlockClick | Action::QuarantineEmail);
    let recommended_actions = if can_automate {
        let (step, confidence_required_pct) = match action {
            Action::BlockClick => ("block_url", BLOCK_CONFIDENCE_REQUIRED),
            _ => ("quarantine_email", QUARANTINE_CONFIDENCE_REQUIRED),
        };
        vec![AutomationStep {
            action: step.to_string(),
            required_consent: if final_score >= ADMIN_CONSENT_SCORE {
                "admin".to_string()
            } else {
                "user".to_string()
            },
            confidence_required_pct,
        }]
    } else {
        Vec::new()
    };

    AutomationAdvice {
        can_automate,
        recommended_actions,
    }
}
