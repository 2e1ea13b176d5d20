use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::classifier::{AiJudgment, RecommendedAction, RiskLevel};
use crate::enrichment::EnrichmentBundle;
use crate::marketing::MarketingAssessment;
use crate::submission::Platform;

/// Heuristic cap applied when the link looks like legitimate marketing
pub const MARKETING_SCORE_CAP: i32 = 30;

// Blend weights: trust the model more when it actually answered
const AI_BLEND: (f64, f64) = (0.3, 0.7);
const FALLBACK_BLEND: (f64, f64) = (0.55, 0.45);

// Final-score action ladder
const BLOCK_THRESHOLD: i32 = 85;
const QUARANTINE_THRESHOLD: i32 = 70;
const VERIFY_THRESHOLD: i32 = 50;
const SANDBOX_THRESHOLD: i32 = 30;

// Non-AI risk tiers
const HIGH_TIER: i32 = 70;
const MEDIUM_TIER: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    SafeToClickAfterChecks,
    SandboxAnalyze,
    VerifyViaKnownChannel,
    QuarantineEmail,
    BlockClick,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::BlockClick => "BLOCK_CLICK",
            Action::QuarantineEmail => "QUARANTINE_EMAIL",
            Action::VerifyViaKnownChannel => "VERIFY_VIA_KNOWN_CHANNEL",
            Action::SandboxAnalyze => "SANDBOX_ANALYZE",
            Action::SafeToClickAfterChecks => "SAFE_TO_CLICK_AFTER_CHECKS",
        }
    }
}

/// One audit record per enrichment signal that carried a value, whether or
/// not it moved the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub signal: String,
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FusionResult {
    pub final_score: i32,
    pub heuristic_score: i32,
    pub risk_level: RiskLevel,
    pub action: Action,
}

/// Combine the heuristic score and the judgment into one final score,
/// risk tier and action. Pure function; re-running it on the same inputs
/// always yields the same verdict.
pub fn fuse_scores(
    heuristic_score: i32,
    judgment: &AiJudgment,
    marketing: Option<&MarketingAssessment>,
    enrichment: &EnrichmentBundle,
    platform: Platform,
) -> FusionResult {
    let heuristic_score = if marketing.map_or(false, |m| m.is_likely_marketing) {
        log::debug!("marketing override: capping heuristic score at {MARKETING_SCORE_CAP}");
        heuristic_score.min(MARKETING_SCORE_CAP)
    } else {
        heuristic_score
    };

    let ai_score = judgment.confidence_score;
    let (final_score, risk_level) = if judgment.is_ai_powered {
        let blended = blend(heuristic_score, ai_score, AI_BLEND);
        (blended, judgment.risk_level)
    } else {
        let blended = blend(heuristic_score, ai_score, FALLBACK_BLEND);
        let tier = if blended >= HIGH_TIER {
            RiskLevel::High
        } else if blended >= MEDIUM_TIER {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        (blended, tier)
    };

    let action = select_action(final_score, judgment, enrichment, platform);

    FusionResult {
        final_score,
        heuristic_score,
        risk_level,
        action,
    }
}

// Round-half-up so the result is identical on every platform
fn blend(heuristic: i32, ai: i32, (hw, aw): (f64, f64)) -> i32 {
    let blended = hw * heuristic as f64 + aw * ai as f64;
    (blended.clamp(0.0, 100.0) + 0.5).floor() as i32
}

fn select_action(
    final_score: i32,
    judgment: &AiJudgment,
    enrichment: &EnrichmentBundle,
    platform: Platform,
) -> Action {
    // A trusted-feed hit is definitive no matter what the model thinks
    let high_confidence_malicious = enrichment.safe_browsing_verdict() == Some("MALICIOUS")
        || enrichment.trusted_blacklist_match();
    if high_confidence_malicious {
        return Action::BlockClick;
    }

    if judgment.is_ai_powered {
        if let Some(recommendation) = judgment.recommended_action {
            return map_recommendation(recommendation);
        }
    }

    let threshold_action = threshold_action(final_score, platform);

    // The fallback's own recommendation can only tighten the result
    if !judgment.is_ai_powered {
        if let Some(recommendation) = judgment.recommended_action {
            if matches!(
                recommendation,
                RecommendedAction::Block | RecommendedAction::Quarantine
            ) {
                return threshold_action.max(map_recommendation(recommendation));
            }
        }
    }

    threshold_action
}

fn map_recommendation(recommendation: RecommendedAction) -> Action {
    match recommendation {
        RecommendedAction::Block => Action::BlockClick,
        RecommendedAction::Quarantine => Action::QuarantineEmail,
        RecommendedAction::Verify => Action::VerifyViaKnownChannel,
        RecommendedAction::Caution => Action::SandboxAnalyze,
        RecommendedAction::Allow => Action::SafeToClickAfterChecks,
    }
}

fn threshold_action(final_score: i32, platform: Platform) -> Action {
    if final_score >= BLOCK_THRESHOLD {
        Action::BlockClick
    } else if final_score >= QUARANTINE_THRESHOLD {
        if platform == Platform::Email {
            Action::QuarantineEmail
        } else {
            Action::BlockClick
        }
    } else if final_score >= VERIFY_THRESHOLD {
        Action::VerifyViaKnownChannel
    } else if final_score >= SANDBOX_THRESHOLD {
        Action::SandboxAnalyze
    } else {
        Action::SafeToClickAfterChecks
    }
}

/// Audit trail: every enrichment signal that carried a value gets a
/// record, including the ones that did not change the score.
pub fn build_provenance(enrichment: &EnrichmentBundle) -> Vec<ProvenanceRecord> {
    let mut provenance = Vec::new();

    let mut push = |signal: &str,
                    value: serde_json::Value,
                    detail_url: Option<String>,
                    screenshot_url: Option<String>| {
        provenance.push(ProvenanceRecord {
            signal: signal.to_string(),
            value,
            detail_url,
            screenshot_url,
        });
    };

    if let Some(sb) = &enrichment.safe_browsing {
        if let Some(verdict) = &sb.verdict {
            push("safe_browsing", json!(verdict), sb.detail_url.clone(), None);
        }
    }
    if let Some(vt) = &enrichment.virustotal {
        if let Some(count) = vt.malicious_count {
            push("virustotal", json!(count), vt.detail_url.clone(), None);
        }
    }
    if let Some(us) = &enrichment.urlscan {
        if let Some(verdict) = &us.verdict {
            push(
                "urlscan",
                json!(verdict),
                us.detail_url.clone(),
                us.screenshot_url.clone(),
            );
        }
    }
    if let Some(whois) = &enrichment.whois {
        if let Some(age_days) = whois.age_days {
            push("whois", json!({ "age_days": age_days }), None, None);
        }
    }
    if let Some(tls) = &enrichment.tls {
        if let Some(valid) = tls.valid {
            push("tls", json!({ "valid": valid }), None, None);
        }
    }
    if let Some(ct) = &enrichment.ct_logs {
        if let Some(entries) = ct.matching_entries {
            push("ct_logs", json!({ "matching_entries": entries }), None, None);
        }
    }
    if let Some(reputation) = enrichment.domain_reputation_score {
        push("domain_reputation_score", json!(reputation), None, None);
    }
    if !enrichment.blacklist_matches.is_empty() {
        let sources: Vec<&str> = enrichment
            .blacklist_matches
            .iter()
            .map(|m| m.source.as_str())
            .collect();
        let detail_url = enrichment
            .blacklist_matches
            .iter()
            .find_map(|m| m.url.clone());
        push("blacklist_matches", json!(sources), detail_url, None);
    }
    if let Some(ip) = &enrichment.ip_reputation {
        if let Some(is_malicious) = ip.is_malicious {
            push("ip_reputation", json!({ "is_malicious": is_malicious }), None, None);
        }
    }
    if let Some(sandbox) = &enrichment.sandbox {
        if sandbox.performed {
            push(
                "sandbox",
                json!({ "behavior_summary": sandbox.behavior_summary }),
                None,
                None,
            );
        }
    }
    if let Some(prior) = enrichment.prior_scans_for_domain {
        push("prior_scans_for_domain", json!(prior), None, None);
    }

    provenance
}
