use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::enrichment::EnrichmentBundle;
use crate::url_resolver::UrlResolution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackType {
    PhishingLink,
    OtpScam,
    LotteryScam,
    JobScam,
    InvestmentScam,
    RomanceScam,
    TechSupportScam,
    MarketingLink,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendedAction {
    Block,
    Quarantine,
    Verify,
    Caution,
    Allow,
}

impl RecommendedAction {
    /// Lenient label mapping; anything unrecognized defers to the
    /// threshold-based action rule downstream
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "BLOCK" => Some(RecommendedAction::Block),
            "QUARANTINE" => Some(RecommendedAction::Quarantine),
            "VERIFY" => Some(RecommendedAction::Verify),
            "CAUTION" => Some(RecommendedAction::Caution),
            "ALLOW" => Some(RecommendedAction::Allow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: String,
    pub severity: Option<String>,
    #[serde(default)]
    pub confidence: i64,
}

impl Indicator {
    pub fn new(kind: &str, description: String, severity: &str, confidence: i64) -> Self {
        Indicator {
            kind: Some(kind.to_string()),
            description,
            severity: Some(severity.to_string()),
            confidence,
        }
    }
}

/// A validated judgment the fusion engine can rely on.
///
/// `is_ai_powered` is true only when the remote classifier produced a
/// response that passed validation; every fallback reports false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiJudgment {
    pub attack_type: AttackType,
    pub confidence_score: i32,
    pub risk_level: RiskLevel,
    pub indicators: Vec<Indicator>,
    pub reasoning: String,
    pub attacker_intent: String,
    pub recommended_action: Option<RecommendedAction>,
    pub is_ai_powered: bool,
}

/// Untrusted wire shape; field presence is checked before anything is used
#[derive(Debug, Clone, Deserialize)]
pub struct RawJudgment {
    is_phishing: Option<bool>,
    confidence_score: Option<i64>,
    attack_type: Option<AttackType>,
    risk_level: Option<RiskLevel>,
    #[serde(default)]
    indicators: Vec<Indicator>,
    reasoning: Option<String>,
    attacker_intent: Option<String>,
    recommended_action: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest<'a> {
    pub message_content: &'a str,
    pub extracted_url: Option<&'a str>,
    pub enrichment: &'a EnrichmentBundle,
    pub url_resolution: Option<&'a UrlResolution>,
}

/// External judgment capability; the concrete model behind it is opaque
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest<'_>) -> Result<RawJudgment>;
}

/// Remote classifier speaking JSON over HTTP
pub struct RemoteClassifier {
    client: Client,
    endpoint: String,
}

impl RemoteClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow!("classifier enabled but no endpoint configured"))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(&self, request: &ClassifyRequest<'_>) -> Result<RawJudgment> {
        let body = serde_json::to_string(request)?;
        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        parse_judgment(&text)
    }
}

/// Parse a classifier response, tolerating markdown code fences, and
/// reject it unless all required fields are present.
pub fn parse_judgment(response_text: &str) -> Result<RawJudgment> {
    let mut text = response_text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        text = stripped;
    }
    if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped;
    }

    let judgment: RawJudgment = serde_json::from_str(text.trim())?;

    if judgment.is_phishing.is_none()
        || judgment.confidence_score.is_none()
        || judgment.attack_type.is_none()
        || judgment.risk_level.is_none()
    {
        return Err(anyhow!("classifier response missing required fields"));
    }

    Ok(judgment)
}

/// Owns the classifier capability selected at startup and guarantees a
/// complete judgment for every call.
pub struct JudgmentAdapter {
    remote: Option<Box<dyn Classifier>>,
}

impl JudgmentAdapter {
    pub fn new(config: &ClassifierConfig) -> Self {
        let remote: Option<Box<dyn Classifier>> = if config.enabled {
            match RemoteClassifier::new(config) {
                Ok(classifier) => Some(Box::new(classifier)),
                Err(e) => {
                    log::warn!("remote classifier unavailable, falling back to local analysis: {e}");
                    None
                }
            }
        } else {
            None
        };

        Self { remote }
    }

    pub fn with_classifier(classifier: Box<dyn Classifier>) -> Self {
        Self {
            remote: Some(classifier),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Always returns a judgment: remote when available and valid, the
    /// deterministic local fallback otherwise.
    pub async fn judge(
        &self,
        message_content: &str,
        extracted_url: Option<&str>,
        enrichment: &EnrichmentBundle,
        url_resolution: Option<&UrlResolution>,
    ) -> AiJudgment {
        if let Some(classifier) = &self.remote {
            let request = ClassifyRequest {
                message_content,
                extracted_url,
                enrichment,
                url_resolution,
            };
            match classifier.classify(&request).await {
                Ok(raw) => return Self::validated(raw),
                Err(e) => {
                    log::warn!("classifier call failed, using fallback analysis: {e}");
                }
            }
        }

        fallback_analysis(message_content, enrichment, url_resolution)
    }

    fn validated(raw: RawJudgment) -> AiJudgment {
        AiJudgment {
            attack_type: raw.attack_type.unwrap_or(AttackType::Unknown),
            confidence_score: raw.confidence_score.unwrap_or(0).clamp(0, 100) as i32,
            risk_level: raw.risk_level.unwrap_or(RiskLevel::Low),
            indicators: raw.indicators,
            reasoning: raw
                .reasoning
                .unwrap_or_else(|| "No detailed reasoning available".to_string()),
            attacker_intent: raw
                .attacker_intent
                .unwrap_or_else(|| "Unable to determine intent".to_string()),
            recommended_action: raw
                .recommended_action
                .as_deref()
                .and_then(RecommendedAction::parse),
            is_ai_powered: true,
        }
    }
}

/// Deterministic local analysis used whenever no validated remote
/// judgment exists. Pure function of its inputs.
pub fn fallback_analysis(
    message_content: &str,
    enrichment: &EnrichmentBundle,
    url_resolution: Option<&UrlResolution>,
) -> AiJudgment {
    let mut indicators = Vec::new();

    // Legitimate destination short-circuits into a marketing judgment
    if url_resolution.map_or(false, |r| r.is_legitimate_domain) {
        let final_domain = url_resolution
            .and_then(|r| r.final_domain.as_deref())
            .unwrap_or("");
        indicators.push(Indicator::new(
            "LEGITIMATE_MARKETING",
            format!("URL resolves to legitimate domain: {final_domain}"),
            "LOW",
            80,
        ));

        let content_lower = message_content.to_lowercase();
        if !content_lower.is_empty() {
            let marketing_keywords = ["sale", "offer", "discount", "shop", "deal", "product"];
            if marketing_keywords.iter().any(|k| content_lower.contains(k)) {
                indicators.push(Indicator::new(
                    "MARKETING_CONTENT",
                    "Message contains marketing-related keywords".to_string(),
                    "LOW",
                    70,
                ));
            }
        }

        return AiJudgment {
            attack_type: AttackType::MarketingLink,
            confidence_score: 20,
            risk_level: RiskLevel::Low,
            indicators,
            reasoning: "URL resolves to legitimate marketing domain with appropriate content"
                .to_string(),
            attacker_intent: "Legitimate business marketing/promotion".to_string(),
            recommended_action: Some(RecommendedAction::Allow),
            is_ai_powered: false,
        };
    }

    let mut confidence_score = 0i64;
    let mut attack_type = AttackType::Unknown;
    let mut risk_level = RiskLevel::Low;

    if !message_content.is_empty() {
        let content_lower = message_content.to_lowercase();
        const PHISHING_KEYWORDS: [(&str, i64); 10] = [
            ("urgent", 15),
            ("verify", 20),
            ("suspended", 25),
            ("click here", 10),
            ("act now", 15),
            ("limited time", 10),
            ("confirm", 15),
            ("update", 10),
            ("security", 15),
            ("account", 15),
        ];

        for (keyword, score) in PHISHING_KEYWORDS {
            if content_lower.contains(keyword) {
                confidence_score += score;
                indicators.push(Indicator::new(
                    "SUSPICIOUS_LANGUAGE",
                    format!("Contains phishing keyword: '{keyword}'"),
                    "MEDIUM",
                    score * 2,
                ));
            }
        }
    }

    if enrichment.safe_browsing_verdict() == Some("MALICIOUS") {
        confidence_score += 60;
        attack_type = AttackType::PhishingLink;
        risk_level = RiskLevel::High;
        indicators.push(Indicator::new(
            "SECURITY_SERVICE",
            "Flagged as malicious by Google Safe Browsing".to_string(),
            "HIGH",
            95,
        ));
    }

    let malicious_count = enrichment
        .virustotal
        .as_ref()
        .and_then(|vt| vt.malicious_count)
        .unwrap_or(0);
    if malicious_count > 3 {
        confidence_score += 40;
        attack_type = AttackType::PhishingLink;
        risk_level = RiskLevel::High;
        indicators.push(Indicator::new(
            "SECURITY_SERVICE",
            format!("Flagged by {malicious_count} security engines"),
            "HIGH",
            85,
        ));
    }

    let confidence_score = confidence_score.min(100);

    // Threshold tiers win over the per-signal assignments above
    if confidence_score >= 70 {
        risk_level = RiskLevel::High;
    } else if confidence_score >= 40 {
        risk_level = RiskLevel::Medium;
    }

    let recommended_action = if confidence_score >= 80 {
        RecommendedAction::Block
    } else if confidence_score >= 60 {
        RecommendedAction::Quarantine
    } else if confidence_score >= 30 {
        RecommendedAction::Verify
    } else {
        RecommendedAction::Caution
    };

    AiJudgment {
        attack_type,
        confidence_score: confidence_score as i32,
        risk_level,
        indicators,
        reasoning: "AI service unavailable, using rule-based fallback analysis".to_string(),
        attacker_intent: "Unable to determine without AI analysis".to_string(),
        recommended_action: Some(recommended_action),
        is_ai_powered: false,
    }
}
