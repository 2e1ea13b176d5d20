use serde::{Deserialize, Serialize};

use crate::url_resolver::UrlResolution;

/// Confidence floor at which a resolved link counts as marketing. Lower
/// than the phishing thresholds on purpose: a marketing false negative is
/// cheaper than a phishing false negative.
pub const MARKETING_CONFIDENCE_BAR: i32 = 40;

const TITLE_MARKETING_KEYWORDS: &[&str] = &[
    "sale", "offer", "discount", "deal", "shop", "buy", "product", "store", "mall", "mart",
    "shopping", "order", "cart", "checkout", "payment", "official",
];

const MARKETING_PATHS: &[&str] = &[
    "/product/",
    "/item/",
    "/deal/",
    "/offer/",
    "/sale/",
    "/shop/",
    "/store/",
    "/campaign/",
    "/promo/",
    "/landing/",
];

const LEGITIMATE_MARKETING_PHRASES: &[&str] = &[
    "exclusive offer",
    "limited time",
    "shop now",
    "official store",
    "free shipping",
    "cashback",
    "rewards",
    "membership",
    "subscribe",
    "newsletter",
    "brand new",
    "latest collection",
];

const SUSPICIOUS_URGENCY_PHRASES: &[&str] = &[
    "urgent action",
    "account suspended",
    "verify immediately",
    "click now or lose",
    "limited spots",
    "act fast",
    "share otp",
    "enter password",
    "confirm details",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingAssessment {
    pub is_likely_marketing: bool,
    pub confidence: i32,
    pub indicators: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Judge whether a resolved link looks like legitimate marketing.
///
/// Each condition contributes independently; the confidence is clamped to
/// [0,100] at the end.
pub fn analyze_marketing_legitimacy(
    resolution: &UrlResolution,
    content_text: &str,
) -> MarketingAssessment {
    let mut assessment = MarketingAssessment {
        is_likely_marketing: false,
        confidence: 0,
        indicators: Vec::new(),
        risk_factors: Vec::new(),
    };

    if !resolution.is_accessible {
        assessment
            .risk_factors
            .push("URL is not accessible".to_string());
        return assessment;
    }

    if resolution.is_legitimate_domain {
        assessment.confidence += 40;
        assessment
            .indicators
            .push("Resolves to known legitimate domain".to_string());
        log::debug!(
            "legitimate marketing domain: {}",
            resolution.final_domain.as_deref().unwrap_or("")
        );
    }

    let title = resolution.title.as_deref().unwrap_or("").to_lowercase();
    if !title.is_empty() {
        let keyword_count = TITLE_MARKETING_KEYWORDS
            .iter()
            .filter(|keyword| title.contains(*keyword))
            .count();
        if keyword_count >= 2 {
            assessment.confidence += 20;
            let snippet: String = title.chars().take(50).collect();
            assessment
                .indicators
                .push(format!("Title contains marketing keywords: {snippet}"));
        }
    }

    let final_url = resolution.final_url.as_deref().unwrap_or("").to_lowercase();
    if !final_url.is_empty() && MARKETING_PATHS.iter().any(|path| final_url.contains(path)) {
        assessment.confidence += 15;
        assessment
            .indicators
            .push("URL contains marketing path indicators".to_string());
    }

    let content_lower = content_text.to_lowercase();
    if !content_lower.is_empty() {
        if LEGITIMATE_MARKETING_PHRASES
            .iter()
            .any(|phrase| content_lower.contains(phrase))
        {
            assessment.confidence += 10;
            assessment
                .indicators
                .push("Message contains legitimate marketing language".to_string());
        }

        if SUSPICIOUS_URGENCY_PHRASES
            .iter()
            .any(|phrase| content_lower.contains(phrase))
        {
            assessment.confidence -= 20;
            assessment
                .risk_factors
                .push("Contains suspicious urgency language".to_string());
        }
    }

    let hops = resolution.redirect_chain.len();
    if hops > 3 {
        assessment.confidence -= 10;
        assessment
            .risk_factors
            .push(format!("Long redirect chain ({hops} hops)"));
    }

    assessment.confidence = assessment.confidence.clamp(0, 100);
    assessment.is_likely_marketing = assessment.confidence >= MARKETING_CONFIDENCE_BAR;

    assessment
}
