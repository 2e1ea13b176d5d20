use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::enrichment::EnrichmentBundle;
use crate::submission::Platform;

/// Raw accumulation ceiling, halved into the reported [0,100] score.
/// The headroom keeps single high-weight rules from saturating the scale.
const RAW_SCORE_CEILING: i32 = 200;

// The scorer carries its own, smaller shortener list; the resolver's list
// decides what gets resolved, this one only prices the risk.
const SCORER_SHORTENERS: &[&str] = &[
    "bit.ly",
    "t.co",
    "tinyurl.com",
    "ow.ly",
    "buff.ly",
    "shorturl.at",
    "is.gd",
    "goo.gl",
    "rb.gy",
];

const TYPOSQUAT_TOKENS: &[&str] = &["g00gle", "faceb00k", "micros0ft", "amaz0n", "paypa1"];

const SUSPICIOUS_TLDS: &[&str] = &[".xyz", ".top", ".pw", ".loan", ".buzz"];

// Messaging-platform context rule matches against the whole URL string
const CONTEXT_SHORTENERS: &[&str] = &["bit.ly", "t.co"];

lazy_static! {
    static ref URGENCY_RE: Regex =
        Regex::new(r"(?i)\b(immediately|urgent|within 24 hours)\b").unwrap();
    static ref CREDENTIAL_RE: Regex =
        Regex::new(r"(?i)\b(OTP|one time password|password|PIN)\b").unwrap();
    static ref MONEY_BAIT_RE: Regex = Regex::new(r"(?i)\b(money|lottery|prize|transfer)\b").unwrap();
    static ref THREAT_RE: Regex =
        Regex::new(r"(?i)\b(account blocked|suspended|legal action)\b").unwrap();
    static ref CALL_TO_ACTION_RE: Regex = Regex::new(r"(?i)\b(click here|verify now)\b").unwrap();
    static ref JOB_BAIT_RE: Regex = Regex::new(r"(?i)\b(work from home)\b").unwrap();
    static ref UPFRONT_FEE_RE: Regex = Regex::new(r"(?i)\b(pay first|upfront fee)\b").unwrap();
    static ref IPV4_HOST_RE: Regex = Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}$").unwrap();
}

/// One scoring contribution; the ordered sequence is the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: String,
    pub delta: i32,
}

impl EvidenceItem {
    pub fn new(source: &str, delta: i32) -> Self {
        EvidenceItem {
            source: source.to_string(),
            delta,
        }
    }
}

/// Deterministic weighted scoring over enrichment signals, URL structure,
/// and message wording. Returns the bounded [0,100] score plus the
/// evidence trail behind it.
pub fn calculate_heuristic_score(
    raw_input: &str,
    extracted_url: Option<&str>,
    enrichment: &EnrichmentBundle,
    platform: Platform,
) -> (i32, Vec<EvidenceItem>) {
    fn add(raw_score: &mut i32, evidence: &mut Vec<EvidenceItem>, source: &str, delta: i32) {
        *raw_score += delta;
        evidence.push(EvidenceItem::new(source, delta));
    }

    let mut raw_score = 0i32;
    let mut evidence: Vec<EvidenceItem> = Vec::new();

    match enrichment.safe_browsing_verdict() {
        Some("MALICIOUS") => add(&mut raw_score, &mut evidence, "safe_browsing", 60),
        Some("SUSPICIOUS") => add(&mut raw_score, &mut evidence, "safe_browsing", 30),
        _ => {}
    }

    let malicious_count = enrichment
        .virustotal
        .as_ref()
        .and_then(|vt| vt.malicious_count)
        .unwrap_or(0);
    if malicious_count > 0 {
        let vt_score = 10 * malicious_count.min(10) as i32;
        add(&mut raw_score, &mut evidence, "virustotal", vt_score);
    }

    if enrichment
        .urlscan
        .as_ref()
        .and_then(|us| us.verdict.as_deref())
        == Some("malicious")
    {
        add(&mut raw_score, &mut evidence, "urlscan", 40);
    }

    if let Some(age_days) = enrichment.whois.as_ref().and_then(|w| w.age_days) {
        if age_days < 90 {
            add(&mut raw_score, &mut evidence, "whois", 20);
        }
    }

    if enrichment.tls.as_ref().and_then(|t| t.valid) == Some(false) {
        add(&mut raw_score, &mut evidence, "tls", 25);
    }

    let matching_entries = enrichment
        .ct_logs
        .as_ref()
        .and_then(|ct| ct.matching_entries)
        .unwrap_or(0);
    if matching_entries > 5 {
        // More transparency lowers suspicion
        add(&mut raw_score, &mut evidence, "ct_logs", -10);
    }

    if let Some(reputation) = enrichment.domain_reputation_score {
        // Recorded even at zero so the audit trail shows it was consulted
        let domain_score = reputation.clamp(0, 40) as i32;
        add(&mut raw_score, &mut evidence, "domain_reputation", domain_score);
    }

    if !enrichment.blacklist_matches.is_empty() {
        add(&mut raw_score, &mut evidence, "blacklist", 50);
    }

    if enrichment
        .ip_reputation
        .as_ref()
        .and_then(|ip| ip.is_malicious)
        == Some(true)
    {
        add(&mut raw_score, &mut evidence, "ip_reputation", 40);
    }

    if let Some(url) = extracted_url {
        let candidate = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{url}")
        };

        if let Ok(parsed) = Url::parse(&candidate) {
            let hostname = parsed.host_str().unwrap_or("").to_lowercase();

            if SCORER_SHORTENERS.iter().any(|s| hostname.contains(s)) {
                // Reduced weight: shorteners are also common in legitimate
                // marketing
                add(&mut raw_score, &mut evidence, "raw_input", 15);
            }

            if IPV4_HOST_RE.is_match(&hostname)
                || (hostname.starts_with('[') && hostname.ends_with(']'))
            {
                add(&mut raw_score, &mut evidence, "raw_input", 20);
            }

            if hostname.contains("xn--") {
                add(&mut raw_score, &mut evidence, "raw_input", 25);
            }

            if TYPOSQUAT_TOKENS.iter().any(|t| hostname.contains(t)) {
                add(&mut raw_score, &mut evidence, "raw_input", 40);
            }

            if SUSPICIOUS_TLDS.iter().any(|tld| hostname.ends_with(tld)) {
                add(&mut raw_score, &mut evidence, "raw_input", 10);
            }

            let query_keys: HashSet<String> = parsed
                .query_pairs()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, _)| key.to_string())
                .collect();
            if parsed.path().len() > 120 || query_keys.len() > 5 {
                add(&mut raw_score, &mut evidence, "raw_input", 8);
            }
        }
    }

    if !raw_input.is_empty() {
        if URGENCY_RE.is_match(raw_input) {
            add(&mut raw_score, &mut evidence, "raw_input", 15);
        }
        if CREDENTIAL_RE.is_match(raw_input) {
            add(&mut raw_score, &mut evidence, "raw_input", 35);
        }
        if MONEY_BAIT_RE.is_match(raw_input) {
            add(&mut raw_score, &mut evidence, "raw_input", 25);
        }
        if THREAT_RE.is_match(raw_input) {
            add(&mut raw_score, &mut evidence, "raw_input", 20);
        }
        if CALL_TO_ACTION_RE.is_match(raw_input) {
            add(&mut raw_score, &mut evidence, "raw_input", 10);
        }
        if JOB_BAIT_RE.is_match(raw_input) && UPFRONT_FEE_RE.is_match(raw_input) {
            add(&mut raw_score, &mut evidence, "raw_input", 20);
        }
    }

    if let Some(sandbox) = &enrichment.sandbox {
        if sandbox.performed {
            let behavior = sandbox
                .behavior_summary
                .as_deref()
                .unwrap_or("")
                .to_lowercase();
            if ["download", "spawned process", "crypto-miner"]
                .iter()
                .any(|word| behavior.contains(word))
            {
                add(&mut raw_score, &mut evidence, "sandbox", 60);
            } else if behavior.contains("harmless static content") {
                add(&mut raw_score, &mut evidence, "sandbox", -15);
            }
        }
    }

    if matches!(platform, Platform::Sms | Platform::Whatsapp) {
        if let Some(url) = extracted_url {
            if CONTEXT_SHORTENERS.iter().any(|s| url.contains(s)) {
                add(&mut raw_score, &mut evidence, "raw_input", 10);
            }
        }
    }

    if enrichment.prior_scans_for_domain.unwrap_or(0) > 10 {
        add(&mut raw_score, &mut evidence, "domain_reputation", 30);
    }

    let clamped = raw_score.clamp(0, RAW_SCORE_CEILING);
    // Halve with round-half-up, integer arithmetic so every platform agrees
    let heuristic_score = ((clamped + 1) / 2).min(100);

    (heuristic_score, evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{
        CtLogSignal, SafeBrowsingSignal, SandboxSignal, UrlScanSignal, VirusTotalSignal,
        WhoisSignal,
    };

    fn no_enrichment() -> EnrichmentBundle {
        EnrichmentBundle::default()
    }

    #[test]
    fn test_typosquat_with_threat_language() {
        let (score, evidence) = calculate_heuristic_score(
            "Your account is suspended, verify now: http://paypa1-secure.com/login",
            Some("http://paypa1-secure.com/login"),
            &no_enrichment(),
            Platform::None,
        );

        // typosquat 40, suspended 20, verify now 10 -> raw 70
        assert_eq!(score, 35);
        let deltas: Vec<i32> = evidence.iter().map(|e| e.delta).collect();
        assert_eq!(deltas, vec![40, 20, 10]);
        assert!(evidence.iter().all(|e| e.source == "raw_input"));
    }

    #[test]
    fn test_score_clamped_at_ceiling() {
        let enrichment: EnrichmentBundle = serde_json::from_value(serde_json::json!({
            "safe_browsing": {"verdict": "MALICIOUS"},
            "virustotal": {"malicious_count": 25},
            "urlscan": {"verdict": "malicious"},
            "blacklist_matches": [{"source": "phishtank"}],
            "ip_reputation": {"is_malicious": true}
        }))
        .unwrap();

        let (score, evidence) =
            calculate_heuristic_score("", None, &enrichment, Platform::None);

        // 60 + 100 + 40 + 50 + 40 = 290, clamped to 200, halved
        assert_eq!(score, 100);
        assert_eq!(evidence.iter().map(|e| e.delta).sum::<i32>(), 290);
    }

    #[test]
    fn test_virustotal_engine_cap() {
        let mut enrichment = no_enrichment();
        enrichment.virustotal = Some(VirusTotalSignal {
            malicious_count: Some(25),
            detail_url: None,
        });

        let (_, evidence) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(evidence, vec![EvidenceItem::new("virustotal", 100)]);
    }

    #[test]
    fn test_suspicious_safe_browsing() {
        let mut enrichment = no_enrichment();
        enrichment.safe_browsing = Some(SafeBrowsingSignal {
            verdict: Some("SUSPICIOUS".to_string()),
            detail_url: None,
        });

        let (score, evidence) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(score, 15);
        assert_eq!(evidence, vec![EvidenceItem::new("safe_browsing", 30)]);
    }

    #[test]
    fn test_domain_reputation_recorded_even_at_zero() {
        let mut enrichment = no_enrichment();
        enrichment.domain_reputation_score = Some(0);

        let (score, evidence) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(score, 0);
        assert_eq!(evidence, vec![EvidenceItem::new("domain_reputation", 0)]);
    }

    #[test]
    fn test_domain_reputation_clamped_to_forty() {
        let mut enrichment = no_enrichment();
        enrichment.domain_reputation_score = Some(80);

        let (_, evidence) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(evidence, vec![EvidenceItem::new("domain_reputation", 40)]);
    }

    #[test]
    fn test_ct_transparency_lowers_score() {
        let mut enrichment = no_enrichment();
        enrichment.whois = Some(WhoisSignal { age_days: Some(30) });
        enrichment.ct_logs = Some(CtLogSignal {
            matching_entries: Some(12),
        });

        let (score, evidence) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        // whois 20, ct_logs -10 -> raw 10
        assert_eq!(score, 5);
        assert_eq!(
            evidence,
            vec![
                EvidenceItem::new("whois", 20),
                EvidenceItem::new("ct_logs", -10)
            ]
        );
    }

    #[test]
    fn test_negative_raw_clamps_to_zero() {
        let mut enrichment = no_enrichment();
        enrichment.ct_logs = Some(CtLogSignal {
            matching_entries: Some(6),
        });

        let (score, _) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_round_half_up() {
        let mut enrichment = no_enrichment();
        enrichment.domain_reputation_score = Some(5);

        let (score, _) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(score, 3);
    }

    #[test]
    fn test_shortener_hostname() {
        let (score, _) = calculate_heuristic_score(
            "check this out https://bit.ly/abc",
            Some("https://bit.ly/abc"),
            &no_enrichment(),
            Platform::None,
        );
        assert_eq!(score, 8);
    }

    #[test]
    fn test_ip_literal_hostname() {
        let (_, evidence) = calculate_heuristic_score(
            "",
            Some("http://192.168.10.15/login"),
            &no_enrichment(),
            Platform::None,
        );
        assert_eq!(evidence, vec![EvidenceItem::new("raw_input", 20)]);
    }

    #[test]
    fn test_punycode_hostname() {
        let (_, evidence) = calculate_heuristic_score(
            "",
            Some("http://xn--pypal-4ve.com/signin"),
            &no_enrichment(),
            Platform::None,
        );
        assert_eq!(evidence, vec![EvidenceItem::new("raw_input", 25)]);
    }

    #[test]
    fn test_suspicious_tld() {
        let (_, evidence) = calculate_heuristic_score(
            "",
            Some("http://win-big.xyz"),
            &no_enrichment(),
            Platform::None,
        );
        assert_eq!(evidence, vec![EvidenceItem::new("raw_input", 10)]);
    }

    #[test]
    fn test_overlong_path() {
        let url = format!("http://example.com/{}", "a".repeat(125));
        let (_, evidence) =
            calculate_heuristic_score("", Some(&url), &no_enrichment(), Platform::None);
        assert_eq!(evidence, vec![EvidenceItem::new("raw_input", 8)]);
    }

    #[test]
    fn test_many_query_params() {
        let url = "http://example.com/p?a=1&b=2&c=3&d=4&e=5&f=6";
        let (_, evidence) =
            calculate_heuristic_score("", Some(url), &no_enrichment(), Platform::None);
        assert_eq!(evidence, vec![EvidenceItem::new("raw_input", 8)]);
    }

    #[test]
    fn test_credential_phrases_weigh_heaviest() {
        let (score, evidence) = calculate_heuristic_score(
            "Share your OTP immediately to claim the lottery prize",
            None,
            &no_enrichment(),
            Platform::None,
        );
        // urgency 15, credential 35, money 25 -> raw 75
        assert_eq!(score, 38);
        assert_eq!(evidence.iter().map(|e| e.delta).sum::<i32>(), 75);
    }

    #[test]
    fn test_job_scam_requires_both_phrases() {
        let (score_one, _) = calculate_heuristic_score(
            "Great work from home opportunity",
            None,
            &no_enrichment(),
            Platform::None,
        );
        assert_eq!(score_one, 0);

        let (score_both, _) = calculate_heuristic_score(
            "Work from home, just pay first to register",
            None,
            &no_enrichment(),
            Platform::None,
        );
        assert_eq!(score_both, 10);
    }

    #[test]
    fn test_sandbox_behaviors() {
        let mut enrichment = no_enrichment();
        enrichment.sandbox = Some(SandboxSignal {
            performed: true,
            behavior_summary: Some("Spawned process and started a crypto-miner".to_string()),
        });
        let (score, _) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(score, 30);

        enrichment.sandbox = Some(SandboxSignal {
            performed: true,
            behavior_summary: Some("Served harmless static content".to_string()),
        });
        let (score, evidence) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(score, 0);
        assert_eq!(evidence, vec![EvidenceItem::new("sandbox", -15)]);
    }

    #[test]
    fn test_messaging_platform_shortener_context() {
        let (sms_score, _) = calculate_heuristic_score(
            "",
            Some("https://bit.ly/win"),
            &no_enrichment(),
            Platform::Sms,
        );
        let (email_score, _) = calculate_heuristic_score(
            "",
            Some("https://bit.ly/win"),
            &no_enrichment(),
            Platform::Email,
        );

        // shortener 15 everywhere, plus context 10 on messaging platforms
        assert_eq!(sms_score, 13);
        assert_eq!(email_score, 8);
    }

    #[test]
    fn test_prior_scans_signal() {
        let mut enrichment = no_enrichment();
        enrichment.prior_scans_for_domain = Some(11);

        let (score, evidence) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(score, 15);
        assert_eq!(evidence, vec![EvidenceItem::new("domain_reputation", 30)]);
    }

    #[test]
    fn test_urlscan_verdict_case_sensitive() {
        let mut enrichment = no_enrichment();
        enrichment.urlscan = Some(UrlScanSignal {
            verdict: Some("MALICIOUS".to_string()),
            detail_url: None,
            screenshot_url: None,
        });

        let (score, _) = calculate_heuristic_score("", None, &enrichment, Platform::None);
        assert_eq!(score, 0);
    }
}
