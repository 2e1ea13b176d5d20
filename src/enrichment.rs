use serde::{Deserialize, Serialize};

/// Pre-fetched intelligence signals supplied alongside a submission.
///
/// Every signal is optional. A missing signal means "not collected" and
/// contributes no evidence; it is never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentBundle {
    pub safe_browsing: Option<SafeBrowsingSignal>,
    pub virustotal: Option<VirusTotalSignal>,
    pub urlscan: Option<UrlScanSignal>,
    pub whois: Option<WhoisSignal>,
    pub tls: Option<TlsSignal>,
    pub ct_logs: Option<CtLogSignal>,
    pub domain_reputation_score: Option<i64>,
    #[serde(default)]
    pub blacklist_matches: Vec<BlacklistMatch>,
    pub ip_reputation: Option<IpReputationSignal>,
    pub sandbox: Option<SandboxSignal>,
    pub prior_scans_for_domain: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafeBrowsingSignal {
    pub verdict: Option<String>,
    pub detail_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirusTotalSignal {
    pub malicious_count: Option<i64>,
    pub detail_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlScanSignal {
    pub verdict: Option<String>,
    pub detail_url: Option<String>,
    pub screenshot_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhoisSignal {
    pub age_days: Option<i64>,
}

/// `valid` is tri-state: only an explicit `false` counts as evidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsSignal {
    pub valid: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CtLogSignal {
    pub matching_entries: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlacklistMatch {
    #[serde(default)]
    pub source: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpReputationSignal {
    pub is_malicious: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxSignal {
    #[serde(default)]
    pub performed: bool,
    pub behavior_summary: Option<String>,
}

impl EnrichmentBundle {
    /// Verdict string from Safe Browsing, if the signal was collected
    pub fn safe_browsing_verdict(&self) -> Option<&str> {
        self.safe_browsing
            .as_ref()
            .and_then(|sb| sb.verdict.as_deref())
    }

    /// True when any blacklist match comes from a trusted feed
    pub fn trusted_blacklist_match(&self) -> bool {
        self.blacklist_matches.iter().any(|m| {
            let source = m.source.to_lowercase();
            source.contains("phishtank") || source.contains("openphish")
        })
    }
}
