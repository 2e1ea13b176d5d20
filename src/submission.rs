use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichmentBundle;

/// One analysis request: the text as received, where it came from, and
/// whatever intelligence the caller already gathered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSubmission {
    pub raw_input: String,
    pub platform_hint: Option<String>,
    #[serde(default)]
    pub enrichment: EnrichmentBundle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Email,
    Sms,
    Whatsapp,
    Other,
    None,
}

impl Platform {
    /// Only email, sms and whatsapp change behavior; unknown hints are
    /// carried as Other
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some("email") => Platform::Email,
            Some("sms") => Platform::Sms,
            Some("whatsapp") => Platform::Whatsapp,
            Some(_) => Platform::Other,
            None => Platform::None,
        }
    }
}

impl RawSubmission {
    pub fn platform(&self) -> Platform {
        Platform::from_hint(self.platform_hint.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_hint() {
        assert_eq!(Platform::from_hint(Some("email")), Platform::Email);
        assert_eq!(Platform::from_hint(Some("sms")), Platform::Sms);
        assert_eq!(Platform::from_hint(Some("whatsapp")), Platform::Whatsapp);
        assert_eq!(Platform::from_hint(Some("telegram")), Platform::Other);
        assert_eq!(Platform::from_hint(None), Platform::None);
    }

    #[test]
    fn test_submission_without_enrichment() {
        let submission: RawSubmission =
            serde_json::from_str(r#"{"raw_input": "hello"}"#).unwrap();
        assert_eq!(submission.raw_input, "hello");
        assert_eq!(submission.platform(), Platform::None);
        assert!(submission.enrichment.safe_browsing.is_none());
    }
}
