use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // Three forms: scheme-prefixed, www-prefixed, bare domain with TLD
    static ref URL_PATTERN: Regex = Regex::new(
        r"https?://[^\s/$.?#].[^\s]*|www\.[^\s/$.?#].[^\s]*|[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(?:[/\S]*)"
    )
    .unwrap();
}

/// Evidence pulled out of a raw submission before any scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEvidence {
    pub url: Option<String>,
    pub message_text: String,
    pub multiple_urls: bool,
}

/// Extract the first URL-like token and the surrounding message text.
///
/// `message_text` is empty only when the whole input is the URL itself;
/// otherwise the full input is kept so message rules see the URL in context.
pub fn extract_evidence(raw_input: &str) -> ExtractedEvidence {
    let mut matches = URL_PATTERN.find_iter(raw_input);
    let url = matches.next().map(|m| m.as_str().to_string());
    let multiple_urls = matches.next().is_some();

    let message_text = match &url {
        Some(u) if raw_input.trim() == u.trim() => String::new(),
        _ => raw_input.to_string(),
    };

    ExtractedEvidence {
        url,
        message_text,
        multiple_urls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_scheme_url() {
        let evidence = extract_evidence("Click here: https://example.com/login now");
        assert_eq!(evidence.url.as_deref(), Some("https://example.com/login"));
        assert!(!evidence.multiple_urls);
        assert_eq!(evidence.message_text, "Click here: https://example.com/login now");
    }

    #[test]
    fn test_extract_www_url() {
        let evidence = extract_evidence("Visit www.example.com for details");
        assert_eq!(evidence.url.as_deref(), Some("www.example.com"));
    }

    #[test]
    fn test_extract_bare_domain() {
        let evidence = extract_evidence("offer at deals.example.shop/sale today");
        assert_eq!(evidence.url.as_deref(), Some("deals.example.shop/sale"));
    }

    #[test]
    fn test_whole_input_url_empties_message() {
        let evidence = extract_evidence("  https://example.com/x  ");
        assert_eq!(evidence.url.as_deref(), Some("https://example.com/x"));
        assert_eq!(evidence.message_text, "");
    }

    #[test]
    fn test_multiple_urls_keeps_first() {
        let evidence =
            extract_evidence("see https://first.example/a and https://second.example/b");
        assert_eq!(evidence.url.as_deref(), Some("https://first.example/a"));
        assert!(evidence.multiple_urls);
    }

    #[test]
    fn test_no_url() {
        let evidence = extract_evidence("hello there, nothing to click");
        assert_eq!(evidence.url, None);
        assert!(!evidence.multiple_urls);
        assert_eq!(evidence.message_text, "hello there, nothing to click");
    }
}
