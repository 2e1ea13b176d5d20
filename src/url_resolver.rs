use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ResolverConfig;
use crate::domain_utils::DomainUtils;

/// Shortener hosts that warrant resolution before scoring
pub const SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly",
    "t.co",
    "tinyurl.com",
    "ow.ly",
    "buff.ly",
    "shorturl.at",
    "is.gd",
    "goo.gl",
    "rb.gy",
    "tiny.cc",
    "shorte.st",
    "adf.ly",
    "linktr.ee",
    "cutt.ly",
    "short.link",
];

/// Destinations treated as legitimate marketing, matched exact or subdomain
pub const LEGITIMATE_MARKETING_DOMAINS: &[&str] = &[
    "amazon.com",
    "amazon.in",
    "amazon.co.uk",
    "amazon.de",
    "amazon.fr",
    "flipkart.com",
    "myntra.com",
    "ajio.com",
    "nykaa.com",
    "shopify.com",
    "bigbasket.com",
    "grofers.com",
    "blinkit.com",
    "swiggy.com",
    "zomato.com",
    "bookmyshow.com",
    "makemytrip.com",
    "goibibo.com",
    "paytm.com",
    "phonepe.com",
    "googlepay.com",
    "youtube.com",
    "youtu.be",
    "netflix.com",
    "hotstar.com",
    "primevideo.com",
    "spotify.com",
    "gaana.com",
    "jiosaavn.com",
    "airtel.com",
    "jio.com",
    "vodafone.com",
    "idea.com",
    "bsnl.in",
    "linkedin.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "whatsapp.com",
    "telegram.org",
    "discord.com",
    "zoom.us",
    "microsoft.com",
    "google.com",
    "apple.com",
    "samsung.com",
    "oneplus.com",
    "xiaomi.com",
    "realme.com",
    "oppo.com",
    "vivo.com",
    "nokia.com",
    "sony.com",
    "lg.com",
    "mi.com",
    "ebay.com",
    "ebay.in",
    "alibaba.com",
    "aliexpress.com",
    "walmart.com",
    "target.com",
    "bestbuy.com",
    "tesco.com",
];

const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Outcome of tracing a shortened URL to its destination.
///
/// `final_url` is populated on every termination path, including network
/// failure and the redirect limit; `error` carries what went wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlResolution {
    pub original_url: String,
    pub final_url: Option<String>,
    pub redirect_chain: Vec<RedirectHop>,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub is_accessible: bool,
    pub response_time: Option<f64>,
    pub content_type: Option<String>,
    pub title: Option<String>,
    pub final_domain: Option<String>,
    pub is_legitimate_domain: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectHop {
    pub url: String,
    pub status_code: u16,
}

impl UrlResolution {
    pub fn new(original_url: &str) -> Self {
        UrlResolution {
            original_url: original_url.to_string(),
            final_url: None,
            redirect_chain: Vec::new(),
            status_code: None,
            error: None,
            is_accessible: false,
            response_time: None,
            content_type: None,
            title: None,
            final_domain: None,
            is_legitimate_domain: false,
        }
    }
}

pub struct UrlResolver {
    client: Client,
    max_redirects: u8,
}

impl UrlResolver {
    pub fn new(config: &ResolverConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }

    /// Check if a URL points at a known shortener service
    pub fn is_shortened(&self, url: &str) -> bool {
        let host = DomainUtils::extract_hostname(url).unwrap_or_default();
        SHORTENER_DOMAINS.iter().any(|s| host.contains(s))
    }

    /// Follow redirects hop by hop and describe where the URL lands.
    ///
    /// Never fails: network errors, a missing Location header, and the
    /// redirect limit all terminate the trace with the outcome recorded
    /// on the returned resolution.
    pub async fn resolve(&self, url: &str) -> UrlResolution {
        let mut resolution = UrlResolution::new(url);

        let mut current_url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{url}")
        };

        let started = Instant::now();
        let mut redirect_count = 0u8;

        while redirect_count < self.max_redirects {
            let response = match self.client.head(&current_url).send().await {
                Ok(response) => response,
                Err(e) => {
                    resolution.error = Some(format!("Request failed: {e}"));
                    break;
                }
            };

            let status = response.status().as_u16();
            resolution.redirect_chain.push(RedirectHop {
                url: current_url.clone(),
                status_code: status,
            });

            if !REDIRECT_STATUSES.contains(&status) {
                resolution.final_url = Some(current_url.clone());
                resolution.status_code = Some(status);
                resolution.is_accessible = (200..400).contains(&status);
                break;
            }

            let location = response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            if location.is_empty() {
                break;
            }

            current_url = match Self::resolve_location(&current_url, location) {
                Some(next) => next,
                None => break,
            };
            redirect_count += 1;
        }

        if redirect_count >= self.max_redirects {
            resolution.final_url = Some(current_url.clone());
            resolution.error = Some("Maximum redirects exceeded".to_string());
        }

        // Termination by error or missing location still reports the last
        // URL attempted
        if resolution.final_url.is_none() {
            resolution.final_url = Some(current_url.clone());
        }

        resolution.response_time = Some(started.elapsed().as_secs_f64());

        if resolution.is_accessible {
            if let Some(final_url) = resolution.final_url.clone() {
                self.fetch_page_info(&final_url, &mut resolution).await;
            }
        }

        if let Some(final_url) = resolution.final_url.clone() {
            if let Some(domain) = DomainUtils::extract_hostname(&final_url) {
                resolution.is_legitimate_domain =
                    DomainUtils::matches_domain_list(&domain, LEGITIMATE_MARKETING_DOMAINS);
                log::debug!(
                    "resolved {url} to {domain}, legitimate: {}",
                    resolution.is_legitimate_domain
                );
                resolution.final_domain = Some(domain);
            }
        }

        resolution
    }

    // Relative locations resolve against the current scheme and host
    fn resolve_location(current_url: &str, location: &str) -> Option<String> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Some(location.to_string());
        }

        let base = Url::parse(current_url).ok()?;
        let origin = base.origin().ascii_serialization();
        if location.starts_with('/') {
            Some(format!("{origin}{location}"))
        } else {
            Some(format!("{origin}/{location}"))
        }
    }

    // Capped content fetch for the final page, just enough for a title
    async fn fetch_page_info(&self, url: &str, resolution: &mut UrlResolution) {
        let mut response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(_) => return,
        };

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let mut body = Vec::new();
        let read_failed = loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    body.extend_from_slice(&chunk);
                    if body.len() >= 1024 {
                        break false;
                    }
                }
                Ok(None) => break false,
                Err(_) => break true,
            }
        };

        if !read_failed {
            resolution.title = Self::extract_title(&content_type, &body);
        }
        resolution.content_type = Some(content_type);
    }

    fn extract_title(content_type: &str, body: &[u8]) -> Option<String> {
        if !content_type.contains("text/html") {
            return None;
        }

        let content = String::from_utf8_lossy(body);
        let start = content.find("<title>")?;
        let end = content.find("</title>")?;
        let title_start = start + "<title>".len();
        if title_start > end {
            return None;
        }

        Some(content[title_start..end].trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with(max_redirects: u8) -> UrlResolver {
        let config = ResolverConfig {
            timeout_seconds: 5,
            max_redirects,
            ..ResolverConfig::default()
        };
        UrlResolver::new(&config).unwrap()
    }

    #[test]
    fn test_is_shortened() {
        let resolver = resolver_with(5);

        assert!(resolver.is_shortened("https://bit.ly/abc123"));
        assert!(resolver.is_shortened("http://tinyurl.com/test"));
        assert!(resolver.is_shortened("t.co/xyz789"));
        assert!(!resolver.is_shortened("https://google.com"));
        assert!(!resolver.is_shortened("https://example.com/path"));
    }

    #[test]
    fn test_resolve_location_absolute() {
        assert_eq!(
            UrlResolver::resolve_location("http://bit.ly/x", "https://example.com/landing"),
            Some("https://example.com/landing".to_string())
        );
    }

    #[test]
    fn test_resolve_location_relative() {
        assert_eq!(
            UrlResolver::resolve_location("https://example.com/a/b", "/next"),
            Some("https://example.com/next".to_string())
        );
        assert_eq!(
            UrlResolver::resolve_location("https://example.com/a/b", "next"),
            Some("https://example.com/next".to_string())
        );
        assert_eq!(
            UrlResolver::resolve_location("http://example.com:8080/a", "/next"),
            Some("http://example.com:8080/next".to_string())
        );
    }

    #[test]
    fn test_extract_title() {
        let body = b"<html><head><title> Great Diwali Sale - Shop Now </title></head>";
        assert_eq!(
            UrlResolver::extract_title("text/html; charset=utf-8", body),
            Some("Great Diwali Sale - Shop Now".to_string())
        );
        assert_eq!(UrlResolver::extract_title("application/json", body), None);
        assert_eq!(
            UrlResolver::extract_title("text/html", b"<html><body>no title</body>"),
            None
        );
    }

    #[test]
    fn test_legitimate_domain_matching() {
        assert!(DomainUtils::matches_domain_list(
            "www.amazon.in",
            LEGITIMATE_MARKETING_DOMAINS
        ));
        assert!(DomainUtils::matches_domain_list(
            "amazon.in",
            LEGITIMATE_MARKETING_DOMAINS
        ));
        assert!(!DomainUtils::matches_domain_list(
            "amazon.in.evil.example",
            LEGITIMATE_MARKETING_DOMAINS
        ));
        assert!(!DomainUtils::matches_domain_list(
            "paypa1-secure.com",
            LEGITIMATE_MARKETING_DOMAINS
        ));
    }

    // Minimal local HTTP server: one canned response per connection
    async fn spawn_server(respond: fn(&str) -> String) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let _ = socket.write_all(respond(&request).as_bytes()).await;
                });
            }
        });
        addr
    }

    fn endless_redirect(_request: &str) -> String {
        "HTTP/1.1 301 Moved Permanently\r\nLocation: /next\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string()
    }

    fn redirect_then_landing(request: &str) -> String {
        if request.starts_with("HEAD /start") {
            "HTTP/1.1 302 Found\r\nLocation: /landing\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_string()
        } else if request.starts_with("HEAD") {
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_string()
        } else {
            let body = "<html><head><title>Landing</title></head><body></body></html>";
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
        }
    }

    #[tokio::test]
    async fn test_redirect_limit_caps_chain_and_sets_final_url() {
        let addr = spawn_server(endless_redirect).await;
        let resolver = resolver_with(3);

        let resolution = resolver.resolve(&format!("http://{addr}/start")).await;

        assert_eq!(resolution.redirect_chain.len(), 3);
        assert_eq!(
            resolution.error.as_deref(),
            Some("Maximum redirects exceeded")
        );
        assert_eq!(
            resolution.final_url.as_deref(),
            Some(format!("http://{addr}/next").as_str())
        );
        assert!(!resolution.is_accessible);
        assert!(resolution.status_code.is_none());
    }

    #[tokio::test]
    async fn test_resolve_follows_hops_to_landing_page() {
        let addr = spawn_server(redirect_then_landing).await;
        let resolver = resolver_with(5);

        let resolution = resolver.resolve(&format!("http://{addr}/start")).await;

        assert_eq!(resolution.error, None);
        assert_eq!(resolution.status_code, Some(200));
        assert!(resolution.is_accessible);
        assert_eq!(
            resolution.final_url.as_deref(),
            Some(format!("http://{addr}/landing").as_str())
        );
        assert_eq!(resolution.redirect_chain.len(), 2);
        assert_eq!(resolution.redirect_chain[0].status_code, 302);
        assert_eq!(resolution.redirect_chain[1].status_code, 200);
        assert_eq!(resolution.title.as_deref(), Some("Landing"));
    }

    #[tokio::test]
    async fn test_network_failure_still_reports_final_url() {
        // Bind then drop so the port is known to refuse connections
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let resolver = resolver_with(5);
        let url = format!("http://{addr}/gone");
        let resolution = resolver.resolve(&url).await;

        let error = resolution.error.as_deref().unwrap();
        assert!(error.starts_with("Request failed"), "got: {error}");
        assert_eq!(resolution.final_url.as_deref(), Some(url.as_str()));
        assert!(resolution.redirect_chain.is_empty());
        assert!(!resolution.is_accessible);
    }
}
