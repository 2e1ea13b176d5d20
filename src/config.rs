use serde::{Deserialize, Serialize};

/// Operational settings. Scoring weights and thresholds are fixed in the
/// engine modules and deliberately not configurable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub timeout_seconds: u64,
    pub max_redirects: u8,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Resolved once at startup; selects the remote classifier or the
    /// deterministic local fallback for the lifetime of the process.
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            timeout_seconds: 10,
            max_redirects: 5,
            user_agent: concat!("phish-triage/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            enabled: false,
            endpoint: None,
            timeout_seconds: 15,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.resolver.max_redirects, 5);
        assert_eq!(parsed.resolver.timeout_seconds, 10);
        assert!(!parsed.classifier.enabled);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "classifier:\n  enabled: true\n  endpoint: http://localhost:9000/classify\n  timeout_seconds: 5\n";
        let parsed: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(parsed.classifier.enabled);
        assert_eq!(
            parsed.classifier.endpoint.as_deref(),
            Some("http://localhost:9000/classify")
        );
        assert_eq!(parsed.resolver.max_redirects, 5);
    }
}
