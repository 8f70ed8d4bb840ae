use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Directory holding `phishing_emails.json`, `phishing_sms.json` and
    /// `phishing_urls.json`
    pub data_dir: String,
    pub feedback_path: String,
    pub text: TextDetectionConfig,
    pub link: LinkDetectionConfig,
    pub graph: DomainGraphConfig,
    pub resolver: ResolverConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TextDetectionConfig {
    pub phishing_keywords: Vec<String>,
    pub urgency_words: Vec<String>,
    pub financial_words: Vec<String>,
    pub action_words: Vec<String>,
    pub common_misspellings: Vec<String>,
    pub fear_words: Vec<String>,
    pub urgency_phrases: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LinkDetectionConfig {
    pub shorteners: Vec<String>,
    pub trusted_domains: Vec<String>,
    pub suspicious_tlds: Vec<String>,
    pub suspicious_keywords: Vec<String>,
    pub suspicious_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DomainGraphConfig {
    pub trusted_clusters: Vec<Vec<String>>,
    pub trusted_score: f64,
    pub phishing_score: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ResolverConfig {
    pub timeout_seconds: u64,
    pub max_redirects: u8,
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of off, error, warn, info, debug, trace
    pub level: String,
}

impl LoggingConfig {
    /// `None` when `level` names no known level
    pub fn level_filter(&self) -> Option<LevelFilter> {
        self.level.trim().parse().ok()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            feedback_path: "data/feedback.json".to_string(),
            text: TextDetectionConfig::default(),
            link: LinkDetectionConfig::default(),
            graph: DomainGraphConfig::default(),
            resolver: ResolverConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TextDetectionConfig {
    fn default() -> Self {
        Self {
            phishing_keywords: strings(&[
                "urgent",
                "verify",
                "suspend",
                "click here",
                "limited time",
                "act now",
                "confirm identity",
                "update payment",
                "security alert",
                "winner",
                "congratulations",
                "claim now",
                "expires",
                "final notice",
            ]),
            urgency_words: strings(&["urgent", "immediate", "expires", "deadline", "asap", "now"]),
            financial_words: strings(&[
                "bank",
                "credit card",
                "payment",
                "refund",
                "money",
                "prize",
            ]),
            action_words: strings(&["click", "verify", "confirm", "update", "download", "install"]),
            common_misspellings: strings(&["recieve", "seperate", "occured", "neccessary"]),
            fear_words: strings(&["danger", "risk", "threat", "warning", "alert", "problem"]),
            urgency_phrases: strings(&[
                "act now",
                "limited time",
                "expires soon",
                "immediate action",
            ]),
        }
    }
}

impl Default for LinkDetectionConfig {
    fn default() -> Self {
        Self {
            shorteners: strings(&["bit.ly", "tinyurl.com", "short.link", "t.co", "goo.gl"]),
            trusted_domains: strings(&[
                "google.com",
                "microsoft.com",
                "apple.com",
                "github.com",
                "stackoverflow.com",
            ]),
            suspicious_tlds: strings(&[".tk", ".ml", ".ga", ".cf", ".click", ".download"]),
            suspicious_keywords: strings(&[
                "verify", "secure", "account", "update", "confirm", "login",
            ]),
            suspicious_extensions: strings(&[".exe", ".scr", ".bat", ".com", ".pif"]),
        }
    }
}

impl Default for DomainGraphConfig {
    fn default() -> Self {
        Self {
            trusted_clusters: vec![
                strings(&["google.com", "youtube.com", "gmail.com", "googledrive.com"]),
                strings(&["microsoft.com", "outlook.com", "office.com", "xbox.com"]),
                strings(&["apple.com", "icloud.com", "itunes.com", "appstore.com"]),
                strings(&["github.com", "githubusercontent.com", "githubassets.com"]),
            ],
            trusted_score: 0.9,
            phishing_score: 0.1,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            max_redirects: 5,
            user_agent: format!("TrustEye/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let config: Config = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML config: {}", path.as_ref().display()))?;

    Ok(config)
}

pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let yaml = serde_yaml::to_string(&Config::default())
        .context("Failed to serialize default configuration")?;
    fs::write(&path, yaml)
        .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
data_dir: "/srv/trusteye"
link:
  shorteners: ["bit.ly", "rb.gy"]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.data_dir, "/srv/trusteye");
        assert_eq!(config.link.shorteners, vec!["bit.ly", "rb.gy"]);
        assert_eq!(config.link.trusted_domains.len(), 5);
        assert_eq!(config.graph.trusted_clusters.len(), 4);
        assert_eq!(config.text.phishing_keywords.len(), 14);
    }

    #[test]
    fn test_generate_and_reload_config() {
        let path = std::env::temp_dir().join(format!(
            "trusteye-config-{}-{}.yaml",
            std::process::id(),
            "generate"
        ));
        generate_default_config(&path).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.feedback_path, "data/feedback.json");
        assert_eq!(config.graph.trusted_score, 0.9);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        assert!(load_config("/nonexistent/trusteye.yaml").is_err());
    }

    #[test]
    fn test_logging_level_filter() {
        assert_eq!(LoggingConfig::default().level_filter(), Some(LevelFilter::Info));

        let config: Config = serde_yaml::from_str("logging:\n  level: DEBUG\n").unwrap();
        assert_eq!(config.logging.level_filter(), Some(LevelFilter::Debug));

        let config: Config = serde_yaml::from_str("logging:\n  level: chatty\n").unwrap();
        assert_eq!(config.logging.level_filter(), None);
    }
}
