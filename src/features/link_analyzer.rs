use super::{FeatureExtractor, FeatureVector, Indicators};
use crate::config::LinkDetectionConfig;
use crate::dataset::LabeledUrl;
use crate::domain_utils::DomainUtils;
use crate::metrics::positional_differences;
use base64::engine::general_purpose;
use base64::Engine as _;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DOMAIN_SCORE: &str = "domain_score";
pub const STRUCTURE_SCORE: &str = "structure_score";
pub const REDIRECT_SCORE: &str = "redirect_score";
pub const OBFUSCATION_SCORE: &str = "obfuscation_score";

const WEIGHTS: &[(&str, f64)] = &[
    (DOMAIN_SCORE, 0.4),
    (STRUCTURE_SCORE, 0.25),
    (REDIRECT_SCORE, 0.2),
    (OBFUSCATION_SCORE, 0.15),
];

const SUSPICIOUS_THRESHOLD: f64 = 0.4;

/// Fixed landing page appended by the simulated redirect trace. No request is
/// ever made to produce it.
pub const SIMULATED_LANDING_PAGE: &str = "http://suspicious-site.com/malware";

/// Keywords behind the `has_suspicious_keywords` explanation flag
const INDICATOR_KEYWORDS: &[&str] = &["verify", "secure", "update"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlAnalysis {
    pub url: String,
    pub domain: String,
    pub is_suspicious: bool,
    pub confidence: f64,
    pub risk_score: f64,
    pub features: FeatureVector,
    pub indicators: Indicators,
}

/// Domain reputation, structure, simulated redirect and obfuscation scoring.
pub struct UrlFeatureExtractor {
    shorteners: Vec<String>,
    trusted_domains: Vec<String>,
    suspicious_tlds: Vec<String>,
    suspicious_keywords: Vec<String>,
    suspicious_extensions: Vec<String>,
    known_phishing_domains: HashSet<String>,
    known_safe_domains: HashSet<String>,
    encoded_run_regex: Regex,
    percent_byte_regex: Regex,
}

impl Default for UrlFeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlFeatureExtractor {
    pub fn new() -> Self {
        Self::from_config(&LinkDetectionConfig::default(), &[])
    }

    pub fn from_config(config: &LinkDetectionConfig, labeled_urls: &[LabeledUrl]) -> Self {
        let mut known_phishing_domains = HashSet::new();
        let mut known_safe_domains = HashSet::new();

        for item in labeled_urls {
            let host = DomainUtils::extract_host(&item.url);
            if host.is_empty() {
                continue;
            }
            if item.is_phishing() {
                known_phishing_domains.insert(host);
            } else {
                known_safe_domains.insert(host);
            }
        }

        log::debug!(
            "Link analyzer reputation lists: {} phishing, {} safe",
            known_phishing_domains.len(),
            known_safe_domains.len()
        );

        let lower = |items: &[String]| -> Vec<String> {
            items.iter().map(|s| s.to_lowercase()).collect()
        };

        Self {
            shorteners: lower(&config.shorteners),
            trusted_domains: lower(&config.trusted_domains),
            suspicious_tlds: lower(&config.suspicious_tlds),
            suspicious_keywords: lower(&config.suspicious_keywords),
            suspicious_extensions: lower(&config.suspicious_extensions),
            known_phishing_domains,
            known_safe_domains,
            encoded_run_regex: Regex::new(r"[A-Za-z0-9+/]{20,}={0,2}").unwrap(),
            percent_byte_regex: Regex::new(r"%[0-9A-Fa-f]{2}").unwrap(),
        }
    }

    pub fn analyze(&self, url: &str) -> UrlAnalysis {
        let domain = DomainUtils::extract_host(url);
        let features = self.extract(url);
        let risk_score = self.combine(&features);

        log::debug!(
            "URL analysis for {:?}: domain={:.3} structure={:.3} redirect={:.3} obfuscation={:.3} risk={:.3}",
            url,
            features.get(DOMAIN_SCORE),
            features.get(STRUCTURE_SCORE),
            features.get(REDIRECT_SCORE),
            features.get(OBFUSCATION_SCORE),
            risk_score
        );

        UrlAnalysis {
            url: url.to_string(),
            domain,
            is_suspicious: risk_score > SUSPICIOUS_THRESHOLD,
            confidence: risk_score,
            risk_score,
            indicators: self.indicators(url),
            features,
        }
    }

    pub fn is_shortener(&self, host: &str) -> bool {
        !host.is_empty() && self.shorteners.iter().any(|s| host.contains(s.as_str()))
    }

    fn has_suspicious_tld(&self, host: &str) -> bool {
        !host.is_empty() && self.suspicious_tlds.iter().any(|tld| host.ends_with(tld.as_str()))
    }

    fn label_count(host: &str) -> usize {
        host.split('.').count()
    }

    pub fn domain_score(&self, host: &str) -> f64 {
        if host.is_empty() {
            return 0.0;
        }

        let mut score: f64 = 0.0;

        if self.known_phishing_domains.contains(host) {
            score += 0.8;
        } else if self.known_safe_domains.contains(host)
            || self.trusted_domains.iter().any(|d| d == host)
        {
            score -= 0.3;
        }

        if self.is_shortener(host) {
            score += 0.6;
        }

        if self.has_suspicious_tld(host) {
            score += 0.4;
        }

        if DomainUtils::starts_with_dotted_quad(host) {
            score += 0.7;
        }

        if host.chars().count() > 50 {
            score += 0.2;
        }

        if Self::label_count(host) > 4 {
            score += 0.3;
        }

        score.clamp(0.0, 1.0)
    }

    pub fn structure_score(&self, url: &str) -> f64 {
        let url_lower = url.to_lowercase();
        let mut score = 0.0;

        let keyword_count = self
            .suspicious_keywords
            .iter()
            .filter(|k| url_lower.contains(k.as_str()))
            .count();
        score += keyword_count as f64 * 0.1;

        if url.matches('-').count() > 3 || url.matches('_').count() > 3 {
            score += 0.2;
        }

        if url.matches('%').count() > 3 {
            score += 0.3;
        }

        if url.chars().count() > 100 {
            score += 0.2;
        }

        if self
            .suspicious_extensions
            .iter()
            .any(|ext| url_lower.contains(ext.as_str()))
        {
            score += 0.5;
        }

        f64::min(score, 1.0)
    }

    /// Simulated: inferred from the URL text alone, no request is made.
    pub fn redirect_score(&self, url: &str, host: &str) -> f64 {
        let mut score = 0.0;

        if self.is_shortener(host) {
            score += 0.6;
        }

        if url.to_lowercase().contains("redirect") || url.contains("r=") || url.contains("url=") {
            score += 0.4;
        }

        f64::min(score, 1.0)
    }

    pub fn obfuscation_score(&self, url: &str, host: &str) -> f64 {
        let mut score = 0.0;

        if !host.is_ascii() {
            score += 0.5;
        }

        if DomainUtils::contains_dotted_quad(host) {
            score += 0.4;
        }

        if self.encoded_run_regex.is_match(url) || self.percent_byte_regex.is_match(url) {
            score += 0.3;
        }

        if self
            .trusted_domains
            .iter()
            .any(|trusted| Self::is_typosquatting(host, trusted))
        {
            score += 0.6;
        }

        f64::min(score, 1.0)
    }

    /// Same length as `trusted` with one or two substituted characters
    pub fn is_typosquatting(domain: &str, trusted: &str) -> bool {
        if domain.chars().count() != trusted.chars().count() {
            return false;
        }
        (1..=2).contains(&positional_differences(domain, trusted))
    }

    /// Stand-in for redirect following: the chain is the URL itself, plus a
    /// fixed synthetic landing page when the host is a shortener. This never
    /// touches the network; see `crate::url_resolver` for real resolution.
    pub fn trace_redirects(&self, url: &str) -> Vec<String> {
        let mut chain = vec![url.to_string()];
        if self.is_shortener(&DomainUtils::extract_host(url)) {
            chain.push(SIMULATED_LANDING_PAGE.to_string());
        }
        chain
    }

    /// A long base64-looking run that actually decodes
    fn has_decodable_payload(&self, url: &str) -> bool {
        self.encoded_run_regex.find_iter(url).any(|m| {
            let candidate = m.as_str();
            general_purpose::STANDARD.decode(candidate).is_ok()
                || general_purpose::STANDARD_NO_PAD.decode(candidate).is_ok()
        })
    }
}

impl FeatureExtractor for UrlFeatureExtractor {
    fn extract(&self, input: &str) -> FeatureVector {
        let host = DomainUtils::extract_host(input);
        FeatureVector::from_scores([
            (DOMAIN_SCORE, self.domain_score(&host)),
            (STRUCTURE_SCORE, self.structure_score(input)),
            (REDIRECT_SCORE, self.redirect_score(input, &host)),
            (OBFUSCATION_SCORE, self.obfuscation_score(input, &host)),
        ])
    }

    fn indicators(&self, input: &str) -> Indicators {
        let host = DomainUtils::extract_host(input);
        let url_lower = input.to_lowercase();

        Indicators::from_flags([
            ("is_shortened", self.is_shortener(&host)),
            ("uses_ip_address", DomainUtils::starts_with_dotted_quad(&host)),
            ("suspicious_tld", self.has_suspicious_tld(&host)),
            ("long_url", input.chars().count() > 100),
            (
                "excessive_subdomains",
                !host.is_empty() && Self::label_count(&host) > 4,
            ),
            (
                "has_suspicious_keywords",
                INDICATOR_KEYWORDS.iter().any(|k| url_lower.contains(k)),
            ),
            ("unicode_characters", !host.is_ascii()),
            ("url_encoding", input.matches('%').count() > 3),
            ("encoded_payload", self.has_decodable_payload(input)),
        ])
    }

    fn name(&self) -> &str {
        "url"
    }

    fn weights(&self) -> &'static [(&'static str, f64)] {
        WEIGHTS
    }
}
