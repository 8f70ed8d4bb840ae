use super::{DetectionResult, FlatScan};
use crate::domain_utils::DomainUtils;
use crate::risk::LegacyThresholds;
use serde::{Deserialize, Serialize};

const SUSPICIOUS_DOMAINS: &[&str] = &["bit.ly", "tinyurl.com", "short.link", "suspicious-bank.com"];
const SHORTENER_MARKERS: &[&str] = &["bit.ly", "tinyurl", "t.co"];
const MINIMAL_SHORTENERS: &[&str] = &["bit.ly", "tinyurl.com"];

const PHISHING_ABOVE: u32 = 30;

/// Point-based URL scans. Both match against the raw URL text, not just the
/// host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlatUrlVariant {
    /// Suspicious domains, shortener markers and IP literals
    Extended,
    /// Two shorteners only
    Minimal,
}

pub fn scan_url(url: &str, variant: FlatUrlVariant) -> FlatScan {
    match variant {
        FlatUrlVariant::Extended => scan_extended(url),
        FlatUrlVariant::Minimal => scan_minimal(url),
    }
}

fn scan_extended(url: &str) -> FlatScan {
    let mut hits: Vec<DetectionResult> = SUSPICIOUS_DOMAINS
        .iter()
        .filter(|domain| url.contains(*domain))
        .map(|domain| {
            DetectionResult::hit(
                30,
                format!("Suspicious domain: {}", domain),
                "suspicious_domain",
            )
        })
        .collect();

    if SHORTENER_MARKERS.iter().any(|marker| url.contains(marker)) {
        hits.push(DetectionResult::hit(25, "URL shortener detected", "url_shortener"));
    }

    if DomainUtils::contains_dotted_quad(url) {
        hits.push(DetectionResult::hit(
            20,
            "IP address instead of domain",
            "ip_address",
        ));
    }

    FlatScan::from_hits(hits, PHISHING_ABOVE, LegacyThresholds::EXTENDED_URL)
}

fn scan_minimal(url: &str) -> FlatScan {
    let hits = if MINIMAL_SHORTENERS.iter().any(|s| url.contains(s)) {
        vec![DetectionResult::hit(50, "URL shortener detected", "url_shortener")]
    } else {
        Vec::new()
    };

    FlatScan::from_hits(hits, PHISHING_ABOVE, LegacyThresholds::MINIMAL_URL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::LegacyRiskLevel;

    #[test]
    fn test_extended_shortener_stacks() {
        let scan = scan_url("http://bit.ly/secure-bank-2024", FlatUrlVariant::Extended);
        assert_eq!(scan.score, 55);
        assert!(scan.is_phishing);
        assert_eq!(scan.legacy_label, LegacyRiskLevel::High);
        assert_eq!(
            scan.reasons(),
            vec!["Suspicious domain: bit.ly", "URL shortener detected"]
        );
    }

    #[test]
    fn test_extended_ip_only_is_not_phishing() {
        let scan = scan_url("http://192.168.1.1/login", FlatUrlVariant::Extended);
        assert_eq!(scan.score, 20);
        assert!(!scan.is_phishing);
        assert_eq!(scan.legacy_label, LegacyRiskLevel::Low);
    }

    #[test]
    fn test_extended_tco_marker_matches_substring() {
        // "t.co" appears inside "microsoft.com"
        let scan = scan_url("https://microsoft.com/", FlatUrlVariant::Extended);
        assert_eq!(scan.score, 25);
        assert!(!scan.is_phishing);
        assert_eq!(scan.legacy_label, LegacyRiskLevel::Medium);
    }

    #[test]
    fn test_minimal_variant() {
        let scan = scan_url("https://tinyurl.com/abc", FlatUrlVariant::Minimal);
        assert_eq!(scan.score, 50);
        assert!(scan.is_phishing);
        assert_eq!(scan.legacy_label, LegacyRiskLevel::High);

        let scan = scan_url("https://t.co/abc", FlatUrlVariant::Minimal);
        assert_eq!(scan.score, 0);
        assert!(!scan.is_phishing);
        assert_eq!(scan.legacy_label, LegacyRiskLevel::Low);
    }
}
