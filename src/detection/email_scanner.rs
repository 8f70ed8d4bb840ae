use super::flat_patterns::{matching_patterns, PHISHING_PATTERNS};
use super::{DetectionResult, FlatScan};
use crate::domain_utils::DomainUtils;
use crate::risk::LegacyThresholds;

const SUSPICIOUS_DOMAIN_MARKERS: &[&str] = &["temp", "fake", "phish"];
const SUSPICIOUS_DOMAIN_POINTS: u32 = 40;
const PATTERN_POINTS: u32 = 15;
const PHISHING_ABOVE: u32 = 25;

/// Scans an e-mail address or message. The sender domain is whatever follows
/// the last `@`, so a full message is scanned the same way.
pub fn scan_email(input: &str) -> FlatScan {
    let lower = input.to_lowercase();
    let mut hits = Vec::new();

    if let Some(domain) = DomainUtils::extract_domain(&lower) {
        if SUSPICIOUS_DOMAIN_MARKERS.iter().any(|m| domain.contains(m)) {
            hits.push(DetectionResult::hit(
                SUSPICIOUS_DOMAIN_POINTS,
                format!("Suspicious sender domain: {}", domain),
                "suspicious_sender_domain",
            ));
        }
    }

    hits.extend(matching_patterns(&PHISHING_PATTERNS, &lower).map(|pattern| {
        DetectionResult::hit(
            PATTERN_POINTS,
            format!("Phishing pattern detected: {}", pattern.source),
            pattern.name,
        )
    }));

    log::debug!("E-mail scan: {} finding(s)", hits.len());

    FlatScan::from_hits(hits, PHISHING_ABOVE, LegacyThresholds::EMAIL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::LegacyRiskLevel;

    #[test]
    fn test_suspicious_sender_domain() {
        let scan = scan_email("support@temp-mail.org");
        assert_eq!(scan.score, 40);
        assert!(scan.is_phishing);
        assert_eq!(scan.legacy_label, LegacyRiskLevel::Medium);
    }

    #[test]
    fn test_clean_address() {
        let scan = scan_email("alice@example.com");
        assert_eq!(scan.score, 0);
        assert!(!scan.is_phishing);
        assert_eq!(scan.legacy_label, LegacyRiskLevel::Low);
    }

    #[test]
    fn test_patterns_without_domain() {
        // Two patterns at 15 points each cross the 25 point threshold
        let scan = scan_email("Security alert: confirm your identity");
        assert_eq!(scan.score, 30);
        assert!(scan.is_phishing);

        let scan = scan_email("security alert");
        assert_eq!(scan.score, 15);
        assert!(!scan.is_phishing);
    }

    #[test]
    fn test_domain_and_patterns_combine() {
        let scan = scan_email("URGENT ACTION REQUIRED, reply to admin@phish.example");
        assert_eq!(scan.score, 55);
        assert_eq!(scan.legacy_label, LegacyRiskLevel::High);
    }

    #[test]
    fn test_domain_taken_after_last_at() {
        let scan = scan_email("fake@legit@example.com");
        assert_eq!(scan.score, 0);
    }
}
