//! Human-readable summaries of an analysis. Built from indicators and
//! verdicts only; nothing here feeds back into a score.

use crate::detection::FlatScan;
use crate::features::domain_graph::DomainAnalysis;
use crate::features::link_analyzer::UrlAnalysis;
use crate::features::Indicators;

const SEPARATOR: &str = " | ";

const TEXT_FLAGS: &[(&str, &str)] = &[
    ("has_urgency_words", "⚠️ Contains urgency language"),
    ("has_financial_terms", "💰 Mentions financial information"),
    ("has_action_requests", "👆 Requests immediate action"),
    ("has_links", "🔗 Contains suspicious links"),
    ("excessive_punctuation", "❗ Uses excessive punctuation"),
    ("has_caps_words", "🔠 Shouts in capital letters"),
];

const LINK_FLAGS: &[(&str, &str)] = &[
    ("is_shortened", "🔗 Uses URL shortener"),
    ("uses_ip_address", "🌐 Uses IP address instead of domain"),
    ("suspicious_tld", "🏷️ Suspicious domain extension"),
    ("unicode_characters", "🔤 Non-ASCII characters in host"),
    ("encoded_payload", "📦 Carries an encoded payload"),
];

fn flagged(indicators: &Indicators, table: &[(&str, &str)]) -> Vec<String> {
    table
        .iter()
        .filter(|(name, _)| indicators.get(name))
        .map(|(_, text)| text.to_string())
        .collect()
}

pub fn text_explanation(is_phishing: bool, indicators: &Indicators) -> String {
    let headline = if is_phishing {
        "🚨 This text shows signs of phishing."
    } else {
        "✅ This text appears legitimate."
    };

    std::iter::once(headline.to_string())
        .chain(flagged(indicators, TEXT_FLAGS))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

pub fn link_explanation(
    url: &UrlAnalysis,
    domain: Option<&DomainAnalysis>,
    is_suspicious: bool,
    redirect_chain: &[String],
) -> String {
    let mut parts = vec![if is_suspicious {
        "🚨 Suspicious URL detected".to_string()
    } else {
        "✅ URL appears safe".to_string()
    }];

    parts.extend(flagged(&url.indicators, LINK_FLAGS));

    if redirect_chain.len() > 1 {
        parts.push(format!(
            "↩️ {} URLs in simulated redirect chain",
            redirect_chain.len()
        ));
    }

    if let Some(domain) = domain {
        if domain.squatting_risk > 0.0 {
            parts.push(format!("🎭 {} resembles a trusted domain", domain.domain));
        }
        if domain.is_suspicious {
            parts.push("🕸️ Domain has suspicious relationships".to_string());
        }
    }

    parts.join(SEPARATOR)
}

/// Explanation for the point-based scans, listing each rule that fired
pub fn flat_explanation(subject: &str, scan: &FlatScan) -> String {
    let headline = if scan.is_phishing {
        format!("🚨 This {} shows signs of phishing ({} points)", subject, scan.score)
    } else {
        format!("✅ This {} appears legitimate ({} points)", subject, scan.score)
    };

    std::iter::once(headline)
        .chain(scan.reasons())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

pub fn message_recommendations(is_phishing: bool) -> Vec<String> {
    if is_phishing {
        vec![
            "Do not click any links in this message".to_string(),
            "Do not provide personal information".to_string(),
            "Verify sender through official channels".to_string(),
            "Report as phishing if received via email".to_string(),
        ]
    } else {
        vec!["Message appears safe, but always verify sender identity".to_string()]
    }
}

pub fn link_recommendations(
    url: &UrlAnalysis,
    domain: Option<&DomainAnalysis>,
    is_suspicious: bool,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if is_suspicious {
        recommendations.push("Do not open this link".to_string());
        recommendations.push("Do not enter credentials on the destination page".to_string());
    }

    if url.indicators.get("is_shortened") {
        recommendations.push("Expand the shortened link before visiting it".to_string());
    }

    if domain.is_some_and(|d| d.squatting_risk > 0.0) {
        recommendations.push("Type the official address yourself instead".to_string());
    }

    if recommendations.is_empty() {
        recommendations
            .push("Link appears safe, but check the address before signing in".to_string());
    }

    recommendations
}
