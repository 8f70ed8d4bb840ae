pub mod email_scanner;
pub mod flat_patterns;
pub mod flat_url;

use crate::risk::{LegacyRiskLevel, LegacyThresholds, RiskAggregator};
use serde::{Deserialize, Serialize};

/// One rule hit from a point-based scan. `confidence` is the points the rule
/// contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub matched: bool,
    pub confidence: u32,
    pub reason: String,
    pub rule_name: String,
}

impl DetectionResult {
    pub fn new(matched: bool, confidence: u32, reason: String, rule_name: String) -> Self {
        Self {
            matched,
            confidence,
            reason,
            rule_name,
        }
    }

    pub fn hit(points: u32, reason: impl Into<String>, rule_name: impl Into<String>) -> Self {
        Self::new(true, points, reason.into(), rule_name.into())
    }

    pub fn no_match(rule_name: String) -> Self {
        Self {
            matched: false,
            confidence: 0,
            reason: "No match".to_string(),
            rule_name,
        }
    }
}

/// Outcome of a point-based scan on the 0–100 scale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatScan {
    /// Raw point total, which may exceed 100
    pub score: u32,
    pub is_phishing: bool,
    pub confidence: u32,
    pub legacy_label: LegacyRiskLevel,
    pub hits: Vec<DetectionResult>,
}

impl FlatScan {
    pub(crate) fn from_hits(
        hits: Vec<DetectionResult>,
        phishing_above: u32,
        labels: LegacyThresholds,
    ) -> Self {
        let score = hits
            .iter()
            .filter(|hit| hit.matched)
            .map(|hit| hit.confidence)
            .sum();

        Self {
            score,
            is_phishing: score > phishing_above,
            confidence: RiskAggregator::percent_confidence(score),
            legacy_label: labels.label(score),
            hits,
        }
    }

    pub fn reasons(&self) -> Vec<String> {
        self.hits
            .iter()
            .filter(|hit| hit.matched)
            .map(|hit| hit.reason.clone())
            .collect()
    }
}
