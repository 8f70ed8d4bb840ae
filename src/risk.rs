use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared four-step risk level used by every analysis kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Level for a score on the `[0, 1]` scale
    pub fn from_fraction(score: f64) -> Self {
        if score >= 0.8 {
            RiskLevel::High
        } else if score >= 0.5 {
            RiskLevel::Medium
        } else if score >= 0.3 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }

    /// Level for a score on the `[0, 100]` scale. Cutoffs are the fractional
    /// ones multiplied by 100.
    pub fn from_percent(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::High
        } else if score >= 50.0 {
            RiskLevel::Medium
        } else if score >= 30.0 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Minimal => "MINIMAL",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        write!(f, "{}", label)
    }
}

/// Which scale a reported confidence is on. Full analyses report fractions,
/// flat scans and the e-mail scan report integer points capped at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScale {
    Fraction,
    Percent,
}

/// Three-step label reported by the point-based scans, with cutoffs that
/// differ per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegacyRiskLevel {
    Low,
    Medium,
    High,
}

/// Strict `>` cutoffs for [`LegacyRiskLevel`]. A scan without a medium
/// cutoff only ever reports High or Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyThresholds {
    pub high: u32,
    pub medium: Option<u32>,
}

impl LegacyThresholds {
    pub const FLAT_TEXT: Self = Self {
        high: 60,
        medium: Some(20),
    };
    pub const EXTENDED_URL: Self = Self {
        high: 50,
        medium: Some(20),
    };
    pub const MINIMAL_URL: Self = Self {
        high: 40,
        medium: None,
    };
    pub const EMAIL: Self = Self {
        high: 50,
        medium: Some(25),
    };

    pub fn label(&self, score: u32) -> LegacyRiskLevel {
        if score > self.high {
            LegacyRiskLevel::High
        } else if self.medium.is_some_and(|medium| score > medium) {
            LegacyRiskLevel::Medium
        } else {
            LegacyRiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedRisk {
    pub risk_score: f64,
    pub is_suspicious: bool,
    pub risk_level: RiskLevel,
}

/// Fuses URL and domain-graph results into one verdict.
pub struct RiskAggregator;

impl RiskAggregator {
    const URL_SUSPICIOUS_THRESHOLD: f64 = 0.5;

    /// Larger of the two risks; a missing domain analysis counts as zero
    pub fn combine_url(url_confidence: f64, domain_risk: Option<f64>) -> CombinedRisk {
        let risk_score = f64::max(url_confidence, domain_risk.unwrap_or(0.0));
        CombinedRisk {
            risk_score,
            is_suspicious: risk_score > Self::URL_SUSPICIOUS_THRESHOLD,
            risk_level: RiskLevel::from_fraction(risk_score),
        }
    }

    /// Points are capped at 100 before being reported as a confidence
    pub fn percent_confidence(points: u32) -> u32 {
        points.min(100)
    }
}
