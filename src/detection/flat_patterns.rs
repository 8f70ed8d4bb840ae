use super::{DetectionResult, FlatScan};
use crate::risk::LegacyThresholds;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub struct FlatPattern {
    pub name: &'static str,
    pub source: &'static str,
    regex: Regex,
}

impl FlatPattern {
    fn new(name: &'static str, source: &'static str) -> Self {
        Self {
            name,
            source,
            regex: Regex::new(source).unwrap(),
        }
    }

    /// Expects lowercased input
    pub fn is_match(&self, lower: &str) -> bool {
        self.regex.is_match(lower)
    }
}

lazy_static! {
    /// Fixed phishing sentence patterns. The 25-point variant uses the first
    /// four only.
    pub static ref PHISHING_PATTERNS: Vec<FlatPattern> = vec![
        FlatPattern::new("urgent_action_required", r"urgent.*action.*required"),
        FlatPattern::new("verify_account_immediately", r"verify.*account.*immediately"),
        FlatPattern::new("click_here_now", r"click.*here.*now"),
        FlatPattern::new("suspended_account", r"suspended.*account"),
        FlatPattern::new("confirm_identity", r"confirm.*identity"),
        FlatPattern::new("limited_time_offer", r"limited.*time.*offer"),
        FlatPattern::new("act_now_expire", r"act.*now.*expire"),
        FlatPattern::new("security_alert", r"security.*alert"),
    ];
}

const PHISHING_ABOVE: u32 = 40;

/// Point-per-pattern text scoring variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlatVariant {
    /// All eight patterns, 20 points each
    #[serde(rename = "flat-20")]
    Flat20,
    /// First four patterns, 25 points each
    #[serde(rename = "flat-25")]
    Flat25,
}

impl FlatVariant {
    pub fn points_per_pattern(self) -> u32 {
        match self {
            FlatVariant::Flat20 => 20,
            FlatVariant::Flat25 => 25,
        }
    }

    pub fn patterns(self) -> &'static [FlatPattern] {
        match self {
            FlatVariant::Flat20 => &PHISHING_PATTERNS[..],
            FlatVariant::Flat25 => &PHISHING_PATTERNS[..4],
        }
    }

    pub fn from_points(points: u32) -> Option<Self> {
        match points {
            20 => Some(FlatVariant::Flat20),
            25 => Some(FlatVariant::Flat25),
            _ => None,
        }
    }
}

/// Patterns among `patterns` that match the lowercased input
pub fn matching_patterns<'a>(
    patterns: &'a [FlatPattern],
    lower: &'a str,
) -> impl Iterator<Item = &'a FlatPattern> + 'a {
    patterns.iter().filter(move |pattern| pattern.is_match(lower))
}

pub fn scan_text(text: &str, variant: FlatVariant) -> FlatScan {
    let lower = text.to_lowercase();
    let points = variant.points_per_pattern();

    let hits: Vec<DetectionResult> = matching_patterns(variant.patterns(), &lower)
        .map(|pattern| {
            DetectionResult::hit(
                points,
                format!("Phishing pattern detected: {}", pattern.source),
                pattern.name,
            )
        })
        .collect();

    log::debug!(
        "Flat text scan ({:?}): {} pattern(s) matched",
        variant,
        hits.len()
    );

    FlatScan::from_hits(hits, PHISHING_ABOVE, LegacyThresholds::FLAT_TEXT)
}
