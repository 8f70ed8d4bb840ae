pub mod domain_graph;
pub mod link_analyzer;
pub mod text_analyzer;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named sub-scores, each in `[0, 1]`. Built once per analysis.
///
/// Backed by an ordered map so serialized output is stable across calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    pub fn from_scores<'a>(scores: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self(
            scores
                .into_iter()
                .map(|(name, score)| (name.to_string(), score))
                .collect(),
        )
    }

    /// Score for `name`, or 0.0 when the feature is absent
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn weighted_sum(&self, weights: &[(&str, f64)]) -> f64 {
        weights.iter().map(|(name, w)| self.get(name) * w).sum()
    }
}

/// Boolean explanation flags. They drive explanation text only and never
/// feed into a score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Indicators(BTreeMap<String, bool>);

impl Indicators {
    pub fn from_flags<'a>(flags: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        Self(
            flags
                .into_iter()
                .map(|(name, flag)| (name.to_string(), flag))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Names of the flags that are set
    pub fn raised(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, flag)| *flag)
            .map(|(name, _)| name)
            .collect()
    }
}

pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, input: &str) -> FeatureVector;
    fn indicators(&self, input: &str) -> Indicators;
    fn name(&self) -> &str;

    /// Fusion weights over the names produced by `extract`; they sum to 1.0
    fn weights(&self) -> &'static [(&'static str, f64)];

    fn combine(&self, features: &FeatureVector) -> f64 {
        features.weighted_sum(self.weights())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_lookup_and_weighting() {
        let features = FeatureVector::from_scores([("a", 0.5), ("b", 1.0)]);
        assert_eq!(features.len(), 2);
        assert_eq!(features.get("a"), 0.5);
        assert_eq!(features.get("missing"), 0.0);
        assert!((features.weighted_sum(&[("a", 0.4), ("b", 0.6)]) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_feature_vector_serializes_in_name_order() {
        let features = FeatureVector::from_scores([("zeta", 0.1), ("alpha", 0.2)]);
        let json = serde_json::to_string(&features).unwrap();
        assert_eq!(json, r#"{"alpha":0.2,"zeta":0.1}"#);
    }

    #[test]
    fn test_indicators_raised() {
        let indicators = Indicators::from_flags([("has_links", true), ("long_url", false)]);
        assert!(indicators.get("has_links"));
        assert!(!indicators.get("unknown"));
        assert_eq!(indicators.raised(), vec!["has_links"]);
    }
}
