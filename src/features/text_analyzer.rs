use super::{FeatureExtractor, FeatureVector, Indicators};
use crate::config::TextDetectionConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const KEYWORD_SCORE: &str = "keyword_score";
pub const PATTERN_SCORE: &str = "pattern_score";
pub const LINGUISTIC_SCORE: &str = "linguistic_score";
pub const SENTIMENT_SCORE: &str = "sentiment_score";

const WEIGHTS: &[(&str, f64)] = &[
    (KEYWORD_SCORE, 0.3),
    (PATTERN_SCORE, 0.25),
    (LINGUISTIC_SCORE, 0.25),
    (SENTIMENT_SCORE, 0.2),
];

const PHISHING_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub is_phishing: bool,
    pub confidence: f64,
    pub risk_score: f64,
    pub features: FeatureVector,
    pub indicators: Indicators,
}

/// Keyword, corpus-similarity, linguistic and sentiment scoring over free text.
pub struct TextFeatureExtractor {
    phishing_keywords: Vec<String>,
    urgency_words: Vec<String>,
    financial_words: Vec<String>,
    action_words: Vec<String>,
    common_misspellings: Vec<String>,
    fear_words: Vec<String>,
    urgency_phrases: Vec<String>,
    /// Lowercased phishing samples from the text corpora
    phishing_patterns: Vec<String>,
    link_regex: Regex,
}

impl Default for TextFeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn lowercased(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

fn count_present(text: &str, terms: &[String]) -> usize {
    terms.iter().filter(|term| text.contains(term.as_str())).count()
}

/// At least one cased character, and every cased character is uppercase
fn is_upper_word(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

fn is_caps_word(word: &str) -> bool {
    is_upper_word(word) && word.chars().count() > 2
}

impl TextFeatureExtractor {
    pub fn new() -> Self {
        Self::from_config(&TextDetectionConfig::default(), Vec::new())
    }

    pub fn from_config(config: &TextDetectionConfig, phishing_patterns: Vec<String>) -> Self {
        Self {
            phishing_keywords: lowercased(&config.phishing_keywords),
            urgency_words: lowercased(&config.urgency_words),
            financial_words: lowercased(&config.financial_words),
            action_words: lowercased(&config.action_words),
            common_misspellings: lowercased(&config.common_misspellings),
            fear_words: lowercased(&config.fear_words),
            urgency_phrases: lowercased(&config.urgency_phrases),
            phishing_patterns: phishing_patterns
                .into_iter()
                .map(|p| p.to_lowercase())
                .collect(),
            link_regex: Regex::new(r"https?://|www\.").unwrap(),
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.phishing_patterns.len()
    }

    pub fn analyze(&self, text: &str) -> TextAnalysis {
        let features = self.extract(text);
        let risk_score = self.combine(&features);

        log::debug!(
            "Text analysis: keyword={:.3} pattern={:.3} linguistic={:.3} sentiment={:.3} risk={:.3}",
            features.get(KEYWORD_SCORE),
            features.get(PATTERN_SCORE),
            features.get(LINGUISTIC_SCORE),
            features.get(SENTIMENT_SCORE),
            risk_score
        );

        TextAnalysis {
            is_phishing: risk_score > PHISHING_THRESHOLD,
            confidence: risk_score.min(1.0),
            risk_score,
            indicators: self.indicators(text),
            features,
        }
    }

    pub fn keyword_score(&self, text_lower: &str) -> f64 {
        let keyword_count = count_present(text_lower, &self.phishing_keywords) as f64;
        let urgency_count = count_present(text_lower, &self.urgency_words) as f64;
        let financial_count = count_present(text_lower, &self.financial_words) as f64;
        let action_count = count_present(text_lower, &self.action_words) as f64;

        let total =
            keyword_count + urgency_count * 1.5 + financial_count * 1.2 + action_count * 1.1;

        (total / 10.0).min(1.0)
    }

    /// Best word-overlap ratio against any phishing sample, measured against
    /// the sample's own vocabulary.
    pub fn pattern_score(&self, text_lower: &str) -> f64 {
        if self.phishing_patterns.is_empty() {
            return 0.0;
        }

        let text_words: HashSet<&str> = text_lower.split_whitespace().collect();
        let mut best: f64 = 0.0;

        for pattern in &self.phishing_patterns {
            let pattern_words: HashSet<&str> = pattern.split_whitespace().collect();
            if pattern_words.is_empty() {
                continue;
            }
            let shared = text_words.intersection(&pattern_words).count();
            best = best.max(shared as f64 / pattern_words.len() as f64);
        }

        best
    }

    /// Punctuation, capitalization, links and misspellings. Takes the text in
    /// its original case.
    pub fn linguistic_score(&self, text: &str) -> f64 {
        let mut score = 0.0;

        if text.matches('!').count() > 2 {
            score += 0.2;
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let caps_words = words.iter().filter(|w| is_caps_word(w)).count();
        score += caps_words as f64 / words.len().max(1) as f64 * 0.3;

        if self.link_regex.is_match(text) {
            score += 0.2;
        }

        let text_lower = text.to_lowercase();
        if count_present(&text_lower, &self.common_misspellings) > 0 {
            score += 0.1;
        }

        score.min(1.0)
    }

    pub fn sentiment_score(&self, text_lower: &str) -> f64 {
        let fear = count_present(text_lower, &self.fear_words) as f64 * 0.15;
        let urgency = count_present(text_lower, &self.urgency_phrases) as f64 * 0.2;
        (fear + urgency).min(1.0)
    }
}

impl FeatureExtractor for TextFeatureExtractor {
    fn extract(&self, input: &str) -> FeatureVector {
        let text_lower = input.to_lowercase();
        FeatureVector::from_scores([
            (KEYWORD_SCORE, self.keyword_score(&text_lower)),
            (PATTERN_SCORE, self.pattern_score(&text_lower)),
            (LINGUISTIC_SCORE, self.linguistic_score(input)),
            (SENTIMENT_SCORE, self.sentiment_score(&text_lower)),
        ])
    }

    fn indicators(&self, input: &str) -> Indicators {
        let text_lower = input.to_lowercase();
        Indicators::from_flags([
            (
                "has_urgency_words",
                count_present(&text_lower, &self.urgency_words) > 0,
            ),
            (
                "has_financial_terms",
                count_present(&text_lower, &self.financial_words) > 0,
            ),
            (
                "has_action_requests",
                count_present(&text_lower, &self.action_words) > 0,
            ),
            ("has_links", self.link_regex.is_match(input)),
            ("excessive_punctuation", input.matches('!').count() > 2),
            ("has_caps_words", input.split_whitespace().any(is_caps_word)),
        ])
    }

    fn name(&self) -> &str {
        "text"
    }

    fn weights(&self) -> &'static [(&'static str, f64)] {
        WEIGHTS
    }
}
