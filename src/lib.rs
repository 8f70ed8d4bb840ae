pub mod analyzer;
pub mod config;
pub mod dataset;
pub mod detection;
pub mod domain_utils;
pub mod explanation;
pub mod features;
pub mod feedback;
pub mod metrics;
pub mod risk;
pub mod url_resolver;

pub use analyzer::{InputKind, PhishingAnalyzer, RawInput, RiskAssessment, TextMode};
pub use config::Config;
pub use dataset::{Corpus, DatasetLoader};
pub use detection::flat_patterns::FlatVariant;
pub use detection::flat_url::FlatUrlVariant;
pub use features::domain_graph::DomainGraph;
pub use feedback::{FeedbackStore, UserJudgment};
pub use risk::{LegacyRiskLevel, RiskLevel, ScoreScale};
