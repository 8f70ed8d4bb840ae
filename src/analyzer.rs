use crate::config::Config;
use crate::dataset::Corpus;
use crate::detection::email_scanner::scan_email;
use crate::detection::flat_patterns::{scan_text, FlatVariant};
use crate::detection::flat_url::{scan_url, FlatUrlVariant};
use crate::detection::FlatScan;
use crate::explanation;
use crate::features::domain_graph::{DomainAnalysis, DomainGraph, DomainGraphAnalyzer};
use crate::features::link_analyzer::{UrlAnalysis, UrlFeatureExtractor};
use crate::features::text_analyzer::TextFeatureExtractor;
use crate::features::{FeatureExtractor, FeatureVector, Indicators};
use crate::risk::{LegacyRiskLevel, RiskAggregator, RiskLevel, ScoreScale};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Url,
    Email,
}

/// A raw string and the pipeline it should go through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    pub text: String,
    pub kind: InputKind,
}

impl RawInput {
    pub fn new(text: impl Into<String>, kind: InputKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Weighted multi-feature analysis
    Full,
    /// Fixed-pattern point scoring
    Flat(FlatVariant),
}

/// Result of any analysis entry point.
///
/// `scale` says how to read `confidence`: full analyses are fractions in
/// `[0, 1]`, point-based scans are capped integers in `[0, 100]`.
/// `legacy_risk_level` is only present for point-based scans.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub kind: InputKind,
    pub mode: String,
    pub input: String,
    pub is_phishing: bool,
    pub confidence: f64,
    pub scale: ScoreScale,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_risk_level: Option<LegacyRiskLevel>,
    pub features: FeatureVector,
    pub indicators: Indicators,
    pub evidence: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_chain: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_analysis: Option<UrlAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_analysis: Option<DomainAnalysis>,
    pub explanation: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub extractors: Vec<String>,
    pub text_modes: Vec<&'static str>,
    pub url_modes: Vec<&'static str>,
    pub corpus_patterns: usize,
    pub graph_nodes: usize,
    /// Always false: scoring tables are fixed once loaded
    pub adaptive_learning: bool,
}

pub struct PhishingAnalyzer {
    text: TextFeatureExtractor,
    links: UrlFeatureExtractor,
    graph: DomainGraphAnalyzer,
}

impl Default for PhishingAnalyzer {
    fn default() -> Self {
        Self::from_config(&Config::default(), &Corpus::default())
    }
}

impl PhishingAnalyzer {
    pub fn new(text: TextFeatureExtractor, links: UrlFeatureExtractor, graph: DomainGraph) -> Self {
        Self {
            text,
            links,
            graph: DomainGraphAnalyzer::new(graph),
        }
    }

    pub fn from_config(config: &Config, corpus: &Corpus) -> Self {
        Self::new(
            TextFeatureExtractor::from_config(&config.text, corpus.phishing_texts()),
            UrlFeatureExtractor::from_config(&config.link, &corpus.urls),
            DomainGraph::from_config(&config.graph, &corpus.urls),
        )
    }

    /// Swap in a freshly built graph. In-flight analyses keep the snapshot
    /// they started with.
    pub fn replace_graph(&self, graph: DomainGraph) {
        self.graph.replace_graph(graph);
    }

    pub fn analyze(&self, input: &RawInput) -> RiskAssessment {
        match input.kind {
            InputKind::Text => self.analyze_text(&input.text, TextMode::Full),
            InputKind::Url => self.analyze_url(&input.text),
            InputKind::Email => self.analyze_email(&input.text),
        }
    }

    pub fn analyze_text(&self, input: &str, mode: TextMode) -> RiskAssessment {
        match mode {
            TextMode::Full => self.analyze_text_full(input),
            TextMode::Flat(variant) => {
                let scan = scan_text(input, variant);
                let mode = match variant {
                    FlatVariant::Flat20 => "flat-20",
                    FlatVariant::Flat25 => "flat-25",
                };
                let indicators = Self::rule_indicators(
                    variant.patterns().iter().map(|p| p.name),
                    &scan,
                );
                let recommendations = explanation::message_recommendations(scan.is_phishing);
                Self::flat_assessment(
                    InputKind::Text,
                    mode,
                    input,
                    scan,
                    indicators,
                    "text",
                    recommendations,
                )
            }
        }
    }

    fn analyze_text_full(&self, input: &str) -> RiskAssessment {
        let analysis = self.text.analyze(input);
        let evidence = analysis
            .indicators
            .raised()
            .into_iter()
            .map(str::to_string)
            .collect();

        RiskAssessment {
            kind: InputKind::Text,
            mode: "full".to_string(),
            input: input.to_string(),
            is_phishing: analysis.is_phishing,
            confidence: analysis.confidence,
            scale: ScoreScale::Fraction,
            risk_level: RiskLevel::from_fraction(analysis.confidence),
            legacy_risk_level: None,
            explanation: explanation::text_explanation(analysis.is_phishing, &analysis.indicators),
            recommendations: explanation::message_recommendations(analysis.is_phishing),
            features: analysis.features,
            indicators: analysis.indicators,
            evidence,
            redirect_chain: None,
            url_analysis: None,
            domain_analysis: None,
        }
    }

    /// URL features and domain graph fused by taking the larger risk. A URL
    /// without a usable host gets no domain analysis.
    pub fn analyze_url(&self, input: &str) -> RiskAssessment {
        let url_analysis = self.links.analyze(input);
        let domain_analysis = if url_analysis.domain.is_empty() {
            None
        } else {
            Some(self.graph.analyze(&url_analysis.domain))
        };

        let combined = RiskAggregator::combine_url(
            url_analysis.confidence,
            domain_analysis.as_ref().map(|d| d.risk_score),
        );
        let redirect_chain = self.links.trace_redirects(input);

        let mut evidence: Vec<String> = url_analysis
            .indicators
            .raised()
            .into_iter()
            .map(str::to_string)
            .collect();
        if let Some(domain) = &domain_analysis {
            if domain.squatting_risk > 0.0 {
                evidence.push("possible_typosquatting".to_string());
            }
            if domain.is_suspicious {
                evidence.push(domain.cluster.clone());
            }
        }

        let explanation = explanation::link_explanation(
            &url_analysis,
            domain_analysis.as_ref(),
            combined.is_suspicious,
            &redirect_chain,
        );
        let recommendations = explanation::link_recommendations(
            &url_analysis,
            domain_analysis.as_ref(),
            combined.is_suspicious,
        );

        RiskAssessment {
            kind: InputKind::Url,
            mode: "full".to_string(),
            input: input.to_string(),
            is_phishing: combined.is_suspicious,
            confidence: combined.risk_score,
            scale: ScoreScale::Fraction,
            risk_level: combined.risk_level,
            legacy_risk_level: None,
            features: url_analysis.features.clone(),
            indicators: url_analysis.indicators.clone(),
            evidence,
            redirect_chain: Some(redirect_chain),
            url_analysis: Some(url_analysis),
            domain_analysis,
            explanation,
            recommendations,
        }
    }

    pub fn analyze_url_flat(&self, input: &str, variant: FlatUrlVariant) -> RiskAssessment {
        let scan = scan_url(input, variant);
        let mode = match variant {
            FlatUrlVariant::Extended => "extended",
            FlatUrlVariant::Minimal => "minimal",
        };
        let indicators = Self::rule_indicators(
            scan.hits.iter().map(|hit| hit.rule_name.as_str()),
            &scan,
        );
        let recommendations = if scan.is_phishing {
            vec!["Do not open this link".to_string()]
        } else {
            vec!["Link appears safe, but check the address before signing in".to_string()]
        };
        Self::flat_assessment(
            InputKind::Url,
            mode,
            input,
            scan,
            indicators,
            "URL",
            recommendations,
        )
    }

    pub fn analyze_email(&self, input: &str) -> RiskAssessment {
        let scan = scan_email(input);
        let indicators = Self::rule_indicators(
            std::iter::once("suspicious_sender_domain")
                .chain(crate::detection::flat_patterns::PHISHING_PATTERNS.iter().map(|p| p.name)),
            &scan,
        );
        let recommendations = explanation::message_recommendations(scan.is_phishing);
        Self::flat_assessment(
            InputKind::Email,
            "flat",
            input,
            scan,
            indicators,
            "e-mail",
            recommendations,
        )
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            name: "trusteye",
            version: env!("CARGO_PKG_VERSION"),
            extractors: vec![self.text.name().to_string(), self.links.name().to_string()],
            text_modes: vec!["full", "flat-20", "flat-25"],
            url_modes: vec!["full", "extended", "minimal"],
            corpus_patterns: self.text.pattern_count(),
            graph_nodes: self.graph.snapshot().node_count(),
            adaptive_learning: false,
        }
    }

    /// One flag per rule the scan could have fired, set when it did
    fn rule_indicators<'a>(rules: impl Iterator<Item = &'a str>, scan: &FlatScan) -> Indicators {
        Indicators::from_flags(rules.map(|rule| {
            let fired = scan
                .hits
                .iter()
                .any(|hit| hit.matched && hit.rule_name == rule);
            (rule, fired)
        }))
    }

    fn flat_assessment(
        kind: InputKind,
        mode: &str,
        input: &str,
        scan: FlatScan,
        indicators: Indicators,
        subject: &str,
        recommendations: Vec<String>,
    ) -> RiskAssessment {
        let confidence = f64::from(scan.confidence);

        RiskAssessment {
            kind,
            mode: mode.to_string(),
            input: input.to_string(),
            is_phishing: scan.is_phishing,
            confidence,
            scale: ScoreScale::Percent,
            risk_level: RiskLevel::from_percent(confidence),
            legacy_risk_level: Some(scan.legacy_label),
            features: FeatureVector::default(),
            indicators,
            evidence: scan.reasons(),
            redirect_chain: None,
            url_analysis: None,
            domain_analysis: None,
            explanation: explanation::flat_explanation(subject, &scan),
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{LabeledText, LabeledUrl};
    use crate::features::link_analyzer::{DOMAIN_SCORE, REDIRECT_SCORE};
    use std::sync::Arc;

    const IOC: &str = "http://bit.ly/secure-bank-2024";

    fn corpus() -> Corpus {
        Corpus {
            emails: vec![LabeledText {
                text: "Your account has been suspended. Verify your account immediately".to_string(),
                label: 1,
            }],
            sms: vec![LabeledText {
                text: "URGENT: Your bank account has been compromised!!! Click here immediately to secure:"
                    .to_string(),
                label: 1,
            }],
            urls: vec![
                LabeledUrl {
                    url: IOC.to_string(),
                    label: 1,
                },
                LabeledUrl {
                    url: "https://www.rust-lang.org/".to_string(),
                    label: 0,
                },
            ],
        }
    }

    fn analyzer() -> PhishingAnalyzer {
        PhishingAnalyzer::from_config(&Config::default(), &corpus())
    }

    #[test]
    fn test_known_ioc_url_is_suspicious() {
        let assessment = analyzer().analyze_url(IOC);
        assert!(assessment.is_phishing);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.redirect_chain.as_ref().map(Vec::len), Some(2));
        assert_eq!(assessment.features.get(DOMAIN_SCORE), 1.0);
        assert_eq!(assessment.features.get(REDIRECT_SCORE), 0.6);

        let domain = assessment.domain_analysis.as_ref().unwrap();
        assert_eq!(domain.domain, "bit.ly");
        assert_eq!(domain.cluster, "suspicious_cluster");
        assert!((assessment.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_shortener_without_corpus_sits_on_boundary() {
        let assessment = PhishingAnalyzer::default().analyze_url(IOC);
        let url = assessment.url_analysis.as_ref().unwrap();
        assert!((url.confidence - 0.385).abs() < 1e-9);
        assert_eq!(assessment.features.get(DOMAIN_SCORE), 0.6);
        assert_eq!(assessment.features.get(REDIRECT_SCORE), 0.6);
        assert_eq!(assessment.redirect_chain.as_ref().map(Vec::len), Some(2));

        // Neutral domain trust gives exactly 0.5, which is not above 0.5
        assert_eq!(assessment.confidence, 0.5);
        assert!(!assessment.is_phishing);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_trusted_name_after_backslash_is_not_the_host() {
        let assessment = analyzer().analyze_url("http://evil.tk\\@google.com/login");
        let domain = assessment.domain_analysis.as_ref().unwrap();
        assert_eq!(domain.domain, "evil.tk");
        assert_eq!(domain.cluster, "unknown_cluster");
        assert_eq!(
            assessment.url_analysis.as_ref().map(|u| u.domain.as_str()),
            Some("evil.tk")
        );
    }

    #[test]
    fn test_malformed_url_degrades() {
        let assessment = analyzer().analyze_url("not a url");
        assert!(assessment.domain_analysis.is_none());
        assert_eq!(assessment.features.get(DOMAIN_SCORE), 0.0);
        assert!(!assessment.is_phishing);
        assert_eq!(assessment.risk_level, RiskLevel::Minimal);
        assert_eq!(assessment.redirect_chain, Some(vec!["not a url".to_string()]));
    }

    #[test]
    fn test_full_text_analysis() {
        let analyzer = analyzer();
        let assessment = analyzer.analyze_text(
            "URGENT: Your bank account has been compromised!!! Click here immediately to secure: http://bit.ly/secure-bank-2024",
            TextMode::Full,
        );
        assert_eq!(assessment.scale, ScoreScale::Fraction);
        assert!(assessment.is_phishing);
        assert_eq!(assessment.features.len(), 4);
        assert!(assessment.features.iter().all(|(_, v)| (0.0..=1.0).contains(&v)));
        assert!(assessment.explanation.starts_with("🚨"));
        assert_eq!(assessment.recommendations.len(), 4);

        let benign = analyzer.analyze_text("See you at lunch tomorrow", TextMode::Full);
        assert!(!benign.is_phishing);
        assert_eq!(benign.risk_level, RiskLevel::Minimal);
    }

    #[test]
    fn test_flat_text_modes_report_percent_scale() {
        let analyzer = analyzer();
        let text = "URGENT ACTION REQUIRED: verify your account immediately";

        let flat20 = analyzer.analyze_text(text, TextMode::Flat(FlatVariant::Flat20));
        assert_eq!(flat20.mode, "flat-20");
        assert_eq!(flat20.scale, ScoreScale::Percent);
        assert_eq!(flat20.confidence, 40.0);
        assert!(!flat20.is_phishing);
        assert_eq!(flat20.risk_level, RiskLevel::Low);
        assert_eq!(flat20.legacy_risk_level, Some(LegacyRiskLevel::Medium));
        assert_eq!(flat20.indicators.iter().count(), 8);
        assert!(flat20.indicators.get("urgent_action_required"));

        let flat25 = analyzer.analyze_text(text, TextMode::Flat(FlatVariant::Flat25));
        assert_eq!(flat25.confidence, 50.0);
        assert!(flat25.is_phishing);
        assert_eq!(flat25.risk_level, RiskLevel::Medium);
        assert_eq!(flat25.indicators.iter().count(), 4);
    }

    #[test]
    fn test_flat_url_modes() {
        let analyzer = analyzer();
        let extended = analyzer.analyze_url_flat(IOC, FlatUrlVariant::Extended);
        assert_eq!(extended.confidence, 55.0);
        assert!(extended.is_phishing);
        assert_eq!(extended.legacy_risk_level, Some(LegacyRiskLevel::High));
        assert!(extended.indicators.get("url_shortener"));

        let minimal = analyzer.analyze_url_flat("https://example.org", FlatUrlVariant::Minimal);
        assert_eq!(minimal.confidence, 0.0);
        assert_eq!(minimal.risk_level, RiskLevel::Minimal);
        assert_eq!(minimal.legacy_risk_level, Some(LegacyRiskLevel::Low));
    }

    #[test]
    fn test_email_analysis() {
        let assessment = analyzer().analyze_email("billing@fake-paypal.com");
        assert_eq!(assessment.kind, InputKind::Email);
        assert!(assessment.is_phishing);
        assert_eq!(assessment.confidence, 40.0);
        assert!(assessment.indicators.get("suspicious_sender_domain"));
        assert!(!assessment.indicators.get("security_alert"));
    }

    #[test]
    fn test_analyze_dispatches_on_kind() {
        let analyzer = analyzer();
        let url = analyzer.analyze(&RawInput::new(IOC, InputKind::Url));
        assert_eq!(url.kind, InputKind::Url);
        assert!(url.redirect_chain.is_some());

        let text = analyzer.analyze(&RawInput::new("hello", InputKind::Text));
        assert_eq!(text.mode, "full");

        let email = analyzer.analyze(&RawInput::new("a@b.com", InputKind::Email));
        assert_eq!(email.scale, ScoreScale::Percent);
    }

    #[test]
    fn test_empty_input_is_total() {
        let analyzer = analyzer();
        for kind in [InputKind::Text, InputKind::Url, InputKind::Email] {
            let assessment = analyzer.analyze(&RawInput::new("", kind));
            assert!(!assessment.is_phishing);
            assert!(assessment.features.iter().all(|(_, v)| v == 0.0));
        }
    }

    #[test]
    fn test_repeated_analysis_is_byte_identical() {
        let analyzer = analyzer();
        for input in [
            RawInput::new(IOC, InputKind::Url),
            RawInput::new("https://gooogle.com/login?url=x", InputKind::Url),
            RawInput::new("Security alert: confirm identity now!!!", InputKind::Text),
            RawInput::new("admin@temp-mail.org", InputKind::Email),
        ] {
            let first = serde_json::to_string(&analyzer.analyze(&input)).unwrap();
            let second = serde_json::to_string(&analyzer.analyze(&input)).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_concurrent_analysis_matches_sequential() {
        let analyzer = Arc::new(analyzer());
        let expected = serde_json::to_string(&analyzer.analyze_url(IOC)).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let analyzer = Arc::clone(&analyzer);
                std::thread::spawn(move || serde_json::to_string(&analyzer.analyze_url(IOC)).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_replace_graph_changes_domain_verdict() {
        let analyzer = PhishingAnalyzer::default();
        assert!(!analyzer.analyze_url(IOC).is_phishing);

        analyzer.replace_graph(DomainGraph::from_config(
            &Config::default().graph,
            &corpus().urls,
        ));
        let assessment = analyzer.analyze_url(IOC);
        assert!(assessment.is_phishing);
        assert_eq!(
            assessment.domain_analysis.map(|d| d.cluster),
            Some("suspicious_cluster".to_string())
        );
    }

    #[test]
    fn test_status_reports_static_learning_flag() {
        let analyzer = analyzer();
        let status = analyzer.status();
        assert!(!status.adaptive_learning);
        assert_eq!(status.corpus_patterns, 2);
        assert_eq!(status.graph_nodes, 16);
        assert_eq!(status.extractors, vec!["text", "url"]);
        assert_eq!(analyzer.text.name(), "text");
    }
}
