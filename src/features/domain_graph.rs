use crate::config::DomainGraphConfig;
use crate::dataset::LabeledUrl;
use crate::domain_utils::DomainUtils;
use crate::metrics::{levenshtein_distance, positional_differences, shannon_entropy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

const SIMILARITY_THRESHOLD: f64 = 0.7;
const NEUTRAL_TRUST: f64 = 0.5;
const SQUATTING_TRUST_FLOOR: f64 = 0.8;
const SQUATTING_RISK: f64 = 0.8;
const SUSPICIOUS_RISK: f64 = 0.6;
const MAX_SIMILAR_REPORTED: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainFeatures {
    pub length: usize,
    pub subdomain_count: usize,
    pub has_numbers: bool,
    pub has_hyphens: bool,
    pub tld: String,
    pub vowel_ratio: f64,
    pub entropy: f64,
}

pub fn extract_domain_features(domain: &str) -> DomainFeatures {
    let length = domain.chars().count();
    let vowels = domain.chars().filter(|c| "aeiou".contains(*c)).count();

    DomainFeatures {
        length,
        subdomain_count: domain.split('.').count(),
        has_numbers: domain.chars().any(|c| c.is_ascii_digit()),
        has_hyphens: domain.contains('-'),
        tld: DomainUtils::tld(domain).to_string(),
        vowel_ratio: vowels as f64 / length.max(1) as f64,
        entropy: shannon_entropy(domain),
    }
}

/// Weighted agreement between two feature sets, in `[0, 1]`
pub fn feature_similarity(a: &DomainFeatures, b: &DomainFeatures) -> f64 {
    let mut similarity = 0.0;

    let length_diff = a.length.abs_diff(b.length) as f64;
    similarity += f64::max(0.0, 1.0 - length_diff / 20.0) * 0.2;

    if a.tld == b.tld {
        similarity += 0.3;
    }
    if a.subdomain_count == b.subdomain_count {
        similarity += 0.2;
    }
    if a.has_numbers == b.has_numbers {
        similarity += 0.1;
    }
    if a.has_hyphens == b.has_hyphens {
        similarity += 0.1;
    }

    let entropy_diff = (a.entropy - b.entropy).abs();
    similarity += f64::max(0.0, 1.0 - entropy_diff / 3.0) * 0.1;

    similarity
}

/// True when `candidate` reads like a typo of `trusted`, ignoring the final
/// label of both names.
pub fn is_potential_squatting(candidate: &str, trusted: &str) -> bool {
    let name1 = DomainUtils::strip_tld(candidate);
    let name2 = DomainUtils::strip_tld(trusted);
    let len1 = name1.chars().count();
    let len2 = name2.chars().count();

    if len1.abs_diff(len2) > 3 {
        return false;
    }

    if len1 == len2 {
        return (1..=2).contains(&positional_differences(&name1, &name2));
    }

    levenshtein_distance(&name1, &name2) <= 2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAnalysis {
    pub domain: String,
    pub trust_score: f64,
    pub risk_score: f64,
    pub is_suspicious: bool,
    pub similar_domains: Vec<String>,
    pub squatting_risk: f64,
    pub features: DomainFeatures,
    pub connected_domains: usize,
    pub cluster: String,
}

/// Static domain relationship graph: trusted clusters plus, when a URL
/// corpus is available, one cluster of known phishing hosts.
///
/// Never mutated once built. Reloading means building a fresh graph and
/// swapping it into a [`DomainGraphAnalyzer`].
#[derive(Debug, Clone, Default)]
pub struct DomainGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
    trust_scores: BTreeMap<String, f64>,
    node_features: BTreeMap<String, DomainFeatures>,
}

impl DomainGraph {
    pub fn from_config(config: &DomainGraphConfig, labeled_urls: &[LabeledUrl]) -> Self {
        let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut trust_scores = BTreeMap::new();

        for cluster in &config.trusted_clusters {
            let members: BTreeSet<String> = cluster.iter().map(|d| d.to_lowercase()).collect();
            for domain in &members {
                trust_scores.insert(domain.clone(), config.trusted_score);
                let mut neighbours = members.clone();
                neighbours.remove(domain);
                adjacency.insert(domain.clone(), neighbours);
            }
        }

        let phishing_hosts: BTreeSet<String> = labeled_urls
            .iter()
            .filter(|item| item.is_phishing())
            .map(|item| DomainUtils::extract_host(&item.url))
            .filter(|host| !host.is_empty())
            .collect();

        for host in &phishing_hosts {
            trust_scores.insert(host.clone(), config.phishing_score);
            let mut neighbours = phishing_hosts.clone();
            neighbours.remove(host);
            adjacency.insert(host.clone(), neighbours);
        }

        let node_features = adjacency
            .keys()
            .map(|domain| (domain.clone(), extract_domain_features(domain)))
            .collect();

        log::info!(
            "Domain graph built: {} nodes, {} phishing hosts",
            adjacency.len(),
            phishing_hosts.len()
        );

        Self {
            adjacency,
            trust_scores,
            node_features,
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn trust_score(&self, domain: &str) -> Option<f64> {
        self.trust_scores.get(domain).copied()
    }

    pub fn neighbours(&self, domain: &str) -> Option<&BTreeSet<String>> {
        self.adjacency.get(domain)
    }

    pub fn find_similar_domains(&self, target: &str, features: &DomainFeatures) -> BTreeSet<String> {
        self.node_features
            .iter()
            .filter(|(domain, _)| domain.as_str() != target)
            .filter(|(_, other)| feature_similarity(features, other) > SIMILARITY_THRESHOLD)
            .map(|(domain, _)| domain.clone())
            .collect()
    }

    pub fn trust_propagation(&self, target: &str, similar: &BTreeSet<String>) -> f64 {
        if let Some(trust) = self.trust_score(target) {
            return trust;
        }

        let known: Vec<f64> = similar.iter().filter_map(|d| self.trust_score(d)).collect();
        if known.is_empty() {
            return NEUTRAL_TRUST;
        }

        known.iter().sum::<f64>() / known.len() as f64
    }

    pub fn detect_squatting(&self, target: &str) -> f64 {
        let squats = self
            .trust_scores
            .iter()
            .filter(|(_, trust)| **trust > SQUATTING_TRUST_FLOOR)
            .any(|(trusted, _)| is_potential_squatting(target, trusted));

        if squats {
            SQUATTING_RISK
        } else {
            0.0
        }
    }

    fn cluster_label(&self, domain: &str) -> &'static str {
        match self.trust_score(domain) {
            Some(trust) if trust > 0.8 => "trusted_cluster",
            Some(trust) if trust < 0.3 => "suspicious_cluster",
            _ => "unknown_cluster",
        }
    }

    pub fn analyze(&self, target: &str) -> DomainAnalysis {
        let target = target.to_lowercase();
        let features = extract_domain_features(&target);
        let similar = self.find_similar_domains(&target, &features);
        let trust_score = self.trust_propagation(&target, &similar);
        let squatting_risk = self.detect_squatting(&target);

        let risk_score = f64::min(1.0, (1.0 - trust_score) + squatting_risk * 0.3);

        log::debug!(
            "Domain analysis for {:?}: trust={:.3} squatting={:.1} similar={} risk={:.3}",
            target,
            trust_score,
            squatting_risk,
            similar.len(),
            risk_score
        );

        DomainAnalysis {
            trust_score,
            risk_score,
            is_suspicious: risk_score > SUSPICIOUS_RISK,
            similar_domains: similar.into_iter().take(MAX_SIMILAR_REPORTED).collect(),
            squatting_risk,
            features,
            connected_domains: self.neighbours(&target).map_or(0, BTreeSet::len),
            cluster: self.cluster_label(&target).to_string(),
            domain: target,
        }
    }
}

/// Holds the current graph behind a lock so readers take a cheap snapshot
/// while a reload swaps in a freshly built instance.
pub struct DomainGraphAnalyzer {
    graph: RwLock<Arc<DomainGraph>>,
}

impl DomainGraphAnalyzer {
    pub fn new(graph: DomainGraph) -> Self {
        Self {
            graph: RwLock::new(Arc::new(graph)),
        }
    }

    pub fn snapshot(&self) -> Arc<DomainGraph> {
        let guard = self.graph.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace_graph(&self, graph: DomainGraph) {
        let mut guard = self.graph.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(graph);
        log::info!("Domain graph replaced ({} nodes)", guard.node_count());
    }

    pub fn analyze(&self, target: &str) -> DomainAnalysis {
        self.snapshot().analyze(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_graph() -> DomainGraph {
        DomainGraph::from_config(&DomainGraphConfig::default(), &[])
    }

    fn graph_with_phishing() -> DomainGraph {
        DomainGraph::from_config(
            &DomainGraphConfig::default(),
            &[
                LabeledUrl {
                    url: "http://paypa1-login.tk/verify".to_string(),
                    label: 1,
                },
                LabeledUrl {
                    url: "http://secure-update.ml/account".to_string(),
                    label: 1,
                },
                LabeledUrl {
                    url: "https://www.rust-lang.org/".to_string(),
                    label: 0,
                },
                LabeledUrl {
                    url: "not a url".to_string(),
                    label: 1,
                },
            ],
        )
    }

    #[test]
    fn test_domain_features() {
        let features = extract_domain_features("my-site1.example.com");
        assert_eq!(features.length, 20);
        assert_eq!(features.subdomain_count, 3);
        assert!(features.has_numbers);
        assert!(features.has_hyphens);
        assert_eq!(features.tld, "com");

        let empty = extract_domain_features("");
        assert_eq!(empty.vowel_ratio, 0.0);
        assert_eq!(empty.entropy, 0.0);
        assert_eq!(empty.tld, "");
    }

    #[test]
    fn test_feature_similarity_identical_is_one() {
        let a = extract_domain_features("google.com");
        assert!((feature_similarity(&a, &a) - 1.0).abs() < 1e-9);

        // Different TLD caps similarity at 0.7
        let b = extract_domain_features("google.org");
        assert!(feature_similarity(&a, &b) <= 0.7 + 1e-9);
    }

    #[test]
    fn test_trusted_cluster_member_trust() {
        let graph = default_graph();
        let analysis = graph.analyze("youtube.com");
        assert_eq!(analysis.trust_score, 0.9);
        assert_eq!(analysis.cluster, "trusted_cluster");
        assert_eq!(analysis.connected_domains, 3);
    }

    #[test]
    fn test_unknown_domain_gets_neutral_prior() {
        let graph = default_graph();
        let analysis = graph.analyze("totally-unknown-example.org");
        assert!(analysis.similar_domains.is_empty());
        assert_eq!(analysis.trust_score, 0.5);
        assert_eq!(analysis.squatting_risk, 0.0);
        assert_eq!(analysis.risk_score, 0.5);
        assert!(!analysis.is_suspicious);
        assert_eq!(analysis.cluster, "unknown_cluster");
        assert_eq!(analysis.connected_domains, 0);
    }

    #[test]
    fn test_squatting_detection() {
        assert!(is_potential_squatting("gooogle.com", "google.com"));
        assert!(is_potential_squatting("g00gle.com", "google.com"));
        assert!(!is_potential_squatting("google.com", "google.com"));
        assert!(!is_potential_squatting("totally-different.org", "google.com"));

        let graph = default_graph();
        assert_eq!(graph.detect_squatting("gooogle.com"), 0.8);
        assert_eq!(graph.detect_squatting("totally-different.org"), 0.0);
    }

    #[test]
    fn test_squatting_raises_risk() {
        let graph = default_graph();
        let analysis = graph.analyze("micros0ft.com");
        assert_eq!(analysis.squatting_risk, 0.8);
        assert!(analysis.similar_domains.len() <= MAX_SIMILAR_REPORTED);
        let expected = f64::min(1.0, 1.0 - analysis.trust_score + 0.24);
        assert!((analysis.risk_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_phishing_hosts_form_suspicious_cluster() {
        let graph = graph_with_phishing();
        assert_eq!(graph.node_count(), 15 + 2);
        assert_eq!(graph.trust_score("www.rust-lang.org"), None);

        let analysis = graph.analyze("paypa1-login.tk");
        assert_eq!(analysis.trust_score, 0.1);
        assert!((analysis.risk_score - 0.9).abs() < 1e-9);
        assert!(analysis.is_suspicious);
        assert_eq!(analysis.cluster, "suspicious_cluster");
        assert_eq!(analysis.connected_domains, 1);
    }

    #[test]
    fn test_analysis_is_case_insensitive() {
        let graph = default_graph();
        assert_eq!(graph.analyze("YouTube.com"), graph.analyze("youtube.com"));
    }

    #[test]
    fn test_replace_graph_swaps_snapshot() {
        let analyzer = DomainGraphAnalyzer::new(default_graph());
        let before = analyzer.snapshot();
        assert_eq!(analyzer.analyze("paypa1-login.tk").trust_score, 0.5);

        analyzer.replace_graph(graph_with_phishing());
        assert_eq!(analyzer.analyze("paypa1-login.tk").trust_score, 0.1);
        // Earlier snapshots are unaffected by the swap
        assert_eq!(before.trust_score("paypa1-login.tk"), None);
    }
}
