use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref LEADING_DOTTED_QUAD: Regex = Regex::new(r"^\d+\.\d+\.\d+\.\d+").unwrap();
    static ref DOTTED_QUAD: Regex =
        Regex::new(r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}").unwrap();
}

/// Minimal domain hierarchy utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Extract domain from email address (everything after the last `@`)
    pub fn extract_domain(email: &str) -> Option<String> {
        email.rfind('@').map(|at| email[at + 1..].to_lowercase())
    }

    /// Host component of a URL, lowercased, or an empty string when the input
    /// is not an absolute URL with an authority.
    ///
    /// The host is the one the URL parser sees. Internationalized names keep
    /// their typed code points when the raw authority normalizes to that same
    /// host; otherwise the parsed form wins.
    pub fn extract_host(url: &str) -> String {
        let trimmed = url.trim();
        let parsed = match Url::parse(trimmed) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("Unparsable URL {:?}: {}", trimmed, e);
                return String::new();
            }
        };

        let Some(normalized) = parsed.host_str() else {
            return String::new();
        };

        let normalized = normalized.to_lowercase();
        match Self::raw_authority_host(trimmed) {
            Some(raw) if Self::normalizes_to(&raw, &normalized) => raw,
            Some(raw) => {
                log::debug!("Raw host {:?} disagrees with parsed host {:?}", raw, normalized);
                normalized
            }
            None => normalized,
        }
    }

    fn normalizes_to(raw: &str, normalized: &str) -> bool {
        Url::parse(&format!("http://{}/", raw))
            .ok()
            .and_then(|url| url.host_str().map(str::to_lowercase))
            .is_some_and(|host| host == normalized)
    }

    fn raw_authority_host(url: &str) -> Option<String> {
        let start = url.find("://")? + 3;
        let rest = &url[start..];
        let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let authority = &rest[..end];

        let host_port = match authority.rfind('@') {
            Some(at) => &authority[at + 1..],
            None => authority,
        };

        let host = if host_port.starts_with('[') {
            match host_port.find(']') {
                Some(close) => &host_port[..=close],
                None => host_port,
            }
        } else {
            match host_port.rfind(':') {
                Some(colon) if host_port[colon + 1..].chars().all(|c| c.is_ascii_digit()) => {
                    &host_port[..colon]
                }
                _ => host_port,
            }
        };

        if host.is_empty() {
            None
        } else {
            Some(host.to_lowercase())
        }
    }

    /// True when the host starts with a dotted quad such as `192.168.1.1`
    pub fn starts_with_dotted_quad(host: &str) -> bool {
        LEADING_DOTTED_QUAD.is_match(host)
    }

    /// True when a dotted quad appears anywhere in the input
    pub fn contains_dotted_quad(text: &str) -> bool {
        DOTTED_QUAD.is_match(text)
    }

    /// Domain name with its final dot-separated label removed
    pub fn strip_tld(domain: &str) -> String {
        let labels: Vec<&str> = domain.split('.').collect();
        labels[..labels.len() - 1].join(".")
    }

    /// Final dot-separated label, or an empty string for dotless names
    pub fn tld(domain: &str) -> &str {
        match domain.rfind('.') {
            Some(dot) => &domain[dot + 1..],
            None => "",
        }
    }
}
