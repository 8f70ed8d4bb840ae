use crate::config::ResolverConfig;
use anyhow::{Context, Result};
use reqwest::header::LOCATION;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Redirect chain observed over the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedChain {
    /// Every URL visited, starting with the input
    pub hops: Vec<String>,
    pub final_url: String,
    /// True when the redirect cap stopped the walk
    pub truncated: bool,
}

/// Follows redirects for real. The scoring pipeline never calls this; it is
/// reported next to the simulated chain when explicitly requested.
pub struct UrlResolver {
    client: Client,
    max_redirects: u8,
}

impl UrlResolver {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }

    /// Walk `Location` headers with HEAD requests until a non-redirect
    /// response or the redirect cap.
    pub async fn resolve_chain(&self, url: &str) -> Result<ResolvedChain> {
        let mut current = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
        let mut hops = vec![current.to_string()];
        let mut truncated = false;

        loop {
            let response = self
                .client
                .head(current.clone())
                .send()
                .await
                .with_context(|| format!("Request failed: {}", current))?;

            if !response.status().is_redirection() {
                break;
            }

            let Some(location) = response.headers().get(LOCATION) else {
                log::debug!("Redirect from {} without Location header", current);
                break;
            };

            if hops.len() > usize::from(self.max_redirects) {
                truncated = true;
                break;
            }

            let location = location
                .to_str()
                .with_context(|| format!("Non-text Location header from {}", current))?;
            current = next_hop(&current, location)?;
            log::debug!("Redirect -> {}", current);
            hops.push(current.to_string());
        }

        Ok(ResolvedChain {
            final_url: current.to_string(),
            hops,
            truncated,
        })
    }
}

/// Absolute `Location` values replace the URL; relative ones are joined
fn next_hop(base: &Url, location: &str) -> Result<Url> {
    base.join(location)
        .with_context(|| format!("Invalid redirect target {:?} from {}", location, base))
}
