//! robots.txt retrieval and parsing.

use crate::fetch::HttpFetcher;
use crate::url::SiteTarget;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// An `Allow` or `Disallow` line, tagged with the user agent group it appeared under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsRule {
    pub user_agent: Option<String>,
    pub rule: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotsReport {
    pub found: bool,
    pub content: String,
    pub disallow_rules: Vec<RobotsRule>,
    pub allow_rules: Vec<RobotsRule>,
    /// Seconds, fractions allowed
    pub crawl_delay: Option<f64>,
    pub sitemap_urls: Vec<String>,
    pub user_agents: Vec<String>,
}

impl RobotsReport {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn declares_sitemap(&self) -> bool {
        !self.sitemap_urls.is_empty()
    }

    /// Any `Disallow: /` line, regardless of user agent.
    pub fn blocks_entire_site(&self) -> bool {
        self.disallow_rules.iter().any(|r| r.rule == "/")
    }
}

/// Parse robots.txt text. Keys are case-insensitive; unknown keys are ignored.
pub fn parse_robots(text: &str) -> RobotsReport {
    let mut report = RobotsReport {
        found: true,
        content: text.to_string(),
        ..RobotsReport::default()
    };
    let mut current_agent: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "user-agent" => {
                if !report.user_agents.iter().any(|a| a == value) {
                    report.user_agents.push(value.to_string());
                }
                current_agent = Some(value.to_string());
            }
            "disallow" => report.disallow_rules.push(RobotsRule {
                user_agent: current_agent.clone(),
                rule: value.to_string(),
            }),
            "allow" => report.allow_rules.push(RobotsRule {
                user_agent: current_agent.clone(),
                rule: value.to_string(),
            }),
            "crawl-delay" => {
                if let Ok(delay) = value.parse::<f64>()
                    && delay.is_finite()
                    && delay >= 0.0
                {
                    report.crawl_delay = Some(delay);
                }
            }
            "sitemap" => {
                if !value.is_empty() {
                    report.sitemap_urls.push(value.to_string());
                }
            }
            _ => {}
        }
    }

    report
}

pub struct RobotsAnalyzer {
    http: HttpFetcher,
}

impl RobotsAnalyzer {
    pub fn new(http: HttpFetcher) -> Self {
        Self { http }
    }

    /// Fetch and parse `{base}/robots.txt`. Any failure yields `not_found()`.
    pub async fn analyze(&self, target: &SiteTarget) -> RobotsReport {
        let robots_url = target.join("robots.txt");
        match self.http.get_text(&robots_url).await {
            Ok(Some(body)) => {
                let report = parse_robots(&body);
                info!(
                    "robots.txt found: {} disallow, {} allow, {} sitemap(s)",
                    report.disallow_rules.len(),
                    report.allow_rules.len(),
                    report.sitemap_urls.len()
                );
                report
            }
            Ok(None) => {
                debug!("No robots.txt at {}", robots_url);
                RobotsReport::not_found()
            }
            Err(e) => {
                debug!("robots.txt fetch failed for {}: {}", robots_url, e);
                RobotsReport::not_found()
            }
        }
    }
}
