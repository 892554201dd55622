//! Sitemap discovery and recursive expansion of sitemap indexes.

use crate::error::{Result, ScanError};
use crate::fetch::HttpFetcher;
use crate::url::SiteTarget;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Conventional sitemap locations probed relative to the base URL.
pub const SITEMAP_PROBE_PATHS: &[&str] = &[
    "sitemap.xml",
    "sitemap_index.xml",
    "sitemap_pages.xml",
    "sitemap_ecommerce.xml",
    "sitemap_blog.xml",
    "sitemap_posts.xml",
    "sitemap_categories.xml",
    "sitemap_products.xml",
];

static LOC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<loc[^>]*>\s*(.*?)\s*</loc>").expect("loc pattern must compile")
});

/// A `<loc>` value and whether it points at another sitemap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub url: String,
    pub is_index: bool,
}

impl SitemapEntry {
    pub fn classify(url: &str) -> Self {
        let is_index = url.ends_with(".xml") && url.to_lowercase().contains("sitemap");
        Self {
            url: url.to_string(),
            is_index,
        }
    }
}

/// True when a response body looks like a sitemap document.
pub fn looks_like_sitemap(body: &str) -> bool {
    let body = body.trim();
    let lower = body.to_lowercase();
    body.contains("<?xml") && (lower.contains("sitemap") || lower.contains("url>"))
}

/// Collect every element whose local name is `loc`, ignoring namespaces.
pub fn parse_locs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => {
                in_loc = true;
                current.clear();
            }
            Ok(Event::Text(e)) if in_loc => {
                let text = e
                    .unescape()
                    .map_err(|err| ScanError::ParseError(err.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::CData(e)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                in_loc = false;
                let value = current.trim();
                if !value.is_empty() {
                    locs.push(value.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ScanError::ParseError(format!(
                    "sitemap XML error at byte {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(locs)
}

/// Lenient `<loc>` scan for malformed documents. Keeps only `http…` values.
pub fn scan_locs(xml: &str) -> Vec<String> {
    LOC_PATTERN
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|loc| loc.starts_with("http"))
        .collect()
}

fn extract_locs(xml: &str, source: &str) -> Vec<String> {
    match parse_locs(xml) {
        Ok(locs) => locs,
        Err(e) => {
            debug!("Falling back to regex scan for {}: {}", source, e);
            scan_locs(xml)
        }
    }
}

pub struct SitemapResolver {
    http: HttpFetcher,
}

impl SitemapResolver {
    pub fn new(http: HttpFetcher) -> Self {
        Self { http }
    }

    /// Probe the conventional locations plus any `.xml` sitemaps named in robots.txt.
    pub async fn discover_sitemaps(
        &self,
        target: &SiteTarget,
        robots_sitemaps: &[String],
    ) -> Vec<String> {
        let mut candidates: Vec<String> = SITEMAP_PROBE_PATHS
            .iter()
            .map(|path| target.join(path))
            .collect();
        candidates.extend(
            robots_sitemaps
                .iter()
                .filter(|url| url.ends_with(".xml"))
                .cloned(),
        );

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for candidate in candidates {
            if !seen.insert(candidate.clone()) {
                continue;
            }
            match self.http.get_text(&candidate).await {
                Ok(Some(body)) if looks_like_sitemap(&body) => {
                    debug!("Sitemap found at {}", candidate);
                    found.push(candidate);
                }
                Ok(_) => debug!("No sitemap at {}", candidate),
                Err(e) => debug!("Sitemap probe of {} failed: {}", candidate, e),
            }
        }

        info!("Discovered {} sitemap(s)", found.len());
        found
    }

    /// Page URLs reachable from one sitemap, following nested indexes.
    ///
    /// `visited` is shared across the whole expansion so a sitemap is fetched at
    /// most once, which also ends cycles.
    pub async fn expand_sitemap(&self, url: &str, visited: &mut HashSet<String>) -> Vec<String> {
        if !visited.insert(url.to_string()) {
            debug!("Sitemap {} already expanded", url);
            return Vec::new();
        }

        let body = match self.http.get_text(url).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                debug!("Sitemap {} not available", url);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to fetch sitemap {}: {}", url, e);
                return Vec::new();
            }
        };

        let mut pages = Vec::new();
        for loc in extract_locs(&body, url) {
            let entry = SitemapEntry::classify(&loc);
            if entry.is_index {
                pages.extend(Box::pin(self.expand_sitemap(&entry.url, visited)).await);
            } else {
                pages.push(entry.url);
            }
        }
        pages
    }

    /// Expand every sitemap with one shared visited set, deduplicating page URLs.
    pub async fn expand_all(&self, sitemaps: &[String]) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut seen = HashSet::new();
        let mut pages = Vec::new();

        for sitemap in sitemaps {
            for page in self.expand_sitemap(sitemap, &mut visited).await {
                if seen.insert(page.clone()) {
                    pages.push(page);
                }
            }
        }

        info!(
            "Expanded {} sitemap(s) into {} page URL(s)",
            visited.len(),
            pages.len()
        );
        pages
    }
}
