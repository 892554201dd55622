use super::selector;
use crate::url::{is_same_site, resolve_link, strip_query_and_fragment};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounts {
    pub internal: usize,
    pub external: usize,
}

fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

/// Count anchors pointing at the page's own host and absolute links to other hosts.
pub fn count_links(document: &Html, page_url: &Url) -> LinkCounts {
    let mut counts = LinkCounts::default();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() {
            continue;
        }

        if let Ok(resolved) = page_url.join(href)
            && same_host(&resolved, page_url)
        {
            counts.internal += 1;
        }

        if href.starts_with("http")
            && let Ok(absolute) = Url::parse(href)
            && !same_host(&absolute, page_url)
        {
            counts.external += 1;
        }
    }

    counts
}

/// Same-site page links found on a page, query and fragment removed, in
/// document order, at most `limit`.
pub fn discover_links(document: &Html, page_url: &Url, domain: &str, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR) {
        if links.len() >= limit {
            break;
        }
        let Some(resolved) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(page_url, href))
        else {
            continue;
        };
        if !is_same_site(&resolved, domain) {
            continue;
        }
        let clean = strip_query_and_fragment(&resolved).to_string();
        if seen.insert(clean.clone()) {
            links.push(clean);
        }
    }

    links
}
