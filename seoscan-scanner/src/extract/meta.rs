use super::selector;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META: LazyLock<Selector> = LazyLock::new(|| selector("meta"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("link[rel]"));

/// Minimum length for a description to be taken from a given tag.
const MIN_DESCRIPTION_CHARS: usize = 10;

#[derive(Debug, Default)]
pub(crate) struct MetaSignals {
    pub title: String,
    pub description: String,
    pub canonical: Option<String>,
    pub open_graph: BTreeMap<String, String>,
    pub twitter: BTreeMap<String, String>,
    pub viewport: Option<String>,
    pub has_favicon_link: bool,
}

pub(crate) fn extract_meta(document: &Html) -> MetaSignals {
    let title = document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let mut open_graph = BTreeMap::new();
    let mut twitter = BTreeMap::new();
    for meta in document.select(&META) {
        let Some(content) = meta.value().attr("content").filter(|c| !c.is_empty()) else {
            continue;
        };
        if let Some(property) = meta.value().attr("property")
            && property.starts_with("og:")
        {
            open_graph.insert(property.to_string(), content.to_string());
        }
        if let Some(name) = meta.value().attr("name")
            && name.starts_with("twitter:")
        {
            twitter.insert(name.to_string(), content.to_string());
        }
    }

    let description = ["description", "og:description", "twitter:description"]
        .iter()
        .filter_map(|key| meta_content(document, key))
        .find(|content| content.chars().count() > MIN_DESCRIPTION_CHARS)
        .unwrap_or_default();

    let viewport = meta_content(document, "viewport").filter(|v| !v.is_empty());

    let canonical = document
        .select(&LINK)
        .find(|link| has_rel_token(*link, |token| token == "canonical"))
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string);

    let has_favicon_link = document
        .select(&LINK)
        .any(|link| has_rel_token(link, |token| token.contains("icon")));

    MetaSignals {
        title,
        description,
        canonical,
        open_graph,
        twitter,
        viewport,
        has_favicon_link,
    }
}

/// Trimmed `content` of the first meta tag whose `name` (or `property` for
/// `og:` keys) matches `key`.
pub(crate) fn meta_content(document: &Html, key: &str) -> Option<String> {
    let attr = if key.starts_with("og:") {
        "property"
    } else {
        "name"
    };
    document
        .select(&META)
        .find(|meta| {
            meta.value()
                .attr(attr)
                .is_some_and(|value| value.eq_ignore_ascii_case(key))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
}

fn has_rel_token(link: ElementRef<'_>, predicate: impl Fn(&str) -> bool) -> bool {
    link.value().attr("rel").is_some_and(|rel| {
        rel.split_whitespace()
            .any(|token| predicate(&token.to_ascii_lowercase()))
    })
}
