//! HTML signal extraction.
//!
//! Everything here is synchronous and works on an already fetched body; the
//! favicon HEAD probe is left to the crawler.

mod headings;
mod images;
mod links;
mod meta;
mod text;

pub use headings::{
    ClassHeading, HeadingStrategy, OpenGraphTitle, WidgetHeading, admit_h1, extract_headings,
};
pub use images::{extract_images, is_content_image};
pub use links::{LinkCounts, count_links, discover_links};
pub use text::extract_text;

use crate::fetch::RawPage;
use crate::signals::PageSignals;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Parse a CSS selector known at compile time.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// Descendant text with whitespace runs collapsed to single spaces.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Extract every on-page signal from a fetched page.
///
/// Failed fetches yield a degraded record carrying only status, timing and error.
pub fn extract_signals(raw: &RawPage) -> PageSignals {
    if !raw.is_success() {
        return PageSignals::failed(raw);
    }

    let document = Html::parse_document(&raw.html);
    let page_url = Url::parse(&raw.url).ok();

    let meta = meta::extract_meta(&document);
    let links = page_url
        .as_ref()
        .map(|url| count_links(&document, url))
        .unwrap_or_default();
    let text_content = extract_text(&document);

    let signals = PageSignals {
        url: raw.url.clone(),
        status_code: raw.status_code,
        response_time: raw.elapsed.as_secs_f64(),
        title: meta.title,
        meta_description: meta.description,
        headings: extract_headings(&document),
        images: extract_images(&document, page_url.as_ref()),
        content_length: char_len(&text_content),
        text_content,
        internal_links: links.internal,
        external_links: links.external,
        canonical_url: meta.canonical,
        open_graph: meta.open_graph,
        twitter: meta.twitter,
        viewport: meta.viewport,
        has_favicon: meta.has_favicon_link,
        error: None,
    };

    debug!(
        "Extracted {}: {} h1, {} images, {} chars",
        signals.url,
        signals.headings.h1.len(),
        signals.images.len(),
        signals.content_length
    );
    signals
}
