use super::{char_len, collapse_whitespace, selector};
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

static MAIN_CONTENT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    vec![
        selector("main"),
        selector("article"),
        selector("[role=main]"),
        selector("#main-content"),
        selector(".main-content"),
        selector("#content"),
        selector(".entry-content"),
        selector(".post-content"),
    ]
});
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));

const MAIN_CONTENT_SKIP: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form",
];
const BODY_SKIP: &[&str] = &["script", "style", "nav", "header", "footer"];

/// Elements after which a word boundary is implied.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "br", "h1", "h2", "h3", "h4", "h5", "h6", "td", "th", "tr", "section",
    "article", "main", "ul", "ol", "blockquote",
];

const MIN_MAIN_CONTENT_CHARS: usize = 50;

fn collect_text(element: ElementRef<'_>, skip: &[&str], out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if skip.contains(&name) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push(' ');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, skip, out);
                }
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn text_of(element: ElementRef<'_>, skip: &[&str]) -> String {
    let mut out = String::new();
    collect_text(element, skip, &mut out);
    collapse_whitespace(&out)
}

/// Readable text of a page with navigation and boilerplate removed.
///
/// Uses the first main-content container when it holds enough text, the whole
/// body otherwise.
pub fn extract_text(document: &Html) -> String {
    let main = MAIN_CONTENT
        .iter()
        .find_map(|sel| document.select(sel).next())
        .map(|container| text_of(container, MAIN_CONTENT_SKIP))
        .filter(|text| char_len(text) >= MIN_MAIN_CONTENT_CHARS);

    if let Some(text) = main {
        return text;
    }

    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    text_of(root, BODY_SKIP)
}
