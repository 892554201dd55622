use super::{char_len, element_text, meta::meta_content, selector};
use crate::signals::{Heading, HeadingSource, Headings};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static HEADING_TAGS: LazyLock<[Selector; 6]> = LazyLock::new(|| {
    [
        selector("h1"),
        selector("h2"),
        selector("h3"),
        selector("h4"),
        selector("h5"),
        selector("h6"),
    ]
});
static WIDGET_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".elementor-heading-title"));
static CMS_TITLE_CLASSES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    vec![
        selector(".page-title"),
        selector(".entry-title"),
        selector(".post-title"),
        selector(".main-title"),
    ]
});
static H2_CLASSES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    vec![
        selector(".h2"),
        selector(".heading-2"),
        selector(".subtitle"),
        selector(".section-title"),
    ]
});
static H3_CLASSES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    vec![
        selector(".h3"),
        selector(".heading-3"),
        selector(".subsection-title"),
    ]
});

/// Ancestor or attribute markers of navigation and layout chrome.
const NON_CONTENT_MARKERS: &[&str] = &[
    "header",
    "footer",
    "sidebar",
    "nav",
    "menu",
    "widget",
    "aside",
    "navigation",
];

/// Classes that theme builders put on repeated site-name headings.
const BRANDING_CLASSES: &[&str] = &[
    "site-title",
    "logo",
    "brand",
    "masthead",
    "entry-header-duplicate",
    "sticky-header",
];

const CONTEXT_ANCESTORS: usize = 5;

/// A way of finding heading text when the document's own tags are not enough.
pub trait HeadingStrategy: Send + Sync {
    fn source(&self) -> HeadingSource;

    /// Candidate texts in document order, already length-filtered.
    fn find(&self, document: &Html) -> Vec<String>;
}

fn within(text: &str, min: usize, max: usize) -> bool {
    let len = char_len(text);
    len > min && len < max
}

/// Page-builder heading widgets tagged with a heading level.
pub struct WidgetHeading {
    pub level: u8,
    pub min: usize,
    pub max: usize,
}

impl HeadingStrategy for WidgetHeading {
    fn source(&self) -> HeadingSource {
        HeadingSource::PageBuilderWidget
    }

    fn find(&self, document: &Html) -> Vec<String> {
        let level_class = format!("h{}", self.level);
        let level_attr = self.level.to_string();

        document
            .select(&WIDGET_TITLE)
            .filter(|widget| {
                let parent_mentions_level = widget
                    .parent()
                    .and_then(ElementRef::wrap)
                    .and_then(|parent| parent.value().attr("class"))
                    .is_some_and(|class| class.to_lowercase().contains(&level_class));
                parent_mentions_level
                    || widget.value().attr("data-level") == Some(level_attr.as_str())
            })
            .map(element_text)
            .filter(|text| within(text, self.min, self.max))
            .collect()
    }
}

/// Elements carrying one of a list of classes, selector order first.
pub struct ClassHeading {
    pub selectors: &'static [Selector],
    pub min: usize,
    pub max: usize,
    pub source: HeadingSource,
}

impl HeadingStrategy for ClassHeading {
    fn source(&self) -> HeadingSource {
        self.source
    }

    fn find(&self, document: &Html) -> Vec<String> {
        self.selectors
            .iter()
            .flat_map(|sel| document.select(sel).map(element_text))
            .filter(|text| within(text, self.min, self.max))
            .collect()
    }
}

/// `og:title` with any site-name suffix cut off.
pub struct OpenGraphTitle;

impl HeadingStrategy for OpenGraphTitle {
    fn source(&self) -> HeadingSource {
        HeadingSource::OpenGraph
    }

    fn find(&self, document: &Html) -> Vec<String> {
        let Some(content) = meta_content(document, "og:title") else {
            return Vec::new();
        };
        let title = content.split(" - ").next().unwrap_or_default().trim();
        let title = title.split(" | ").next().unwrap_or_default().trim();
        if within(title, 5, 150) {
            vec![title.to_string()]
        } else {
            Vec::new()
        }
    }
}

fn h1_fallbacks() -> Vec<Box<dyn HeadingStrategy>> {
    vec![
        Box::new(WidgetHeading {
            level: 1,
            min: 5,
            max: 300,
        }),
        Box::new(ClassHeading {
            selectors: &CMS_TITLE_CLASSES[..],
            min: 5,
            max: 300,
            source: HeadingSource::CmsTitleClass,
        }),
        Box::new(OpenGraphTitle),
    ]
}

fn supplements(level: u8) -> Vec<Box<dyn HeadingStrategy>> {
    let classes: &'static [Selector] = match level {
        2 => &H2_CLASSES[..],
        _ => &H3_CLASSES[..],
    };
    vec![
        Box::new(WidgetHeading {
            level,
            min: 3,
            max: 200,
        }),
        Box::new(ClassHeading {
            selectors: classes,
            min: 3,
            max: 200,
            source: HeadingSource::CssClass,
        }),
    ]
}

/// Decide whether an `<h1>` joins the accepted list, replacing the current one
/// when it is clearly more descriptive.
///
/// `context` is the lowercased class/id/tag context of the element and its
/// ancestors, `classes` the lowercased class attribute of the element itself.
pub fn admit_h1(accepted: &mut Vec<String>, text: &str, context: &str, classes: &str) -> bool {
    if accepted.iter().any(|existing| existing == text) {
        return false;
    }

    if NON_CONTENT_MARKERS.iter().any(|m| context.contains(m))
        || BRANDING_CLASSES.iter().any(|c| classes.contains(c))
    {
        if accepted.is_empty() {
            accepted.push(text.to_string());
            return true;
        }
        return false;
    }

    match accepted.len() {
        0 => {
            accepted.push(text.to_string());
            true
        }
        1 if char_len(text) > char_len(&accepted[0]) + 10 => {
            accepted[0] = text.to_string();
            true
        }
        _ => false,
    }
}

fn element_context(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    push_class_and_id(element, &mut parts);

    for ancestor in element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(CONTEXT_ANCESTORS)
    {
        parts.push(ancestor.value().name().to_string());
        push_class_and_id(ancestor, &mut parts);
    }

    parts.join(" ").to_lowercase()
}

fn push_class_and_id(element: ElementRef<'_>, parts: &mut Vec<String>) {
    if let Some(class) = element.value().attr("class") {
        parts.push(class.to_string());
    }
    if let Some(id) = element.value().attr("id") {
        parts.push(id.to_string());
    }
}

/// Heading outline of a document, with fallbacks for builders that style
/// headings without using heading tags.
pub fn extract_headings(document: &Html) -> Headings {
    let mut headings = Headings::default();

    let mut accepted_h1 = Vec::new();
    for h1 in document.select(&HEADING_TAGS[0]) {
        let text = element_text(h1);
        if text.is_empty() {
            continue;
        }
        let classes = h1.value().attr("class").unwrap_or_default().to_lowercase();
        admit_h1(&mut accepted_h1, &text, &element_context(h1), &classes);
    }
    headings.h1 = accepted_h1
        .into_iter()
        .map(|text| Heading::new(text, HeadingSource::Tag))
        .collect();

    for level in 2..=6u8 {
        let Some(list) = headings.level_mut(level) else {
            continue;
        };
        for element in document.select(&HEADING_TAGS[usize::from(level) - 1]) {
            let text = element_text(element);
            if !text.is_empty() && !list.iter().any(|h| h.text == text) {
                list.push(Heading::new(text, HeadingSource::Tag));
            }
        }
    }

    if headings.h1.is_empty()
        && let Some(heading) = h1_fallbacks().iter().find_map(|strategy| {
            strategy
                .find(document)
                .into_iter()
                .next()
                .map(|text| Heading::new(text, strategy.source()))
        })
    {
        headings.h1.push(heading);
    }

    if headings.h2.len() < 2 {
        supplement(&mut headings.h2, &supplements(2), document);
    }
    if headings.h3.len() < 3 {
        supplement(&mut headings.h3, &supplements(3), document);
    }

    headings
}

fn supplement(list: &mut Vec<Heading>, strategies: &[Box<dyn HeadingStrategy>], document: &Html) {
    for strategy in strategies {
        for text in strategy.find(document) {
            if !list.iter().any(|h| h.text == text) {
                list.push(Heading::new(text, strategy.source()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headings(html: &str) -> Headings {
        extract_headings(&Html::parse_document(html))
    }

    fn texts(list: &[Heading]) -> Vec<&str> {
        list.iter().map(|h| h.text.as_str()).collect()
    }

    // ============================================================================
    // h1 admission
    // ============================================================================

    #[test]
    fn test_admit_rejects_duplicates() {
        let mut accepted = vec!["Welcome".to_string()];
        assert!(!admit_h1(&mut accepted, "Welcome", "", ""));
        assert_eq!(accepted.len(), 1);
    }

    #[test]
    fn test_admit_non_content_only_when_first() {
        let mut accepted = Vec::new();
        assert!(admit_h1(&mut accepted, "Site Name", "site-header header", ""));
        assert!(!admit_h1(&mut accepted, "Footer Name", "footer", ""));
        assert_eq!(accepted, vec!["Site Name"]);
    }

    #[test]
    fn test_admit_branding_class_only_when_first() {
        let mut accepted = vec!["Article".to_string()];
        assert!(!admit_h1(
            &mut accepted,
            "A much longer branded heading text",
            "",
            "site-title"
        ));
    }

    #[test]
    fn test_admit_replaces_with_longer() {
        let mut accepted = vec!["Short".to_string()];
        assert!(!admit_h1(&mut accepted, "Short but +10", "", ""));
        assert!(admit_h1(&mut accepted, "A considerably longer heading", "", ""));
        assert_eq!(accepted, vec!["A considerably longer heading"]);
    }

    #[test]
    fn test_theme_header_h1_then_content_h1() {
        let h = headings(
            r#"<body>
                <header class="site-header"><h1 class="site-title">Brand</h1></header>
                <main><article><h1>The real article headline for this page</h1></article></main>
            </body>"#,
        );
        assert_eq!(texts(&h.h1), vec!["The real article headline for this page"]);
        assert_eq!(h.h1[0].source, HeadingSource::Tag);
    }

    #[test]
    fn test_two_content_h1_of_similar_length_keeps_first() {
        let h = headings("<main><h1>First title</h1><h1>Second one</h1></main>");
        assert_eq!(texts(&h.h1), vec!["First title"]);
    }

    // ============================================================================
    // Fallbacks
    // ============================================================================

    #[test]
    fn test_widget_h1_fallback() {
        let h = headings(
            r#"<div class="elementor-widget-heading size-h1">
                 <span class="elementor-heading-title">Elementor Landing Page</span>
               </div>"#,
        );
        assert_eq!(texts(&h.h1), vec!["Elementor Landing Page"]);
        assert_eq!(h.h1[0].source, HeadingSource::PageBuilderWidget);
        assert!(h.h1_from_fallback());
    }

    #[test]
    fn test_widget_data_level() {
        let h = headings(
            r#"<div><p class="elementor-heading-title" data-level="1">Data level heading</p></div>"#,
        );
        assert_eq!(h.h1[0].source, HeadingSource::PageBuilderWidget);
    }

    #[test]
    fn test_cms_class_fallback_respects_length() {
        let h = headings(
            r#"<div class="page-title">Tiny</div><div class="entry-title">Entry title text</div>"#,
        );
        assert_eq!(texts(&h.h1), vec!["Entry title text"]);
        assert_eq!(h.h1[0].source, HeadingSource::CmsTitleClass);
    }

    #[test]
    fn test_open_graph_fallback_strips_suffix() {
        let h = headings(
            r#"<head><meta property="og:title" content="Handmade Pottery - Shop | Brand"></head><body></body>"#,
        );
        assert_eq!(texts(&h.h1), vec!["Handmade Pottery"]);
        assert_eq!(h.h1[0].source, HeadingSource::OpenGraph);
    }

    #[test]
    fn test_no_fallback_when_h1_tag_present() {
        let h = headings(
            r#"<h1>Tag heading</h1><div class="entry-title">Entry title text</div>"#,
        );
        assert_eq!(texts(&h.h1), vec!["Tag heading"]);
        assert!(!h.h1_from_fallback());
    }

    #[test]
    fn test_h2_and_h3_supplements() {
        let h = headings(
            r#"<h2>Only one</h2><h2>Only one</h2>
               <div class="subtitle">Styled subtitle</div>
               <div class="size-h3"><span class="elementor-heading-title">Widget three</span></div>
               <span class="h3">x</span>"#,
        );
        assert_eq!(texts(&h.h2), vec!["Only one", "Styled subtitle"]);
        assert_eq!(h.h2[1].source, HeadingSource::CssClass);
        assert_eq!(texts(&h.h3), vec!["Widget three"]);
    }

    #[test]
    fn test_lower_levels_dedup() {
        let h = headings("<h4>A</h4><h4>A</h4><h5>B</h5><h6> </h6>");
        assert_eq!(texts(&h.h4), vec!["A"]);
        assert_eq!(texts(&h.h5), vec!["B"]);
        assert!(h.h6.is_empty());
    }
}
