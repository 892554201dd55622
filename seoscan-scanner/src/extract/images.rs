use super::selector;
use crate::signals::ImageInfo;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img[src]"));

/// Substrings marking spacers, trackers and other non-content images.
const EXCLUDED_SRC_MARKERS: &[&str] = &[
    "spacer",
    "pixel",
    "blank",
    "transparent",
    "clear",
    "tracking",
    "analytics",
    "counter",
    "badge",
    "1x1",
    "invisible",
    "hidden",
];

/// Whether an image source looks like page content rather than decoration.
pub fn is_content_image(src: &str) -> bool {
    let src = src.to_lowercase();
    if src.is_empty() || EXCLUDED_SRC_MARKERS.iter().any(|m| src.contains(m)) {
        return false;
    }

    let vector_or_gif = src.contains(".svg") || src.contains(".gif");
    let decorative = ["icon", "logo", "bullet"].iter().any(|w| src.contains(w));
    !(vector_or_gif && decorative)
}

pub fn extract_images(document: &Html, page_url: Option<&Url>) -> Vec<ImageInfo> {
    document
        .select(&IMG)
        .filter_map(|img| {
            let src = img.value().attr("src")?.trim();
            if !is_content_image(src) {
                return None;
            }

            let absolute = page_url
                .and_then(|base| base.join(src).ok())
                .map(|u| u.to_string())
                .unwrap_or_else(|| src.to_string());

            let alt = img
                .value()
                .attr("alt")
                .filter(|alt| !alt.is_empty())
                .or_else(|| img.value().attr("title"))
                .unwrap_or_default()
                .to_string();

            Some(ImageInfo {
                src: absolute,
                has_alt: !alt.trim().is_empty(),
                alt,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_sources() {
        assert!(!is_content_image("/img/spacer.png"));
        assert!(!is_content_image("https://t.example/PIXEL.gif"));
        assert!(!is_content_image("/assets/icon-cart.svg"));
        assert!(!is_content_image("/assets/logo.gif"));
        assert!(!is_content_image(""));
        assert!(is_content_image("/assets/logo.png"));
        assert!(is_content_image("/assets/diagram.svg"));
        assert!(is_content_image("/photos/team.jpg"));
    }

    #[test]
    fn test_alt_and_title_fallback() {
        let html = Html::parse_document(
            r#"<body>
                <img src="a.jpg" alt="Alpha">
                <img src="b.jpg" title="Beta title">
                <img src="c.jpg" alt="   ">
                <img src="d.jpg">
                <img src="/tracking/1x1.gif">
                <img alt="no src">
            </body>"#,
        );
        let base = Url::parse("https://example.com/gallery/").unwrap();
        let images = extract_images(&html, Some(&base));

        assert_eq!(images.len(), 4);
        assert_eq!(images[0].src, "https://example.com/gallery/a.jpg");
        assert!(images[0].has_alt);
        assert_eq!(images[1].alt, "Beta title");
        assert!(images[1].has_alt);
        assert!(!images[2].has_alt);
        assert!(!images[3].has_alt);
    }
}
