use super::{CategoryResult, below_share, ratio_score};
use regex::Regex;
use seoscan_scanner::{PageSignals, RobotsReport};
use std::sync::LazyLock;
use std::time::Duration;

static VIEWPORT_WIDTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"width=(\d+)").expect("valid viewport width pattern"));

/// Viewport widths at or above this usually belong to a desktop layout with a
/// separate mobile site.
const DESKTOP_VIEWPORT_WIDTH: u32 = 768;

pub fn score_response_times(pages: &[PageSignals], threshold: Duration) -> CategoryResult {
    if pages.is_empty() {
        return CategoryResult::default();
    }

    let limit = threshold.as_secs_f64();
    let mut result = CategoryResult::default();
    let mut fast = 0;

    for page in pages {
        if page.response_time > limit {
            result.issues.push(format!(
                "Slow response ({:.2}s): {}",
                page.response_time, page.url
            ));
        } else {
            fast += 1;
        }
    }

    if below_share(fast, pages.len(), 0.8) {
        result
            .recommendations
            .push("Improve page load times".to_string());
    }

    result.score = ratio_score(fast, pages.len());
    result.cap_issues()
}

pub fn score_status_codes(pages: &[PageSignals]) -> CategoryResult {
    if pages.is_empty() {
        return CategoryResult::default();
    }

    let mut result = CategoryResult::default();
    let mut ok = 0;

    for page in pages {
        if page.status_code == 200 {
            ok += 1;
        } else {
            result.issues.push(format!(
                "Unexpected status code ({}): {}",
                page.status_code, page.url
            ));
        }
    }

    if ok < pages.len() {
        result
            .recommendations
            .push("Fix the HTTP errors on failing pages".to_string());
    }

    result.score = ratio_score(ok, pages.len());
    result.cap_issues()
}

pub fn score_canonical_tags(pages: &[PageSignals]) -> CategoryResult {
    if pages.is_empty() {
        return CategoryResult::default();
    }

    let mut result = CategoryResult::default();
    let mut with_canonical = 0;

    for page in pages {
        if page.canonical_url.as_deref().is_some_and(|c| !c.is_empty()) {
            with_canonical += 1;
        } else {
            result
                .issues
                .push(format!("Missing canonical tag: {}", page.url));
        }
    }

    if with_canonical < pages.len() {
        result
            .recommendations
            .push("Add a canonical tag to every page".to_string());
    }

    result.score = ratio_score(with_canonical, pages.len());
    result.cap_issues()
}

pub fn score_mobile_friendly(pages: &[PageSignals]) -> CategoryResult {
    if pages.is_empty() {
        return CategoryResult::default();
    }

    let mut result = CategoryResult::default();
    let mut friendly = 0;

    for page in pages {
        let viewport = page.viewport.as_deref().unwrap_or_default();

        if viewport.contains("width=device-width") || viewport.contains("initial-scale=1") {
            friendly += 1;
            result
                .successes
                .push(format!("Responsive viewport: {}", page.url));
        } else if viewport.contains("width=") {
            let width = VIEWPORT_WIDTH
                .captures(viewport)
                .and_then(|caps| caps[1].parse::<u32>().ok());
            match width {
                Some(width) if width >= DESKTOP_VIEWPORT_WIDTH => {
                    friendly += 1;
                    result.successes.push(format!(
                        "Fixed-width viewport with a dedicated mobile version (width={}): {}",
                        width, page.url
                    ));
                }
                Some(_) => {
                    friendly += 1;
                    result
                        .successes
                        .push(format!("Custom mobile viewport: {}", page.url));
                }
                None => result.issues.push(format!(
                    "Viewport present but not recognised: {} - {}",
                    page.url, viewport
                )),
            }
        } else {
            result
                .issues
                .push(format!("Missing mobile viewport: {}", page.url));
        }
    }

    let missing = pages.len() - friendly;
    if missing == pages.len() {
        result
            .recommendations
            .push("Add a viewport meta tag for mobile devices".to_string());
        result
            .recommendations
            .push("Consider a responsive layout".to_string());
    } else if missing > 0 {
        result.recommendations.push(format!(
            "Add a mobile viewport to the remaining {} pages",
            missing
        ));
    }

    result.successes.truncate(super::MAX_LISTED_ISSUES);
    result.score = ratio_score(friendly, pages.len());
    result.cap_issues()
}

/// Site-wide: one page with a favicon is enough.
pub fn score_favicon(pages: &[PageSignals]) -> CategoryResult {
    if pages.iter().any(|page| page.has_favicon) {
        return CategoryResult::with_score(100);
    }

    let mut result = CategoryResult {
        issues: vec!["No favicon found".to_string()],
        ..CategoryResult::default()
    };
    // Issue only for an empty page set
    if !pages.is_empty() {
        result
            .recommendations
            .push("Add a favicon to the site".to_string());
    }
    result
}

pub fn score_robots_txt(robots: &RobotsReport) -> CategoryResult {
    let mut result = CategoryResult::default();

    if !robots.found {
        result.issues.push("robots.txt not found".to_string());
        result
            .recommendations
            .push("Create a robots.txt file".to_string());
        return result;
    }

    let mut score: i32 = 100;
    if !robots.declares_sitemap() {
        score -= 20;
        result
            .issues
            .push("No sitemap declared in robots.txt".to_string());
        result
            .recommendations
            .push("Reference your sitemaps in robots.txt".to_string());
    }
    if robots.blocks_entire_site() {
        score -= 50;
        result
            .issues
            .push("A Disallow: / rule blocks the whole site".to_string());
    }
    if result.issues.is_empty() {
        result
            .successes
            .push("robots.txt found with sitemap references".to_string());
    }

    result.score = score.max(0) as u8;
    result
}
