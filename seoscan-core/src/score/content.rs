use super::{CategoryResult, below_share, ratio_score};
use seoscan_scanner::PageSignals;
use std::collections::{HashMap, HashSet};

const TITLE_MIN: usize = 30;
const TITLE_MAX: usize = 60;
const DESCRIPTION_MIN: usize = 120;
const DESCRIPTION_MAX: usize = 160;
const MIN_CONTENT_CHARS: usize = 300;
const DUPLICATE_TITLE_PENALTY: u8 = 10;

fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn score_titles(pages: &[PageSignals]) -> CategoryResult {
    if pages.is_empty() {
        return CategoryResult::default();
    }

    let mut result = CategoryResult::default();
    let mut good = 0;

    for page in pages {
        let len = char_len(&page.title);
        if page.title.is_empty() {
            result.issues.push(format!("Page without a title: {}", page.url));
        } else if len < TITLE_MIN {
            result.issues.push(format!(
                "Title too short ({} chars): {} - {}",
                len, page.title, page.url
            ));
        } else if len > TITLE_MAX {
            result.issues.push(format!(
                "Title too long ({} chars): {} - {}",
                len, page.title, page.url
            ));
        } else {
            good += 1;
        }
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for page in pages {
        *counts.entry(page.title.as_str()).or_default() += 1;
    }
    let mut reported = HashSet::new();
    let mut duplicate_groups = 0u8;
    for page in pages {
        let title = page.title.as_str();
        let count = counts[title];
        if count > 1 && !title.is_empty() && reported.insert(title) {
            duplicate_groups = duplicate_groups.saturating_add(1);
            result.issues.push(format!(
                "Duplicate title '{}' found on {} pages",
                title, count
            ));
        }
    }

    if below_share(good, pages.len(), 0.8) {
        result
            .recommendations
            .push(format!("Keep titles between {}-{} characters", TITLE_MIN, TITLE_MAX));
        result
            .recommendations
            .push("Give every page a unique, descriptive title".to_string());
    }

    result.score = ratio_score(good, pages.len())
        .saturating_sub(duplicate_groups.saturating_mul(DUPLICATE_TITLE_PENALTY));
    result.cap_issues()
}

pub fn score_meta_descriptions(pages: &[PageSignals]) -> CategoryResult {
    if pages.is_empty() {
        return CategoryResult::default();
    }

    let mut result = CategoryResult::default();
    let mut good = 0;

    for page in pages {
        let description = &page.meta_description;
        let len = char_len(description);
        if description.is_empty() {
            result
                .issues
                .push(format!("Missing meta description: {}", page.url));
        } else if len < DESCRIPTION_MIN {
            result.issues.push(format!(
                "Meta description too short ({} chars): '{}' - {}",
                len, description, page.url
            ));
        } else if len > DESCRIPTION_MAX {
            result.issues.push(format!(
                "Meta description too long ({} chars): '{}' - {}",
                len, description, page.url
            ));
        } else {
            good += 1;
            result.successes.push(format!(
                "Optimal meta description ({} chars): '{}' - {}",
                len, description, page.url
            ));
        }
    }

    if below_share(good, pages.len(), 0.8) {
        result.recommendations.push(format!(
            "Add a {}-{} character meta description to every page",
            DESCRIPTION_MIN, DESCRIPTION_MAX
        ));
    }
    if good > 0 {
        result
            .successes
            .push(format!("{} pages have an optimal meta description", good));
    }

    result.score = ratio_score(good, pages.len());
    result
}

/// Per-page heading outline score: 40 for a single h1 (10 for several), 30 for
/// any h2 plus 10 for a second, 20 for any h3.
pub fn heading_structure_score(h1: usize, h2: usize, h3: usize) -> u8 {
    let mut score = match h1 {
        0 => 0,
        1 => 40,
        _ => 10,
    };
    if h2 >= 1 {
        score += 30;
    }
    if h2 >= 2 {
        score += 10;
    }
    if h3 >= 1 {
        score += 20;
    }
    score.min(100)
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn score_headings(pages: &[PageSignals]) -> CategoryResult {
    if pages.is_empty() {
        return CategoryResult::default();
    }

    let mut result = CategoryResult::default();
    let total = pages.len();
    let mut correct_h1 = 0;
    let mut multiple_h1 = 0;
    let mut missing_h1 = 0;
    let mut fallback_h1 = 0;
    let mut total_h2 = 0;
    let mut total_h3 = 0;
    let mut structure_total = 0usize;

    for page in pages {
        let headings = &page.headings;
        let h1_count = headings.h1.len();

        match headings.h1.as_slice() {
            [] => {
                missing_h1 += 1;
                result.issues.push(format!("No H1 found: {}", page.url));
            }
            [h1] => {
                correct_h1 += 1;
                if h1.source.is_fallback() {
                    fallback_h1 += 1;
                    result.successes.push(format!(
                        "H1 recovered from {}: '{}' - {}",
                        h1.source.label(),
                        h1.text,
                        page.url
                    ));
                } else {
                    result
                        .successes
                        .push(format!("Standard H1 found: '{}' - {}", h1.text, page.url));
                }
            }
            _ => {
                multiple_h1 += 1;
                result
                    .issues
                    .push(format!("Multiple H1s found ({}): {}", h1_count, page.url));
            }
        }

        total_h2 += headings.h2.len();
        total_h3 += headings.h3.len();
        structure_total +=
            heading_structure_score(h1_count, headings.h2.len(), headings.h3.len()) as usize;
    }

    let avg_h2 = one_decimal(total_h2 as f64 / total as f64);
    let avg_h3 = one_decimal(total_h3 as f64 / total as f64);
    let avg_structure = one_decimal(structure_total as f64 / total as f64);

    if correct_h1 < total {
        if missing_h1 > 0 {
            result
                .recommendations
                .push(format!("Add an H1 to {} pages without a main heading", missing_h1));
        }
        if multiple_h1 > 0 {
            result.recommendations.push(format!(
                "Remove extra H1s from {} pages (one H1 per page)",
                multiple_h1
            ));
        }
    }
    if avg_h2 < 2.0 {
        result
            .recommendations
            .push("Add more H2 headings to structure page content".to_string());
    }
    if avg_h3 < 1.0 {
        result
            .recommendations
            .push("Use H3 headings to break H2 sections down further".to_string());
    }
    if fallback_h1 > 0 {
        result.recommendations.push(format!(
            "Convert {} dynamically detected H1s into real <h1> tags",
            fallback_h1
        ));
    }

    result.successes.push(format!(
        "Heading structure analyzed on {} pages (average structure score {})",
        total, avg_structure
    ));
    result
        .successes
        .push(format!("H2 total: {} (average {} per page)", total_h2, avg_h2));
    result
        .successes
        .push(format!("H3 total: {} (average {} per page)", total_h3, avg_h3));
    result
        .successes
        .push(format!("Pages with a single H1: {}/{}", correct_h1, total));

    result.score = ratio_score(correct_h1, total);
    result
}

pub fn score_images_alt(pages: &[PageSignals]) -> CategoryResult {
    let mut result = CategoryResult::default();
    let mut total_images = 0;
    let mut with_alt = 0;

    for image in pages.iter().flat_map(|page| page.images.iter()) {
        total_images += 1;
        if image.has_alt {
            with_alt += 1;
            result
                .successes
                .push(format!("Image with alt text: {}", image.src));
        } else {
            result
                .issues
                .push(format!("Image missing alt text: {}", image.src));
        }
    }

    if total_images == 0 {
        result.score = 100;
        result
            .successes
            .push("No images found to check".to_string());
        return result;
    }

    if below_share(with_alt, total_images, 0.9) {
        result
            .recommendations
            .push("Add descriptive alt attributes to every image".to_string());
    }
    if with_alt > 0 {
        result.successes.push(format!(
            "{} of {} images have alt text",
            with_alt, total_images
        ));
    }

    result.score = ratio_score(with_alt, total_images);
    result
}

pub fn score_content_length(pages: &[PageSignals]) -> CategoryResult {
    if pages.is_empty() {
        return CategoryResult::default();
    }

    let mut result = CategoryResult::default();
    let mut good = 0;

    for page in pages {
        if page.content_length < MIN_CONTENT_CHARS {
            result.issues.push(format!(
                "Content too short ({} chars): {}",
                page.content_length, page.url
            ));
        } else {
            good += 1;
        }
    }

    if below_share(good, pages.len(), 0.8) {
        result.recommendations.push(format!(
            "Increase page content (at least {} characters)",
            MIN_CONTENT_CHARS
        ));
    }

    result.score = ratio_score(good, pages.len());
    result.cap_issues()
}

/// Keyword density is not measured; the category carries a fixed score and a
/// reminder.
pub fn score_keyword_density(_pages: &[PageSignals]) -> CategoryResult {
    CategoryResult {
        score: 75,
        recommendations: vec!["Check the density of your main keywords (2-3%)".to_string()],
        ..CategoryResult::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_score() {
        assert_eq!(heading_structure_score(1, 2, 1), 100);
        assert_eq!(heading_structure_score(1, 1, 0), 70);
        assert_eq!(heading_structure_score(3, 0, 0), 10);
        assert_eq!(heading_structure_score(0, 5, 5), 60);
    }

    #[test]
    fn test_one_decimal() {
        assert_eq!(one_decimal(4.0 / 3.0), 1.3);
        assert_eq!(one_decimal(0.25), 0.3);
    }
}
