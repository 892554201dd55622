use super::{CategoryResult, ratio_score};
use seoscan_scanner::PageSignals;
use std::collections::BTreeMap;

fn score_tag_presence(
    pages: &[PageSignals],
    tags: impl Fn(&PageSignals) -> &BTreeMap<String, String>,
    missing: &str,
    recommendation: &str,
) -> CategoryResult {
    if pages.is_empty() {
        return CategoryResult::default();
    }

    let mut result = CategoryResult::default();
    let mut tagged = 0;

    for page in pages {
        if tags(page).is_empty() {
            result.issues.push(format!("{}: {}", missing, page.url));
        } else {
            tagged += 1;
        }
    }

    if tagged < pages.len() {
        result.recommendations.push(recommendation.to_string());
    }

    result.score = ratio_score(tagged, pages.len());
    result.cap_issues()
}

pub fn score_open_graph(pages: &[PageSignals]) -> CategoryResult {
    score_tag_presence(
        pages,
        |page| &page.open_graph,
        "Missing Open Graph tags",
        "Add Open Graph tags to improve social sharing previews",
    )
}

pub fn score_twitter_cards(pages: &[PageSignals]) -> CategoryResult {
    score_tag_presence(
        pages,
        |page| &page.twitter,
        "Missing Twitter Card tags",
        "Add Twitter Card tags to improve link previews",
    )
}
