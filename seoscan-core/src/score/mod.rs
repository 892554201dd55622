//! Per-category scoring over the pages of one crawl.
//!
//! Every scorer is a pure function of the extracted signals. Ratio-based
//! categories score `floor(min(100, good / total * 100))`.

mod content;
mod social;
mod technical;

pub use content::{
    heading_structure_score, score_content_length, score_headings, score_images_alt,
    score_keyword_density, score_meta_descriptions, score_titles,
};
pub use social::{score_open_graph, score_twitter_cards};
pub use technical::{
    score_canonical_tags, score_favicon, score_mobile_friendly, score_response_times,
    score_robots_txt, score_status_codes,
};

use seoscan_scanner::{FetchMode, PageSignals, RobotsReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Issues listed per category are cut at this many entries.
pub const MAX_LISTED_ISSUES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Titles,
    MetaDescriptions,
    Headings,
    ImagesAlt,
    ContentLength,
    KeywordDensity,
    ResponseTimes,
    StatusCodes,
    CanonicalTags,
    OpenGraph,
    TwitterCards,
    MobileFriendly,
    Favicon,
    RobotsTxt,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Titles,
        Category::MetaDescriptions,
        Category::Headings,
        Category::ImagesAlt,
        Category::ContentLength,
        Category::KeywordDensity,
        Category::ResponseTimes,
        Category::StatusCodes,
        Category::CanonicalTags,
        Category::OpenGraph,
        Category::TwitterCards,
        Category::MobileFriendly,
        Category::Favicon,
        Category::RobotsTxt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Titles => "titles",
            Category::MetaDescriptions => "meta_descriptions",
            Category::Headings => "headings",
            Category::ImagesAlt => "images_alt",
            Category::ContentLength => "content_length",
            Category::KeywordDensity => "keyword_density",
            Category::ResponseTimes => "response_times",
            Category::StatusCodes => "status_codes",
            Category::CanonicalTags => "canonical_tags",
            Category::OpenGraph => "open_graph",
            Category::TwitterCards => "twitter_cards",
            Category::MobileFriendly => "mobile_friendly",
            Category::Favicon => "favicon",
            Category::RobotsTxt => "robots_txt",
        }
    }

    /// Human readable name used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Titles => "Page Titles",
            Category::MetaDescriptions => "Meta Descriptions",
            Category::Headings => "Heading Structure",
            Category::ImagesAlt => "Image Alt Text",
            Category::ContentLength => "Content Length",
            Category::KeywordDensity => "Keyword Density",
            Category::ResponseTimes => "Response Times",
            Category::StatusCodes => "HTTP Status Codes",
            Category::CanonicalTags => "Canonical Tags",
            Category::OpenGraph => "Open Graph",
            Category::TwitterCards => "Twitter Cards",
            Category::MobileFriendly => "Mobile Friendliness",
            Category::Favicon => "Favicon",
            Category::RobotsTxt => "robots.txt",
        }
    }

    /// Contribution to the overall score. Keyword density is informational only.
    pub fn weight(&self) -> Option<f64> {
        match self {
            Category::Titles => Some(0.15),
            Category::MetaDescriptions => Some(0.15),
            Category::Headings => Some(0.10),
            Category::ImagesAlt => Some(0.10),
            Category::ContentLength => Some(0.10),
            Category::KeywordDensity => None,
            Category::ResponseTimes => Some(0.10),
            Category::StatusCodes => Some(0.10),
            Category::CanonicalTags => Some(0.05),
            Category::OpenGraph => Some(0.05),
            Category::TwitterCards => Some(0.05),
            Category::MobileFriendly => Some(0.05),
            Category::Favicon => Some(0.02),
            Category::RobotsTxt => Some(0.03),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// 0-100
    pub score: u8,
    pub issues: Vec<String>,
    pub successes: Vec<String>,
    pub recommendations: Vec<String>,
}

impl CategoryResult {
    pub fn with_score(score: u8) -> Self {
        Self {
            score,
            ..Self::default()
        }
    }

    pub(crate) fn cap_issues(mut self) -> Self {
        self.issues.truncate(MAX_LISTED_ISSUES);
        self
    }
}

/// `floor(min(100, good / total * 100))`, 0 for an empty set.
pub fn ratio_score(good: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (good as f64 / total as f64 * 100.0).min(100.0);
    percent.floor() as u8
}

/// Whether `good` falls short of `fraction` of `total`.
pub(crate) fn below_share(good: usize, total: usize, fraction: f64) -> bool {
    (good as f64) < total as f64 * fraction
}

/// Score every category for one crawl.
pub fn score_all(
    pages: &[PageSignals],
    robots: &RobotsReport,
    fetch_mode: FetchMode,
) -> BTreeMap<Category, CategoryResult> {
    let mut categories = BTreeMap::new();
    categories.insert(Category::Titles, score_titles(pages));
    categories.insert(Category::MetaDescriptions, score_meta_descriptions(pages));
    categories.insert(Category::Headings, score_headings(pages));
    categories.insert(Category::ImagesAlt, score_images_alt(pages));
    categories.insert(Category::ContentLength, score_content_length(pages));
    categories.insert(Category::KeywordDensity, score_keyword_density(pages));
    categories.insert(
        Category::ResponseTimes,
        score_response_times(pages, fetch_mode.slow_threshold()),
    );
    categories.insert(Category::StatusCodes, score_status_codes(pages));
    categories.insert(Category::CanonicalTags, score_canonical_tags(pages));
    categories.insert(Category::OpenGraph, score_open_graph(pages));
    categories.insert(Category::TwitterCards, score_twitter_cards(pages));
    categories.insert(Category::MobileFriendly, score_mobile_friendly(pages));
    categories.insert(Category::Favicon, score_favicon(pages));
    categories.insert(Category::RobotsTxt, score_robots_txt(robots));
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_score_truncates() {
        assert_eq!(ratio_score(0, 0), 0);
        assert_eq!(ratio_score(2, 3), 66);
        assert_eq!(ratio_score(3, 3), 100);
        assert_eq!(ratio_score(1, 8), 12);
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_str("ROBOTS_TXT"), Some(Category::RobotsTxt));
        assert_eq!(Category::from_str("unknown"), None);
    }

    #[test]
    fn test_weights_sum() {
        let total: f64 = Category::ALL.iter().filter_map(|c| c.weight()).sum();
        assert!((total - 1.05).abs() < 1e-9);
        assert_eq!(Category::KeywordDensity.weight(), None);
    }

    #[test]
    fn test_score_all_covers_every_category() {
        let categories = score_all(&[], &RobotsReport::not_found(), FetchMode::Http);
        assert_eq!(categories.len(), Category::ALL.len());
        assert_eq!(categories[&Category::Titles].score, 0);
        assert_eq!(categories[&Category::ImagesAlt].score, 100);
        assert_eq!(categories[&Category::KeywordDensity].score, 75);
    }
}
