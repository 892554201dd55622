//! Combines category scores into the overall score and builds the per-page
//! detail table.

use crate::score::{Category, CategoryResult, heading_structure_score, score_all};
use seoscan_scanner::{CrawlOutcome, FetchMode, PageSignals, RobotsReport, SiteTarget};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the page detail table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDetail {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub status_code: u16,
    /// Seconds
    pub response_time: f64,
    pub h1_count: usize,
    pub heading_structure_score: u8,
    pub has_canonical: bool,
    pub has_favicon: bool,
}

impl PageDetail {
    pub fn from_signals(page: &PageSignals) -> Self {
        let headings = &page.headings;
        Self {
            url: page.url.clone(),
            title: page.title.clone(),
            meta_description: page.meta_description.clone(),
            status_code: page.status_code,
            response_time: page.response_time,
            h1_count: headings.h1.len(),
            heading_structure_score: heading_structure_score(
                headings.h1.len(),
                headings.h2.len(),
                headings.h3.len(),
            ),
            has_canonical: page.canonical_url.as_deref().is_some_and(|c| !c.is_empty()),
            has_favicon: page.has_favicon,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub target: SiteTarget,
    pub overall_score: u8,
    pub categories: BTreeMap<Category, CategoryResult>,
    pub page_details: Vec<PageDetail>,
    pub sitemaps: Vec<String>,
    pub robots: RobotsReport,
    pub pages_analyzed: usize,
    pub fetch_mode: FetchMode,
    /// Unix timestamp (seconds)
    pub analyzed_at: i64,
}

impl AnalysisResult {
    pub fn score_of(&self, category: Category) -> u8 {
        self.categories
            .get(&category)
            .map(|result| result.score)
            .unwrap_or(0)
    }

    pub fn total_issues(&self) -> usize {
        self.categories.values().map(|c| c.issues.len()).sum()
    }
}

/// Weighted average of the weighted categories present, renormalised by the
/// weights actually present and rounded. 0 when none are present.
pub fn overall_score(categories: &BTreeMap<Category, CategoryResult>) -> u8 {
    let (weighted_sum, total_weight) = categories
        .iter()
        .filter_map(|(category, result)| category.weight().map(|w| (result.score as f64, w)))
        .fold((0.0, 0.0), |(sum, total), (score, weight)| {
            (sum + score * weight, total + weight)
        });

    if total_weight <= 0.0 {
        return 0;
    }
    (weighted_sum / total_weight).round().clamp(0.0, 100.0) as u8
}

pub fn build_page_details(pages: &[PageSignals]) -> Vec<PageDetail> {
    pages.iter().map(PageDetail::from_signals).collect()
}

/// Score a finished crawl.
pub fn assemble(outcome: CrawlOutcome) -> AnalysisResult {
    let CrawlOutcome {
        target,
        robots,
        sitemaps,
        pages,
        fetch_mode,
    } = outcome;

    let categories = score_all(&pages, &robots, fetch_mode);
    AnalysisResult {
        target,
        overall_score: overall_score(&categories),
        page_details: build_page_details(&pages),
        categories,
        sitemaps,
        robots,
        pages_analyzed: pages.len(),
        fetch_mode,
        analyzed_at: chrono::Utc::now().timestamp(),
    }
}
