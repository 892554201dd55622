use crate::aggregate::{AnalysisResult, assemble};
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use seoscan_scanner::{CrawlStage, Crawler, ProgressCallback, ScanConfig, normalize_url};
use std::sync::Arc;
use tracing::info;

/// Options for one analysis run
pub struct AnalysisOptions {
    pub url: String,
    pub config: ScanConfig,
    pub show_progress: bool,
}

impl AnalysisOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            config: ScanConfig::default(),
            show_progress: false,
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

/// Spinner text for a crawl stage
pub fn describe_stage(stage: &CrawlStage) -> String {
    match stage {
        CrawlStage::Robots => "Reading robots.txt...".to_string(),
        CrawlStage::SitemapDiscovery => "Looking for sitemaps...".to_string(),
        CrawlStage::SitemapExpansion { sitemaps } => {
            format!("Expanding {} sitemap(s)...", sitemaps)
        }
        CrawlStage::LinkDiscovery => "Few sitemap pages, following homepage links...".to_string(),
        CrawlStage::Fetching { index, total, url } => {
            format!("Analyzing page {}/{}: {}", index, total, url)
        }
        CrawlStage::Finished { pages } => format!("Fetched {} page(s), scoring...", pages),
    }
}

/// Normalize the target, crawl it and score the result.
///
/// Only an unusable URL fails the run; everything else degrades into the
/// scored result.
pub async fn execute_analysis(
    options: AnalysisOptions,
    progress_callback: Option<ProgressCallback>,
) -> Result<AnalysisResult> {
    let AnalysisOptions {
        url,
        config,
        show_progress,
    } = options;

    let target = normalize_url(&url)?;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Starting analysis of {}...", target.base_url));
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(Arc::new(pb))
    } else {
        None
    };

    let pb_clone = progress_bar.clone();
    let internal_callback: ProgressCallback = Arc::new(move |stage: CrawlStage| {
        if let Some(ref pb) = pb_clone {
            pb.set_message(describe_stage(&stage));
        }
        if let Some(ref callback) = progress_callback {
            callback(stage);
        }
    });

    let crawler = Crawler::new(config)?.with_progress_callback(internal_callback);
    let outcome = crawler.crawl(&target).await;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    let result = assemble(outcome?);
    info!(
        "Analysis of {} finished: overall score {} over {} page(s)",
        result.target.base_url, result.overall_score, result.pages_analyzed
    );
    Ok(result)
}
