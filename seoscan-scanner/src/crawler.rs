use crate::config::ScanConfig;
use crate::error::Result;
use crate::extract::{discover_links, extract_signals};
use crate::fetch::{FetchMode, Fetcher, HttpFetcher, PageFetcher};
use crate::robots::{RobotsAnalyzer, RobotsReport};
use crate::signals::PageSignals;
use crate::sitemap::SitemapResolver;
use crate::url::{SiteTarget, is_same_site, site_root};
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Path fragments of privacy, cookie and legal-notice pages in several languages.
const LEGAL_PAGE_MARKERS: &[&str] = &[
    "privacy",
    "cookie",
    "terms",
    "legal",
    "gdpr",
    "note-legali",
    "informativa",
    "condizioni",
    "impressum",
    "datenschutz",
    "disclaimer",
];

/// Pipeline milestones reported while a crawl runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStage {
    Robots,
    SitemapDiscovery,
    SitemapExpansion { sitemaps: usize },
    LinkDiscovery,
    Fetching { index: usize, total: usize, url: String },
    Finished { pages: usize },
}

pub type ProgressCallback = Arc<dyn Fn(CrawlStage) + Send + Sync>;

/// Everything gathered by one crawl, ready for scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub target: SiteTarget,
    pub robots: RobotsReport,
    pub sitemaps: Vec<String>,
    pub pages: Vec<PageSignals>,
    pub fetch_mode: FetchMode,
}

pub struct Crawler {
    config: ScanConfig,
    http: HttpFetcher,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let http = HttpFetcher::new(&config)?;
        Ok(Self {
            config,
            http,
            progress_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn report(&self, stage: CrawlStage) {
        if let Some(ref callback) = self.progress_callback {
            callback(stage);
        }
    }

    /// Run robots, sitemap and candidate discovery, then fetch and extract every
    /// candidate page one at a time.
    pub async fn crawl(&self, target: &SiteTarget) -> Result<CrawlOutcome> {
        info!("Starting analysis crawl of {}", target.base_url);

        self.report(CrawlStage::Robots);
        let robots = RobotsAnalyzer::new(self.http.clone()).analyze(target).await;

        self.report(CrawlStage::SitemapDiscovery);
        let resolver = SitemapResolver::new(self.http.clone());
        let sitemaps = resolver
            .discover_sitemaps(target, &robots.sitemap_urls)
            .await;

        self.report(CrawlStage::SitemapExpansion {
            sitemaps: sitemaps.len(),
        });
        let sitemap_pages = resolver.expand_all(&sitemaps).await;

        let discovered = if sitemap_pages.len() < self.config.discovery_threshold {
            self.report(CrawlStage::LinkDiscovery);
            self.discover_from_homepage(target).await
        } else {
            Vec::new()
        };

        let candidates = select_candidates(target, &sitemap_pages, &discovered, &self.config);
        info!(
            "Selected {} candidate page(s) ({} from sitemaps, {} discovered)",
            candidates.len(),
            sitemap_pages.len(),
            discovered.len()
        );

        let fetcher = Fetcher::open(&self.config, self.http.clone()).await;
        let fetch_mode = fetcher.mode();
        let delay = self.config.effective_delay(robots.crawl_delay);
        let mut favicon_by_origin: HashMap<String, bool> = HashMap::new();
        let mut pages = Vec::with_capacity(candidates.len());

        for (index, url) in candidates.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            self.report(CrawlStage::Fetching {
                index: index + 1,
                total: candidates.len(),
                url: url.clone(),
            });

            let raw = fetcher.fetch(url).await;
            let mut signals = extract_signals(&raw);

            if !signals.is_failed() && !signals.has_favicon {
                signals.has_favicon = match Url::parse(url).map(|u| site_root(&u)) {
                    Ok(origin) => match favicon_by_origin.get(&origin) {
                        Some(found) => *found,
                        None => {
                            let found = fetcher.probe(&format!("{}/favicon.ico", origin)).await;
                            favicon_by_origin.insert(origin, found);
                            found
                        }
                    },
                    Err(_) => false,
                };
            }

            if let Some(ref error) = signals.error {
                warn!("Page {} recorded as failed: {}", url, error);
            }
            pages.push(signals);
        }

        fetcher.close().await;

        self.report(CrawlStage::Finished { pages: pages.len() });
        info!("Crawl complete. Analyzed {} pages", pages.len());

        Ok(CrawlOutcome {
            target: target.clone(),
            robots,
            sitemaps,
            pages,
            fetch_mode,
        })
    }

    async fn discover_from_homepage(&self, target: &SiteTarget) -> Vec<String> {
        let body = match self.http.get_text(&target.base_url).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                debug!("Homepage not available for link discovery");
                return Vec::new();
            }
            Err(e) => {
                warn!("Link discovery failed for {}: {}", target.base_url, e);
                return Vec::new();
            }
        };

        let Ok(page_url) = Url::parse(&target.base_url) else {
            return Vec::new();
        };
        let links = links_in(&body, &page_url, &target.domain, self.config.max_discovered_links);
        debug!("Discovered {} link(s) on the homepage", links.len());
        links
    }
}

fn links_in(body: &str, page_url: &Url, domain: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(body);
    discover_links(&document, page_url, domain, limit)
}

/// Whether a URL looks like a privacy, cookie or legal-notice page.
pub fn is_legal_page(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_else(|_| url.to_lowercase());
    LEGAL_PAGE_MARKERS.iter().any(|marker| path.contains(marker))
}

fn dedup_key(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Order, filter and cap the pages to fetch.
///
/// The base URL comes first, then sitemap pages, then discovered links when the
/// sitemaps yielded fewer than the discovery threshold. Only pages on the
/// target's site are kept.
pub fn select_candidates(
    target: &SiteTarget,
    sitemap_pages: &[String],
    discovered: &[String],
    config: &ScanConfig,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = vec![target.base_url.clone()];
    seen.insert(dedup_key(&target.base_url));

    let extra: &[String] = if sitemap_pages.len() < config.discovery_threshold {
        discovered
    } else {
        &[]
    };

    for url in sitemap_pages.iter().chain(extra.iter()) {
        let same_site = Url::parse(url).is_ok_and(|u| is_same_site(&u, &target.domain));
        if !same_site {
            debug!("Skipping off-site page {}", url);
            continue;
        }
        if config.exclude_legal_pages && is_legal_page(url) {
            debug!("Skipping legal page {}", url);
            continue;
        }
        if seen.insert(dedup_key(url)) {
            candidates.push(url.clone());
        }
    }

    candidates.truncate(config.max_pages);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::normalize_url;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn config() -> ScanConfig {
        ScanConfig::default()
            .with_polite_delay(Duration::ZERO)
            .with_timeout(Duration::from_secs(5))
    }

    fn html_page(title: &str, body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_string(format!(
                "<html><head><title>{}</title></head><body>{}</body></html>",
                title, body
            ))
    }

    // ============================================================================
    // Candidate selection
    // ============================================================================

    #[test]
    fn test_select_candidates_base_first_and_dedup() {
        let target = normalize_url("https://example.com").unwrap();
        let sitemap = vec![
            "https://example.com/".to_string(),
            "https://example.com/a".to_string(),
            "https://example.com/a".to_string(),
        ];
        let discovered = vec!["https://example.com/b".to_string()];
        let candidates = select_candidates(&target, &sitemap, &discovered, &ScanConfig::default());
        assert_eq!(
            candidates,
            vec![
                "https://example.com",
                "https://example.com/a",
                "https://example.com/b",
            ]
        );
    }

    #[test]
    fn test_select_candidates_skips_discovery_above_threshold() {
        let target = normalize_url("https://example.com").unwrap();
        let sitemap: Vec<String> = (0..5).map(|i| format!("https://example.com/p{}", i)).collect();
        let discovered = vec!["https://example.com/extra".to_string()];
        let candidates = select_candidates(&target, &sitemap, &discovered, &ScanConfig::default());
        assert_eq!(candidates.len(), 6);
        assert!(!candidates.contains(&"https://example.com/extra".to_string()));
    }

    #[test]
    fn test_select_candidates_cap_and_legal_filter() {
        let target = normalize_url("https://example.com/privacy-hub").unwrap();
        let sitemap: Vec<String> = vec![
            "https://example.com/privacy-policy".to_string(),
            "https://example.com/cookie".to_string(),
            "https://example.com/shop".to_string(),
            "https://example.com/impressum".to_string(),
            "https://example.com/blog".to_string(),
            "https://example.com/faq".to_string(),
        ];
        let config = ScanConfig::default()
            .with_exclude_legal_pages(true)
            .with_max_pages(3);
        let candidates = select_candidates(&target, &sitemap, &[], &config);
        assert_eq!(
            candidates,
            vec![
                "https://example.com/privacy-hub",
                "https://example.com/shop",
                "https://example.com/blog",
            ]
        );
    }

    #[test]
    fn test_select_candidates_drops_off_site_sitemap_entries() {
        let target = normalize_url("https://www.example.com").unwrap();
        let sitemap = vec![
            "https://example.com/a".to_string(),
            "https://cdn.other.org/b".to_string(),
            "https://blog.example.com/c".to_string(),
            "not a url".to_string(),
        ];
        let candidates = select_candidates(&target, &sitemap, &[], &ScanConfig::default());
        assert_eq!(
            candidates,
            vec![
                "https://www.example.com",
                "https://example.com/a",
                "https://blog.example.com/c",
            ]
        );
    }

    #[test]
    fn test_is_legal_page() {
        assert!(is_legal_page("https://example.com/it/note-legali/"));
        assert!(is_legal_page("https://example.com/Datenschutz"));
        assert!(!is_legal_page("https://legal-example.com/products"));
    }

    // ============================================================================
    // Full crawl
    // ============================================================================

    #[tokio::test]
    async fn test_crawl_with_sitemap() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "User-agent: *\nDisallow: /admin\nSitemap: {}/pages.xml\n",
                base
            )))
            .mount(&mock_server)
            .await;

        let mut urlset = String::from(
            r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
        );
        for i in 1..=5 {
            urlset.push_str(&format!("<url><loc>{}/page{}</loc></url>", base, i));
        }
        urlset.push_str("</urlset>");
        Mock::given(method("GET"))
            .and(path("/pages.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(urlset))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page("Home", "<h1>Home</h1>"))
            .mount(&mock_server)
            .await;
        for i in 1..=5 {
            Mock::given(method("GET"))
                .and(path(format!("/page{}", i)))
                .respond_with(html_page(&format!("Page {}", i), "<p>content</p>"))
                .mount(&mock_server)
                .await;
        }
        Mock::given(method("HEAD"))
            .and(path("/favicon.ico"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let target = normalize_url(&base).unwrap();
        let outcome = Crawler::new(config()).unwrap().crawl(&target).await.unwrap();

        assert!(outcome.robots.found);
        assert_eq!(outcome.sitemaps, vec![format!("{}/pages.xml", base)]);
        assert_eq!(outcome.pages.len(), 6);
        assert_eq!(outcome.pages[0].url, base);
        assert!(outcome.pages.iter().all(|p| p.status_code == 200));
        assert!(outcome.pages.iter().all(|p| p.has_favicon));
        assert_eq!(outcome.fetch_mode, FetchMode::Http);
    }

    #[tokio::test]
    async fn test_crawl_falls_back_to_link_discovery() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page(
                "Home",
                r#"<a href="/about?ref=nav">About</a>
                   <a href="/broken">Broken</a>
                   <a href="https://elsewhere.org/">Elsewhere</a>
                   <link rel="icon" href="/icon.png">"#,
            ))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(html_page("About", "<h1>About us</h1>"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();
        let crawler = Crawler::new(config())
            .unwrap()
            .with_progress_callback(Arc::new(move |stage| {
                stages_clone.lock().unwrap().push(stage);
            }));

        let target = normalize_url(&base).unwrap();
        let outcome = crawler.crawl(&target).await.unwrap();

        assert!(!outcome.robots.found);
        assert!(outcome.sitemaps.is_empty());
        let urls: Vec<String> = outcome.pages.iter().map(|p| p.url.clone()).collect();
        assert_eq!(
            urls,
            vec![
                base.clone(),
                format!("{}/about", base),
                format!("{}/broken", base),
            ]
        );

        let broken = &outcome.pages[2];
        assert_eq!(broken.status_code, 500);
        assert_eq!(broken.error.as_deref(), Some("HTTP 500"));

        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&CrawlStage::Robots));
        assert!(stages.contains(&CrawlStage::LinkDiscovery));
        assert_eq!(stages.last(), Some(&CrawlStage::Finished { pages: 3 }));
    }

    /// A site whose sitemap lists two pages besides the homepage.
    async fn mount_three_page_site(mock_server: &MockServer, robots: &str) {
        let base = mock_server.uri();
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "{}\nSitemap: {}/sitemap.xml\n",
                robots, base
            )))
            .mount(mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<?xml version=\"1.0\"?><urlset><url><loc>{0}/one</loc></url><url><loc>{0}/two</loc></url></urlset>",
                base
            )))
            .mount(mock_server)
            .await;
        for page in ["/", "/one", "/two"] {
            Mock::given(method("GET"))
                .and(path(page))
                .respond_with(html_page(page, "<p>content</p>"))
                .mount(mock_server)
                .await;
        }
    }

    #[tokio::test]
    async fn test_crawl_waits_polite_delay_between_pages() {
        let mock_server = MockServer::start().await;
        mount_three_page_site(&mock_server, "User-agent: *").await;

        let delay = Duration::from_millis(200);
        let crawler = Crawler::new(config().with_polite_delay(delay)).unwrap();
        let target = normalize_url(&mock_server.uri()).unwrap();

        let started = std::time::Instant::now();
        let outcome = crawler.crawl(&target).await.unwrap();

        assert_eq!(outcome.pages.len(), 3);
        assert!(started.elapsed() >= delay * 2);
    }

    #[tokio::test]
    async fn test_crawl_honours_larger_robots_crawl_delay() {
        let mock_server = MockServer::start().await;
        mount_three_page_site(&mock_server, "User-agent: *\nCrawl-delay: 0.3").await;

        let crawler =
            Crawler::new(config().with_polite_delay(Duration::from_millis(50))).unwrap();
        let target = normalize_url(&mock_server.uri()).unwrap();

        let started = std::time::Instant::now();
        let outcome = crawler.crawl(&target).await.unwrap();

        assert_eq!(outcome.robots.crawl_delay, Some(0.3));
        assert_eq!(outcome.pages.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_crawl_caps_huge_crawl_delay() {
        let mock_server = MockServer::start().await;
        mount_three_page_site(&mock_server, "User-agent: *\nCrawl-delay: 3600").await;

        let crawler = Crawler::new(
            config()
                .with_polite_delay(Duration::ZERO)
                .with_max_delay(Duration::from_millis(100)),
        )
        .unwrap();
        let target = normalize_url(&mock_server.uri()).unwrap();

        let started = std::time::Instant::now();
        let outcome = crawler.crawl(&target).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome.pages.len(), 3);
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_crawl_unreachable_site_records_failed_base() {
        let target = normalize_url("http://127.0.0.1:9").unwrap();
        let crawler = Crawler::new(config().with_timeout(Duration::from_secs(1))).unwrap();
        let outcome = crawler.crawl(&target).await.unwrap();
        assert_eq!(outcome.pages.len(), 1);
        assert_eq!(outcome.pages[0].status_code, 0);
        assert!(outcome.pages[0].error.is_some());
    }
}
