use crate::fetch::FetchMode;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; seoscan/",
    env!("CARGO_PKG_VERSION"),
    "; +https://crates.io/crates/seoscan)"
);

/// Tunables for a single analysis run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    /// Minimum pause between two page fetches. Raised to robots.txt `Crawl-delay` when larger.
    pub polite_delay: Duration,
    /// Upper bound on a robots.txt `Crawl-delay`.
    pub max_delay: Duration,
    /// Below this many sitemap URLs the homepage links are crawled as well.
    pub discovery_threshold: usize,
    pub max_discovered_links: usize,
    pub fetch_mode: FetchMode,
    pub exclude_legal_pages: bool,
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            request_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            polite_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            discovery_threshold: 5,
            max_discovered_links: 20,
            fetch_mode: FetchMode::Http,
            exclude_legal_pages: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_polite_delay(mut self, delay: Duration) -> Self {
        self.polite_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    pub fn with_exclude_legal_pages(mut self, exclude: bool) -> Self {
        self.exclude_legal_pages = exclude;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Delay between fetches once robots.txt has been read.
    ///
    /// The robots `Crawl-delay` is clamped to `max_delay`; the configured
    /// polite delay is never lowered.
    pub fn effective_delay(&self, crawl_delay: Option<f64>) -> Duration {
        let requested = crawl_delay
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .map(|delay| delay.min(self.max_delay))
            .unwrap_or_default();
        self.polite_delay.max(requested)
    }
}
