use crate::config::ScanConfig;
use crate::error::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[cfg(feature = "headless")]
use crate::headless::HeadlessFetcher;

/// How page bodies are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Http,
    Headless,
}

impl FetchMode {
    /// Response time above which a page counts as slow.
    pub fn slow_threshold(&self) -> Duration {
        match self {
            FetchMode::Http => Duration::from_secs(3),
            FetchMode::Headless => Duration::from_secs(6),
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Http => write!(f, "http"),
            FetchMode::Headless => write!(f, "headless"),
        }
    }
}

/// A fetched page before any parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    pub url: String,
    /// 0 when the request never produced a response
    pub status_code: u16,
    /// Only populated for 2xx responses
    pub html: String,
    /// Request start until the body was read (or the failure)
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl RawPage {
    pub fn new(url: String, status_code: u16, html: String, elapsed: Duration) -> Self {
        Self {
            url,
            status_code,
            html,
            elapsed,
            error: None,
        }
    }

    pub fn with_error(url: String, status_code: u16, elapsed: Duration, error: String) -> Self {
        Self {
            url,
            status_code,
            html: String::new(),
            elapsed,
            error: Some(error),
        }
    }

    /// Keep the body for 2xx statuses, record `HTTP {code}` for anything else.
    pub fn from_status(url: String, status_code: u16, html: String, elapsed: Duration) -> Self {
        if (200..300).contains(&status_code) {
            Self::new(url, status_code, html, elapsed)
        } else {
            Self::with_error(url, status_code, elapsed, format!("HTTP {}", status_code))
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200 && self.error.is_none()
    }
}

/// Page retrieval used by the crawler.
pub trait PageFetcher {
    fn mode(&self) -> FetchMode;

    fn fetch(&self, url: &str) -> impl Future<Output = RawPage> + Send;

    /// HEAD-style check, true only on a 200 response.
    fn probe(&self, url: &str) -> impl Future<Output = bool> + Send;

    /// Release any session held by the fetcher.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Plain HTTP fetching over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    probe_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            probe_timeout: config.probe_timeout,
        })
    }

    /// GET a resource and return its body on 200, `None` for any other status.
    pub async fn get_text(&self, url: &str) -> Result<Option<String>> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            debug!("{} returned {}", url, response.status());
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }
}

impl PageFetcher for HttpFetcher {
    fn mode(&self) -> FetchMode {
        FetchMode::Http
    }

    async fn fetch(&self, url: &str) -> RawPage {
        debug!("Fetching {}", url);
        let start = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request to {} failed: {}", url, e);
                let message = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                return RawPage::with_error(url.to_string(), 0, start.elapsed(), message);
            }
        };

        let status = response.status();

        if !status.is_success() {
            return RawPage::from_status(
                url.to_string(),
                status.as_u16(),
                String::new(),
                start.elapsed(),
            );
        }

        // Timed over the full download, not just the headers
        match response.text().await {
            Ok(html) => {
                RawPage::from_status(url.to_string(), status.as_u16(), html, start.elapsed())
            }
            Err(e) => RawPage::with_error(
                url.to_string(),
                status.as_u16(),
                start.elapsed(),
                e.to_string(),
            ),
        }
    }

    async fn probe(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("Probe of {} failed: {}", url, e);
                false
            }
        }
    }

    async fn close(self) {}
}

/// The fetcher selected for a run.
pub enum Fetcher {
    Http(HttpFetcher),
    #[cfg(feature = "headless")]
    Headless(HeadlessFetcher),
}

impl Fetcher {
    /// Open the fetcher requested by `config`.
    ///
    /// Headless mode falls back to HTTP when the browser cannot be launched or
    /// the crate was built without the `headless` feature.
    pub async fn open(config: &ScanConfig, http: HttpFetcher) -> Self {
        match config.fetch_mode {
            FetchMode::Http => Fetcher::Http(http),
            FetchMode::Headless => Self::open_headless(config, http).await,
        }
    }

    #[cfg(feature = "headless")]
    async fn open_headless(config: &ScanConfig, http: HttpFetcher) -> Self {
        match HeadlessFetcher::launch(config, http.clone()).await {
            Ok(fetcher) => Fetcher::Headless(fetcher),
            Err(e) => {
                warn!("Headless browser unavailable ({}), using HTTP", e);
                Fetcher::Http(http)
            }
        }
    }

    #[cfg(not(feature = "headless"))]
    async fn open_headless(_config: &ScanConfig, http: HttpFetcher) -> Self {
        warn!("Built without the `headless` feature, using HTTP");
        Fetcher::Http(http)
    }
}

impl PageFetcher for Fetcher {
    fn mode(&self) -> FetchMode {
        match self {
            Fetcher::Http(f) => f.mode(),
            #[cfg(feature = "headless")]
            Fetcher::Headless(f) => f.mode(),
        }
    }

    async fn fetch(&self, url: &str) -> RawPage {
        match self {
            Fetcher::Http(f) => f.fetch(url).await,
            #[cfg(feature = "headless")]
            Fetcher::Headless(f) => f.fetch(url).await,
        }
    }

    async fn probe(&self, url: &str) -> bool {
        match self {
            Fetcher::Http(f) => f.probe(url).await,
            #[cfg(feature = "headless")]
            Fetcher::Headless(f) => f.probe(url).await,
        }
    }

    async fn close(self) {
        match self {
            Fetcher::Http(f) => f.close().await,
            #[cfg(feature = "headless")]
            Fetcher::Headless(f) => f.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&ScanConfig::default().with_timeout(Duration::from_secs(2))).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_keeps_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let page = fetcher().fetch(&mock_server.uri()).await;
        assert_eq!(page.status_code, 200);
        assert_eq!(page.html, "<html>ok</html>");
        assert!(page.is_success());
    }

    #[tokio::test]
    async fn test_fetch_non_success_records_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&mock_server)
            .await;

        let page = fetcher()
            .fetch(&format!("{}/missing", mock_server.uri()))
            .await;
        assert_eq!(page.status_code, 404);
        assert!(page.html.is_empty());
        assert_eq!(page.error.as_deref(), Some("HTTP 404"));
    }

    #[tokio::test]
    async fn test_fetch_elapsed_covers_body_download() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>".to_string() + &"x".repeat(64 * 1024) + "</html>")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&mock_server)
            .await;

        let page = fetcher()
            .fetch(&format!("{}/slow", mock_server.uri()))
            .await;
        assert!(page.is_success());
        assert!(page.html.len() > 64 * 1024);
        assert!(page.elapsed >= Duration::from_millis(300));
    }

    #[test]
    fn test_from_status_routes_non_2xx_to_error() {
        let ok = RawPage::from_status(
            "https://a.test".to_string(),
            200,
            "<p>hi</p>".to_string(),
            Duration::from_millis(10),
        );
        assert!(ok.is_success());
        assert_eq!(ok.html, "<p>hi</p>");

        let gone = RawPage::from_status(
            "https://a.test/gone".to_string(),
            500,
            "<p>boom</p>".to_string(),
            Duration::from_millis(10),
        );
        assert_eq!(gone.status_code, 500);
        assert!(gone.html.is_empty());
        assert_eq!(gone.error.as_deref(), Some("HTTP 500"));
    }

    #[tokio::test]
    async fn test_fetch_network_error_is_status_zero() {
        // Nothing listens on port 9 of localhost in the test environment.
        let page = fetcher().fetch("http://127.0.0.1:9/").await;
        assert_eq!(page.status_code, 0);
        assert!(page.error.is_some());
    }

    #[tokio::test]
    async fn test_probe_and_get_text() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/favicon.ico"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *"))
            .mount(&mock_server)
            .await;

        let http = fetcher();
        assert!(http.probe(&format!("{}/favicon.ico", mock_server.uri())).await);
        assert!(!http.probe(&format!("{}/nope.ico", mock_server.uri())).await);

        let body = http
            .get_text(&format!("{}/robots.txt", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body.as_deref(), Some("User-agent: *"));
        let missing = http
            .get_text(&format!("{}/sitemap.xml", mock_server.uri()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_slow_threshold_per_mode() {
        assert_eq!(FetchMode::Http.slow_threshold(), Duration::from_secs(3));
        assert_eq!(FetchMode::Headless.slow_threshold(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_open_http_mode() {
        let config = ScanConfig::default();
        let fetcher = Fetcher::open(&config, HttpFetcher::new(&config).unwrap()).await;
        assert_eq!(fetcher.mode(), FetchMode::Http);
        fetcher.close().await;
    }
}
