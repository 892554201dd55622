//! JS-rendered page fetching through a single chromiumoxide session.

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::fetch::{FetchMode, HttpFetcher, PageFetcher, RawPage};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One browser session, owned for the whole crawl.
///
/// Call [`PageFetcher::close`] when done. Dropping without closing aborts the
/// event handler task and leaves the browser process to chromiumoxide's own drop.
pub struct HeadlessFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    http: HttpFetcher,
    timeout: Duration,
}

impl HeadlessFetcher {
    pub async fn launch(config: &ScanConfig, http: HttpFetcher) -> Result<Self> {
        info!("Launching headless browser");

        let browser_config = BrowserConfig::builder()
            .request_timeout(config.request_timeout)
            .arg(format!("--user-agent={}", config.user_agent))
            .arg("--no-first-run")
            .arg("--disable-extensions")
            .build()
            .map_err(ScanError::BrowserError)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScanError::BrowserError(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {:?}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            http,
            timeout: config.request_timeout,
        })
    }

    /// Navigate a fresh tab and return the main document status with the
    /// rendered HTML. The status is `None` when the browser recorded no response.
    async fn render(&self, url: &str) -> Result<(Option<u16>, String)> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| ScanError::BrowserError(e.to_string()))?;

        let rendered = async {
            let request = page.wait_for_navigation_response().await?;
            let status = request
                .as_ref()
                .and_then(|request| request.response.as_ref())
                .and_then(|response| u16::try_from(response.status).ok());
            let html = page.content().await?;
            Ok::<_, CdpError>((status, html))
        }
        .await
        .map_err(|e| ScanError::BrowserError(e.to_string()));

        if let Err(e) = page.close().await {
            debug!("Failed to close tab for {}: {}", url, e);
        }
        rendered
    }
}

impl PageFetcher for HeadlessFetcher {
    fn mode(&self) -> FetchMode {
        FetchMode::Headless
    }

    async fn fetch(&self, url: &str) -> RawPage {
        debug!("Rendering {}", url);
        let start = Instant::now();

        match tokio::time::timeout(self.timeout, self.render(url)).await {
            Ok(Ok((status, html))) => {
                let status = status.unwrap_or_else(|| {
                    debug!("No navigation response recorded for {}, assuming 200", url);
                    200
                });
                RawPage::from_status(url.to_string(), status, html, start.elapsed())
            }
            Ok(Err(e)) => {
                warn!("Render of {} failed: {}", url, e);
                RawPage::with_error(url.to_string(), 0, start.elapsed(), e.to_string())
            }
            Err(_) => {
                warn!("Render of {} timed out", url);
                RawPage::with_error(
                    url.to_string(),
                    0,
                    start.elapsed(),
                    "navigation timed out".to_string(),
                )
            }
        }
    }

    async fn probe(&self, url: &str) -> bool {
        self.http.probe(url).await
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process wait failed: {}", e);
        }
        self.handler.abort();
        info!("Headless browser closed");
    }
}

impl Drop for HeadlessFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
