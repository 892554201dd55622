pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
#[cfg(feature = "headless")]
pub mod headless;
pub mod robots;
pub mod signals;
pub mod sitemap;
pub mod url;

pub use config::ScanConfig;
pub use crawler::{CrawlOutcome, CrawlStage, Crawler, ProgressCallback};
pub use error::ScanError;
pub use fetch::{FetchMode, PageFetcher, RawPage};
pub use robots::RobotsReport;
pub use signals::{Heading, HeadingSource, Headings, ImageInfo, PageSignals};
pub use url::{SiteTarget, normalize_url};
