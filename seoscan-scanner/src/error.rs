use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    /// Whether this error should abort an analysis run rather than degrade a page.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::InvalidUrl(_))
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
