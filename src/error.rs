//! Error types for the Shiori scraping engine.
//!
//! Uses `thiserror` for structured error definitions. Adapter code works with
//! these through `?`; the public adapter boundary turns them into
//! [`Response::Error`](crate::response::Response) values.

use thiserror::Error;

/// Main error type for network and scraping operations.
#[derive(Error, Debug)]
pub enum ScraperError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timed out before the server answered
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Server answered with a redirect the request wasn't allowed to follow
    #[error("HTTP {status} redirect for {url} to {}", location.as_deref().unwrap_or("nowhere"))]
    Redirected {
        status: u16,
        url: String,
        location: Option<String>,
    },

    /// Rate limit exceeded or server returned 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Failed to parse HTML or JSON content
    #[error("Failed to parse content: {0}")]
    ParseError(String),

    /// A required element isn't found in HTML
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// URL parsing or validation failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Book or chapter not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// No adapter handles this URL
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    /// Reading or writing the response cache failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON payload didn't match the expected shape
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A panic was caught at the adapter boundary
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl ScraperError {
    /// Returns true when the failure was caused by a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            ScraperError::Timeout(_) => true,
            ScraperError::HttpError(err) => err.is_timeout(),
            _ => false,
        }
    }
}

impl From<url::ParseError> for ScraperError {
    fn from(err: url::ParseError) -> Self {
        ScraperError::InvalidUrl(err.to_string())
    }
}

/// Errors that can occur while loading cookies.
#[derive(Error, Debug)]
pub enum CookieError {
    /// Failed to read or walk the filesystem.
    #[error("Failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),

    /// Cookie file contains an invalid line.
    #[error("Invalid Netscape cookie line: {0}")]
    InvalidLine(String),

    /// Cookie domain could not be converted into a URL.
    #[error("Invalid cookie domain: {0}")]
    InvalidDomain(String),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_detection() {
        assert!(ScraperError::Timeout("read".to_string()).is_timeout());
        assert!(!ScraperError::NotFound("book".to_string()).is_timeout());
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let err: ScraperError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ScraperError::InvalidUrl(_)));
    }
}
