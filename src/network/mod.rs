//! HTTP plumbing shared by every adapter.
//!
//! Adapters depend only on the [`NetworkClient`] trait; the process builds a
//! single [`ScraperNetworkClient`] at startup and hands an `Arc` of it to each
//! adapter constructor.

mod cache;
mod client;
mod connect;
mod cookies;
mod decode;
mod url_builder;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::ResponseCache;
pub use client::{RequestInterceptor, ScraperNetworkClient, UserAgentInterceptor};
pub use connect::{try_connect, try_connect_url, try_flat_connect};
pub use cookies::load_cookie_directory;
pub use decode::decode_body;
pub use url_builder::{UrlBuilder, resolve_url};

use crate::error::ScraperError;
use async_trait::async_trait;
use reqwest::Method;
use scraper::Html;
use std::time::Duration;
use url::Url;

/// Browser user agent sent to sites that reject obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A fetched page with its body already decoded to text.
#[derive(Debug, Clone)]
pub struct HttpPage {
    /// Final URL after any redirects.
    pub url: String,

    /// HTTP status code.
    pub status: u16,

    /// Decoded response body.
    pub body: String,
}

impl HttpPage {
    /// Parses the body as an HTML document.
    ///
    /// `Html` isn't `Send`; parse after the last `.await` of a call.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// HTTP client contract used by every source and database adapter.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Executes a prepared request.
    async fn call(
        &self,
        request: reqwest::Request,
        follow_redirects: bool,
    ) -> Result<HttpPage, ScraperError>;

    /// Issues a plain GET without following redirects.
    async fn get(&self, url: &str) -> Result<HttpPage, ScraperError> {
        self.call(get_request(url)?, false).await
    }
}

/// Builds a GET request for `url`.
pub fn get_request(url: &str) -> Result<reqwest::Request, ScraperError> {
    Ok(reqwest::Request::new(Method::GET, Url::parse(url)?))
}

/// Applies a politeness delay between requests.
pub async fn rate_limit(delay_sec: f64) {
    if delay_sec > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(delay_sec)).await;
    }
}
