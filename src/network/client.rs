//! reqwest-backed [`NetworkClient`] shared by the whole process.

use super::{DEFAULT_USER_AGENT, HttpPage, NetworkClient, ResponseCache, decode_body, rate_limit};
use crate::config::NetworkConfig;
use crate::error::ScraperError;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderValue, LOCATION, USER_AGENT};
use reqwest::{Method, StatusCode, redirect};
use std::sync::Arc;
use std::time::Duration;

/// Hook run on every outgoing request before it is sent.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: &mut reqwest::Request);
}

/// Sets a browser user agent unless the request already carries one.
pub struct UserAgentInterceptor {
    value: HeaderValue,
}

impl UserAgentInterceptor {
    pub fn new(user_agent: &str) -> Self {
        let value = HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
        Self { value }
    }
}

impl RequestInterceptor for UserAgentInterceptor {
    fn intercept(&self, request: &mut reqwest::Request) {
        if !request.headers().contains_key(USER_AGENT) {
            request.headers_mut().insert(USER_AGENT, self.value.clone());
        }
    }
}

/// Production HTTP client: shared cookie jar, optional disk cache, permissive
/// TLS for sites with broken certificate chains.
pub struct ScraperNetworkClient {
    client: reqwest::Client,
    client_with_redirects: reqwest::Client,
    cache: Option<ResponseCache>,
    interceptors: Vec<Box<dyn RequestInterceptor>>,
    delay_between_requests_sec: f64,
}

impl ScraperNetworkClient {
    /// Builds the client from configuration.
    pub fn new(config: &NetworkConfig, cache: Option<ResponseCache>) -> Result<Self, ScraperError> {
        let cookie_jar = Arc::new(Jar::default());
        if let Some(dir) = &config.cookies_directory {
            match super::load_cookie_directory(dir, &cookie_jar) {
                Ok(count) => tracing::debug!(count, dir = %dir.display(), "loaded cookies"),
                Err(err) => tracing::warn!(dir = %dir.display(), error = %err, "failed to load cookies"),
            }
        }

        let builder = || {
            reqwest::Client::builder()
                .cookie_provider(cookie_jar.clone())
                .connect_timeout(Duration::from_secs(config.connect_timeout_sec))
                .read_timeout(Duration::from_secs(config.read_timeout_sec))
                .danger_accept_invalid_certs(config.accept_invalid_certs)
                .gzip(true)
                .brotli(true)
        };

        let client = builder().redirect(redirect::Policy::none()).build()?;
        let client_with_redirects = builder().redirect(redirect::Policy::limited(10)).build()?;

        Ok(Self {
            client,
            client_with_redirects,
            cache,
            interceptors: vec![Box::new(UserAgentInterceptor::new(&config.user_agent))],
            delay_between_requests_sec: config.delay_between_requests_sec,
        })
    }

    async fn execute(
        &self,
        request: reqwest::Request,
        follow_redirects: bool,
    ) -> Result<HttpPage, ScraperError> {
        let client = if follow_redirects {
            &self.client_with_redirects
        } else {
            &self.client
        };

        let url = request.url().to_string();
        let response = client.execute(request).await.map_err(|err| {
            if err.is_timeout() {
                ScraperError::Timeout(format!("{} ({})", url, err))
            } else {
                ScraperError::HttpError(err)
            }
        })?;

        let status = response.status();
        tracing::debug!(url = %url, status = status.as_u16(), "response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::RateLimited(url));
        }
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Err(ScraperError::Redirected {
                status: status.as_u16(),
                url,
                location,
            });
        }
        if !status.is_success() {
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        Ok(HttpPage {
            url: final_url,
            status: status.as_u16(),
            body: decode_body(&bytes, content_type.as_deref()),
        })
    }
}

/// Cache key for a GET: the redirect mode, any hand-set cookie and the URL.
/// Other methods aren't cached.
fn cache_key(request: &reqwest::Request, follow_redirects: bool) -> Option<String> {
    if request.method() != Method::GET {
        return None;
    }
    let mode = if follow_redirects { "follow" } else { "direct" };
    let cookie = request
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Some(format!("{} {} {}", mode, cookie, request.url()))
}

#[async_trait]
impl NetworkClient for ScraperNetworkClient {
    async fn call(
        &self,
        mut request: reqwest::Request,
        follow_redirects: bool,
    ) -> Result<HttpPage, ScraperError> {
        for interceptor in &self.interceptors {
            interceptor.intercept(&mut request);
        }

        let cache_key = cache_key(&request, follow_redirects);
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key)
            && let Some(page) = cache.get(key).await
        {
            return Ok(page);
        }

        rate_limit(self.delay_between_requests_sec).await;
        tracing::debug!(method = %request.method(), url = %request.url(), "request");
        let page = self.execute(request, follow_redirects).await?;

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key)
            && (200..300).contains(&page.status)
            && let Err(err) = cache.put(key, &page).await
        {
            tracing::warn!(url = %key, error = %err, "failed to cache response");
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::get_request;
    use crate::network::testing::redirect_server;

    #[test]
    fn test_user_agent_interceptor_respects_existing_header() {
        let interceptor = UserAgentInterceptor::new("shiori-test");

        let mut request = get_request("https://example.com/").unwrap();
        interceptor.intercept(&mut request);
        assert_eq!(request.headers()[USER_AGENT], "shiori-test");

        let mut request = get_request("https://example.com/").unwrap();
        request
            .headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static("custom"));
        interceptor.intercept(&mut request);
        assert_eq!(request.headers()[USER_AGENT], "custom");
    }

    #[test]
    fn test_cache_key_separates_redirect_mode_and_cookie() {
        let plain = get_request("https://ncode.syosetu.com/n1234ab/").unwrap();
        let direct = cache_key(&plain, false).unwrap();
        let followed = cache_key(&plain, true).unwrap();
        assert_ne!(direct, followed);
        assert!(direct.ends_with("https://ncode.syosetu.com/n1234ab/"));

        let mut with_cookie = get_request("https://ncode.syosetu.com/n1234ab/").unwrap();
        with_cookie
            .headers_mut()
            .insert(COOKIE, HeaderValue::from_static("over18=yes"));
        assert_ne!(cache_key(&with_cookie, true).unwrap(), followed);

        let post = reqwest::Request::new(Method::POST, plain.url().clone());
        assert_eq!(cache_key(&post, false), None);
    }

    #[tokio::test]
    async fn test_redirect_without_following_is_an_error() {
        let url = redirect_server("https://example.com/moved").await;
        let client = ScraperNetworkClient::new(&NetworkConfig::default(), None).unwrap();

        let err = client.get(&url).await.unwrap_err();
        match err {
            ScraperError::Redirected { status, location, .. } => {
                assert_eq!(status, 301);
                assert_eq!(location.as_deref(), Some("https://example.com/moved"));
            }
            other => panic!("expected redirect error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cached_page_not_served_across_redirect_modes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), 1 << 20, Duration::from_secs(3600));
        let url = redirect_server("https://example.com/moved").await;
        let direct_key = format!("direct  {}", url);
        let page = HttpPage {
            url: url.clone(),
            status: 200,
            body: "<p>cached</p>".to_string(),
        };
        cache.put(&format!("follow  {}", url), &page).await.unwrap();

        let client = ScraperNetworkClient::new(&NetworkConfig::default(), Some(cache.clone())).unwrap();
        let followed = client.call(get_request(&url).unwrap(), true).await.unwrap();
        assert_eq!(followed.body, "<p>cached</p>");

        assert!(client.get(&url).await.is_err());
        assert!(cache.get(&direct_key).await.is_none());
    }

    #[test]
    fn test_client_builds_from_default_config() {
        let client = ScraperNetworkClient::new(&NetworkConfig::default(), None);
        assert!(client.is_ok());
    }
}
