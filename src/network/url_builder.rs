//! Safe URL construction on top of `url::Url`.
//!
//! Bases may or may not end in `/` and may already carry a query string;
//! path segments and query pairs are appended without disturbing either.

use crate::error::ScraperError;
use std::fmt;
use url::Url;

/// Builder for absolute URLs with ordered path segments and query pairs.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    url: Url,
}

impl UrlBuilder {
    /// Parses `base` into a builder.
    pub fn parse(base: &str) -> Result<Self, ScraperError> {
        let url = Url::parse(base.trim())?;
        if url.cannot_be_a_base() {
            return Err(ScraperError::InvalidUrl(base.to_string()));
        }
        Ok(Self { url })
    }

    /// Appends path segments. Each segment is percent-encoded as a whole,
    /// so `/` inside a segment doesn't create extra levels.
    pub fn add_path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Ok(mut path) = self.url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }
        self
    }

    /// Appends a query pair. Keys may repeat; order is preserved.
    pub fn add(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.url
            .query_pairs_mut()
            .append_pair(key, &value.to_string());
        self
    }

    /// Applies `f` only when `condition` holds.
    pub fn add_if(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition { f(self) } else { self }
    }

    /// Makes the path end in `/` (some sites 404 without it).
    pub fn trailing_slash(mut self) -> Self {
        if !self.url.path().ends_with('/') {
            if let Ok(mut path) = self.url.path_segments_mut() {
                path.push("");
            }
        }
        self
    }

    pub fn build(&self) -> String {
        self.url.to_string()
    }
}

impl fmt::Display for UrlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Resolves a possibly relative link against the page it was found on.
pub fn resolve_url(base: &str, relative: &str) -> String {
    if relative.starts_with("http://") || relative.starts_with("https://") {
        return relative.to_string();
    }

    match Url::parse(base).and_then(|base_url| base_url.join(relative)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => {
            let base = base.trim_end_matches('/');
            format!("{}/{}", base, relative.trim_start_matches('/'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_path_with_and_without_trailing_slash() {
        let with = UrlBuilder::parse("https://bestlightnovel.com/")
            .unwrap()
            .add_path(["search_novels", "solo_leveling"]);
        let without = UrlBuilder::parse("https://bestlightnovel.com")
            .unwrap()
            .add_path(["search_novels", "solo_leveling"]);

        assert_eq!(with.build(), "https://bestlightnovel.com/search_novels/solo_leveling");
        assert_eq!(with.build(), without.build());
    }

    #[test]
    fn test_add_path_keeps_existing_query() {
        let url = UrlBuilder::parse("https://wuxiaworld.site/novel/?m_orderby=trending")
            .unwrap()
            .add_path(["page", "2"]);
        assert_eq!(
            url.build(),
            "https://wuxiaworld.site/novel/page/2?m_orderby=trending"
        );
    }

    #[test]
    fn test_query_pairs_are_ordered_and_encoded() {
        let url = UrlBuilder::parse("https://example.com/search")
            .unwrap()
            .add("s", "martial god")
            .add("post_type", "wp-manga")
            .add("s", "again");
        assert_eq!(
            url.build(),
            "https://example.com/search?s=martial+god&post_type=wp-manga&s=again"
        );
    }

    #[test]
    fn test_add_if() {
        let first = UrlBuilder::parse("https://example.com/list")
            .unwrap()
            .add_if(false, |b| b.add("page", 1));
        let second = UrlBuilder::parse("https://example.com/list")
            .unwrap()
            .add_if(true, |b| b.add("page", 2));
        assert_eq!(first.build(), "https://example.com/list");
        assert_eq!(second.build(), "https://example.com/list?page=2");
    }

    #[test]
    fn test_trailing_slash() {
        let url = UrlBuilder::parse("https://www.mtlnovel.com/some-book/")
            .unwrap()
            .add_path(["chapter-list"])
            .trailing_slash();
        assert_eq!(url.build(), "https://www.mtlnovel.com/some-book/chapter-list/");

        let already = UrlBuilder::parse("https://example.com/a/").unwrap().trailing_slash();
        assert_eq!(already.build(), "https://example.com/a/");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(UrlBuilder::parse("not a url").is_err());
        assert!(UrlBuilder::parse("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://ncode.syosetu.com/n1234ab/", "/n1234ab/2/"),
            "https://ncode.syosetu.com/n1234ab/2/"
        );
        assert_eq!(
            resolve_url("https://ncode.syosetu.com/n1234ab/", "2/"),
            "https://ncode.syosetu.com/n1234ab/2/"
        );
        assert_eq!(
            resolve_url("https://ncode.syosetu.com/n1234ab/", "https://other.com/page"),
            "https://other.com/page"
        );
    }
}
