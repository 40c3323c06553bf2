//! mtlnovel.com
//!
//! Search goes through the site's AMP autosuggest endpoint, which answers
//! JSON with a single page of matches.

use super::{BookListing, content_text, description_text, fetch_chapter_list, fetch_page_value, image_src};
use crate::error::ScraperError;
use crate::network::{NetworkClient, UrlBuilder, try_connect, try_connect_url};
use crate::paging::PagedList;
use crate::response::Response;
use crate::scrapers::dom::collapse_whitespace;
use crate::scrapers::{
    BookMetadata, CatalogSource, ChapterMetadata, LanguageCode, LastPageRule, SourceInterface,
    blank_search,
};
use async_trait::async_trait;
use reqwest::Method;
use scraper::Html;
use serde::Deserialize;
use std::sync::Arc;

const BASE_URL: &str = "https://www.mtlnovel.com/";
const CATALOG_URL: &str = "https://www.mtlnovel.com/alltime-rank/";
const SEARCH_URL: &str = "https://www.mtlnovel.com/wp-admin/admin-ajax.php";

const BOOK_ITEMS: BookListing<'static> = BookListing {
    item: ".box.wide",
    link: "a.list-title[href]",
    title_attr: "aria-label",
    cover: "amp-img[src]",
};

#[derive(Debug, Deserialize)]
struct Autosuggest {
    #[serde(default)]
    items: Vec<AutosuggestGroup>,
}

#[derive(Debug, Deserialize)]
struct AutosuggestGroup {
    #[serde(default)]
    results: Vec<AutosuggestResult>,
}

#[derive(Debug, Deserialize)]
struct AutosuggestResult {
    /// HTML with the matched part highlighted.
    title: String,
    permalink: String,
    #[serde(default)]
    thumbnail: String,
}

pub struct MtlNovel {
    client: Arc<dyn NetworkClient>,
    last_page: LastPageRule,
}

impl MtlNovel {
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self {
            client,
            last_page: LastPageRule::last_child_matches("div#pagination", "span"),
        }
    }

    /// Replaces the pagination heuristic.
    pub fn with_last_page_rule(mut self, rule: LastPageRule) -> Self {
        self.last_page = rule;
        self
    }

    fn catalog_page_url(index: usize) -> Result<String, ScraperError> {
        let page = index + 1;
        Ok(UrlBuilder::parse(CATALOG_URL)?
            .add_if(page != 1, |url| url.add_path(["page".to_string(), page.to_string()]))
            .build())
    }

    fn search_url(input: &str) -> Result<String, ScraperError> {
        Ok(UrlBuilder::parse(SEARCH_URL)?
            .add("action", "autosuggest")
            .add("q", input.trim())
            .add("__amp_source_origin", "https://www.mtlnovel.com")
            .build())
    }

    fn chapter_list_url(book_url: &str) -> Result<String, ScraperError> {
        Ok(UrlBuilder::parse(book_url)?
            .add_path(["chapter-list"])
            .trailing_slash()
            .build())
    }

    async fn fetch_catalog(&self, url: &str, index: usize) -> Result<PagedList<BookMetadata>, ScraperError> {
        fetch_page_value(self.client.as_ref(), url, |document, base| {
            PagedList::new(
                BOOK_ITEMS.parse(&document, base),
                index,
                self.last_page.is_last_page(&document),
            )
        })
        .await
    }

    async fn fetch_search(&self, url: &str, index: usize) -> Result<PagedList<BookMetadata>, ScraperError> {
        let page = self.client.get(url).await?;
        let books = parse_autosuggest(&page.body)?;
        Ok(PagedList::new(books, index, true))
    }

    async fn fetch_chapters(&self, book_url: &str) -> Result<Vec<ChapterMetadata>, ScraperError> {
        let url = Self::chapter_list_url(book_url)?;
        fetch_chapter_list(self.client.as_ref(), Method::GET, &url, "a.ch-link[href]", true).await
    }
}

fn parse_autosuggest(body: &str) -> Result<Vec<BookMetadata>, ScraperError> {
    let response: Autosuggest = serde_json::from_str(body)?;
    let Some(group) = response.items.into_iter().next() else {
        return Ok(Vec::new());
    };

    Ok(group
        .results
        .into_iter()
        .map(|result| {
            let title = Html::parse_fragment(&result.title)
                .root_element()
                .text()
                .collect::<String>();
            BookMetadata::new(collapse_whitespace(&title), result.permalink, result.thumbnail)
        })
        .collect())
}

#[async_trait]
impl SourceInterface for MtlNovel {
    fn id(&self) -> &'static str {
        "mtlnovel"
    }

    fn name(&self) -> &'static str {
        "MTLNovel"
    }

    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn catalog_url(&self) -> Option<&'static str> {
        Some(CATALOG_URL)
    }

    fn language(&self) -> LanguageCode {
        LanguageCode::English
    }

    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        Some(self)
    }

    fn chapter_text(&self, document: &Html) -> Result<String, ScraperError> {
        content_text(document, &[".par.fontsize-16"])
    }

    async fn book_cover_image_url(&self, book_url: &str) -> Response<Option<String>> {
        let call = fetch_page_value(self.client.as_ref(), book_url, |document, base| {
            image_src(&document, "amp-img.main-tmb[src]", base)
        });
        try_connect(book_url, call).await
    }

    async fn book_description(&self, book_url: &str) -> Response<Option<String>> {
        let call = fetch_page_value(self.client.as_ref(), book_url, |document, _| {
            description_text(document, ".desc", &["h2", "p.descr"])
        });
        try_connect(book_url, call).await
    }

    async fn chapter_list(&self, book_url: &str) -> Response<Vec<ChapterMetadata>> {
        try_connect(book_url, self.fetch_chapters(book_url)).await
    }
}

#[async_trait]
impl CatalogSource for MtlNovel {
    async fn catalog_list(&self, index: usize) -> Response<PagedList<BookMetadata>> {
        try_connect_url(Self::catalog_page_url(index), CATALOG_URL, |url| async move {
            self.fetch_catalog(&url, index).await
        })
        .await
    }

    async fn catalog_search(&self, index: usize, input: &str) -> Response<PagedList<BookMetadata>> {
        if let Some(empty) = blank_search(index, input) {
            return empty;
        }
        // autosuggest has no paging
        if index > 0 {
            return Response::Success(PagedList::empty(index));
        }
        try_connect_url(Self::search_url(input), SEARCH_URL, |url| async move {
            self.fetch_search(&url, index).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::testing::FakeClient;

    const SEARCH: &str = "https://www.mtlnovel.com/wp-admin/admin-ajax.php?action=autosuggest&q=sword+god&__amp_source_origin=https%3A%2F%2Fwww.mtlnovel.com";

    const CATALOG_PAGE: &str = r#"
        <html><body>
          <div class="box wide">
            <a class="list-title" href="https://www.mtlnovel.com/sword-god/" aria-label="Sword God">Sword God</a>
            <amp-img src="https://www.mtlnovel.com/covers/sword.jpg"></amp-img>
          </div>
          <div class="box wide"><span>advert</span></div>
          <div id="pagination"><span class="current">1</span><a href="/page/2/">2</a><a href="/page/2/">Next</a></div>
        </body></html>
    "#;

    const CHAPTER_LIST_PAGE: &str = r#"
        <html><body>
          <a class="ch-link" href="https://www.mtlnovel.com/sword-god/chapter-2/">Chapter 2</a>
          <a class="ch-link" href="https://www.mtlnovel.com/sword-god/chapter-1/">Chapter 1</a>
        </body></html>
    "#;

    #[test]
    fn test_urls() {
        assert_eq!(MtlNovel::catalog_page_url(0).unwrap(), CATALOG_URL);
        assert_eq!(
            MtlNovel::catalog_page_url(4).unwrap(),
            "https://www.mtlnovel.com/alltime-rank/page/5"
        );
        assert_eq!(MtlNovel::search_url("sword god").unwrap(), SEARCH);
        assert_eq!(
            MtlNovel::chapter_list_url("https://www.mtlnovel.com/sword-god/").unwrap(),
            "https://www.mtlnovel.com/sword-god/chapter-list/"
        );
        assert_eq!(
            MtlNovel::chapter_list_url("https://www.mtlnovel.com/sword-god").unwrap(),
            "https://www.mtlnovel.com/sword-god/chapter-list/"
        );
    }

    #[tokio::test]
    async fn test_catalog_list() {
        let client = Arc::new(FakeClient::new().with_page(CATALOG_URL, CATALOG_PAGE));
        let source = MtlNovel::new(client.clone());

        let page = source.catalog_list(0).await.ok().unwrap();
        assert_eq!(
            page.list,
            vec![BookMetadata::new(
                "Sword God",
                "https://www.mtlnovel.com/sword-god/",
                "https://www.mtlnovel.com/covers/sword.jpg"
            )]
        );
        assert!(!page.is_last_page);
    }

    #[tokio::test]
    async fn test_search_parses_autosuggest_json() {
        let body = r#"{"items":[{"results":[
            {"title":"<strong>Sword</strong> God","permalink":"https://www.mtlnovel.com/sword-god/","thumbnail":"https://www.mtlnovel.com/t.jpg"},
            {"title":"Godly <strong>Sword</strong>","permalink":"https://www.mtlnovel.com/godly-sword/"}
        ]}]}"#;
        let client = Arc::new(FakeClient::new().with_page(SEARCH, body));
        let source = MtlNovel::new(client.clone());

        let page = source.catalog_search(0, "sword god").await.ok().unwrap();
        assert!(page.is_last_page);
        assert_eq!(page.list[0].title, "Sword God");
        assert_eq!(page.list[1].title, "Godly Sword");
        assert_eq!(page.list[1].cover_image_url, "");

        // only one page of suggestions exists
        let next = source.catalog_search(1, "sword god").await.ok().unwrap();
        assert_eq!(next, PagedList::empty(1));
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_search_rejects_malformed_json() {
        let client = Arc::new(FakeClient::new().with_page(SEARCH, "<html>blocked</html>"));
        let source = MtlNovel::new(client);

        let response = source.catalog_search(0, "sword god").await;
        assert!(response.error_message().unwrap().starts_with("Unknown error."));
    }

    #[tokio::test]
    async fn test_blank_search_skips_network() {
        let client = Arc::new(FakeClient::new());
        let source = MtlNovel::new(client.clone());

        assert_eq!(source.catalog_search(0, "").await.ok().unwrap(), PagedList::empty(0));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_chapter_list_reversed() {
        let client = Arc::new(FakeClient::new().with_page(
            "https://www.mtlnovel.com/sword-god/chapter-list/",
            CHAPTER_LIST_PAGE,
        ));
        let source = MtlNovel::new(client.clone());

        let chapters = source
            .chapter_list("https://www.mtlnovel.com/sword-god/")
            .await
            .ok()
            .unwrap();
        assert_eq!(chapters[0].title, "Chapter 1");
        assert_eq!(chapters[1].url, "https://www.mtlnovel.com/sword-god/chapter-2/");
    }

    #[tokio::test]
    async fn test_description_strips_headings() {
        let book_url = "https://www.mtlnovel.com/sword-god/";
        let client = Arc::new(FakeClient::new().with_page(
            book_url,
            r#"<div class="desc"><h2>Synopsis</h2><p class="descr">Rating</p><p>The sword awakens.</p></div>"#,
        ));
        let source = MtlNovel::new(client);

        assert_eq!(
            source.book_description(book_url).await.ok().unwrap().as_deref(),
            Some("The sword awakens.")
        );
        assert!(matches!(source.book_cover_image_url(book_url).await, Response::Success(None)));
    }
}
