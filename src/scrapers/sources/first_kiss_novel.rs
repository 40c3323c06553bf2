//! 1stkissnovel.love (Madara theme)

use super::{BookListing, fetch_page_value, madara};
use crate::error::ScraperError;
use crate::network::{NetworkClient, UrlBuilder, try_connect, try_connect_url};
use crate::paging::PagedList;
use crate::response::Response;
use crate::scrapers::{
    BookMetadata, CatalogSource, ChapterMetadata, LanguageCode, LastPageRule, SourceInterface,
    blank_search,
};
use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;

const BASE_URL: &str = "https://1stkissnovel.love/";
const CATALOG_URL: &str = "https://1stkissnovel.love/novel/?m_orderby=alphabet";
const ICON_URL: &str = "https://1stkissnovel.org/wp-content/uploads/2023/04/cropped-Im-3-32x32.png";

const SEARCH_ITEMS: BookListing<'static> = BookListing {
    item: ".row.c-tabs-item__content",
    link: "a[href]",
    title_attr: "title",
    cover: "img[src]",
};

pub struct FirstKissNovel {
    client: Arc<dyn NetworkClient>,
    last_page: LastPageRule,
}

impl FirstKissNovel {
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self {
            client,
            last_page: LastPageRule::last_child_matches("div.wp-pagenavi", ".current"),
        }
    }

    /// Replaces the pagination heuristic.
    pub fn with_last_page_rule(mut self, rule: LastPageRule) -> Self {
        self.last_page = rule;
        self
    }

    fn catalog_page_url(index: usize) -> Result<String, ScraperError> {
        let page = index + 1;
        if page == 1 {
            return Ok(CATALOG_URL.to_string());
        }
        Ok(UrlBuilder::parse(BASE_URL)?
            .add_path(["novel".to_string(), "page".to_string(), page.to_string()])
            .trailing_slash()
            .add("m_orderby", "alphabet")
            .build())
    }

    fn search_page_url(index: usize, input: &str) -> Result<String, ScraperError> {
        let page = index + 1;
        Ok(UrlBuilder::parse(BASE_URL)?
            .add_if(page != 1, |url| {
                url.add_path(["page".to_string(), page.to_string()]).trailing_slash()
            })
            .add("s", input.trim())
            .add("post_type", "wp-manga")
            .build())
    }

    async fn fetch_listing(
        &self,
        url: &str,
        index: usize,
        listing: &BookListing<'_>,
    ) -> Result<PagedList<BookMetadata>, ScraperError> {
        fetch_page_value(self.client.as_ref(), url, |document, base| {
            PagedList::new(
                listing.parse(&document, base),
                index,
                self.last_page.is_last_page(&document),
            )
        })
        .await
    }
}

#[async_trait]
impl SourceInterface for FirstKissNovel {
    fn id(&self) -> &'static str {
        "1stkissnovel"
    }

    fn name(&self) -> &'static str {
        "1stKissNovel"
    }

    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn catalog_url(&self) -> Option<&'static str> {
        Some(CATALOG_URL)
    }

    fn icon_url(&self) -> Option<&'static str> {
        Some(ICON_URL)
    }

    fn language(&self) -> LanguageCode {
        LanguageCode::English
    }

    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        Some(self)
    }

    fn chapter_title(&self, document: &Html) -> Option<String> {
        madara::chapter_title(document)
    }

    fn chapter_text(&self, document: &Html) -> Result<String, ScraperError> {
        madara::chapter_text(document)
    }

    async fn book_cover_image_url(&self, book_url: &str) -> Response<Option<String>> {
        let call = fetch_page_value(self.client.as_ref(), book_url, |document, base| {
            madara::cover(&document, base)
        });
        try_connect(book_url, call).await
    }

    async fn book_description(&self, book_url: &str) -> Response<Option<String>> {
        let call = fetch_page_value(self.client.as_ref(), book_url, |document, _| {
            madara::description(document)
        });
        try_connect(book_url, call).await
    }

    async fn chapter_list(&self, book_url: &str) -> Response<Vec<ChapterMetadata>> {
        let call = madara::chapter_list(self.client.as_ref(), book_url, ".wp-manga-chapter a[href]");
        try_connect(book_url, call).await
    }
}

#[async_trait]
impl CatalogSource for FirstKissNovel {
    async fn catalog_list(&self, index: usize) -> Response<PagedList<BookMetadata>> {
        try_connect_url(Self::catalog_page_url(index), CATALOG_URL, |url| async move {
            self.fetch_listing(&url, index, &madara::CATALOG_ITEMS).await
        })
        .await
    }

    async fn catalog_search(&self, index: usize, input: &str) -> Response<PagedList<BookMetadata>> {
        if let Some(empty) = blank_search(index, input) {
            return empty;
        }
        try_connect_url(Self::search_page_url(index, input), input, |url| async move {
            self.fetch_listing(&url, index, &SEARCH_ITEMS).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::testing::FakeClient;

    #[test]
    fn test_urls() {
        assert_eq!(FirstKissNovel::catalog_page_url(0).unwrap(), CATALOG_URL);
        assert_eq!(
            FirstKissNovel::catalog_page_url(2).unwrap(),
            "https://1stkissnovel.love/novel/page/3/?m_orderby=alphabet"
        );
        assert_eq!(
            FirstKissNovel::search_page_url(0, "love").unwrap(),
            "https://1stkissnovel.love/?s=love&post_type=wp-manga"
        );
        assert_eq!(
            FirstKissNovel::search_page_url(1, "love").unwrap(),
            "https://1stkissnovel.love/page/2/?s=love&post_type=wp-manga"
        );
    }

    #[tokio::test]
    async fn test_search_pagination() {
        let client = Arc::new(
            FakeClient::new()
                .with_page(
                    "https://1stkissnovel.love/?s=love&post_type=wp-manga",
                    r#"<div class="row c-tabs-item__content"><a href="https://1stkissnovel.love/novel/first-love/" title="First Love"><img src="/c.png"></a></div>
                       <div class="wp-pagenavi"><span class="current">1</span><a href="/page/2/?s=love">2</a></div>"#,
                )
                .with_page(
                    "https://1stkissnovel.love/page/2/?s=love&post_type=wp-manga",
                    r#"<div class="row c-tabs-item__content"><a href="https://1stkissnovel.love/novel/last-love/" title="Last Love"></a></div>
                       <div class="wp-pagenavi"><a href="/?s=love">1</a><span class="current">2</span></div>"#,
                ),
        );
        let source = FirstKissNovel::new(client.clone());

        let first = source.catalog_search(0, "love").await.ok().unwrap();
        assert_eq!(first.list[0].title, "First Love");
        assert_eq!(first.list[0].cover_image_url, "https://1stkissnovel.love/c.png");
        assert!(!first.is_last_page);

        let second = source.catalog_search(1, "love").await.ok().unwrap();
        assert_eq!(second.list[0].title, "Last Love");
        assert!(second.is_last_page);

        assert_eq!(source.catalog_search(5, "").await.ok().unwrap(), PagedList::empty(5));
        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn test_catalog_without_pagination_is_last() {
        let client = Arc::new(FakeClient::new().with_page(
            CATALOG_URL,
            r#"<div class="page-item-detail"><a href="/novel/a/" title="A"></a></div>"#,
        ));
        let source = FirstKissNovel::new(client);

        let page = source.catalog_list(0).await.ok().unwrap();
        assert_eq!(page.list[0].url, "https://1stkissnovel.love/novel/a/");
        assert!(page.is_last_page);
    }

    #[tokio::test]
    async fn test_chapter_list_via_post() {
        let client = Arc::new(FakeClient::new().with_page(
            "https://1stkissnovel.love/novel/first-love/ajax/chapters",
            r#"<li class="wp-manga-chapter"><span><a href="/novel/first-love/chapter-2/">Chapter 2</a></span></li>
               <li class="wp-manga-chapter"><span><a href="/novel/first-love/chapter-1/">Chapter 1</a></span></li>"#,
        ));
        let source = FirstKissNovel::new(client.clone());

        let chapters = source
            .chapter_list("https://1stkissnovel.love/novel/first-love/")
            .await
            .ok()
            .unwrap();
        assert_eq!(
            chapters,
            vec![
                ChapterMetadata::new("Chapter 1", "https://1stkissnovel.love/novel/first-love/chapter-1/"),
                ChapterMetadata::new("Chapter 2", "https://1stkissnovel.love/novel/first-love/chapter-2/"),
            ]
        );
        assert_eq!(client.requests()[0].method, "POST");
    }

    #[tokio::test]
    async fn test_chapter_list_failure_is_error() {
        let client = Arc::new(FakeClient::new());
        let source = FirstKissNovel::new(client);

        let response = source.chapter_list("https://1stkissnovel.love/novel/blocked/").await;
        let message = response.error_message().unwrap();
        assert!(message.contains("Info:\nhttps://1stkissnovel.love/novel/blocked/"));
    }
}
