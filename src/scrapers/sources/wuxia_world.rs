//! wuxiaworld.site (Madara theme)

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

const BASE_URL: &str = "https://wuxiaworld.site/";
const CATALOG_URL: &str = "https://wuxiaworld.site/novel/?m_orderby=trending";
const ICON_URL: &str = "https://wuxiaworld.site/wp-content/uploads/2019/04/favicon-1.ico";

const SEARCH_ITEMS: BookListing<'static> = BookListing {
    item: ".c-tabs-item__content",
    link: "a[href]",
    title_attr: "title",
    cover: "img[src]",
};

pub struct WuxiaWorld {
    client: Arc<dyn NetworkClient>,
    last_page: LastPageRule,
}

impl WuxiaWorld {
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self {
            client,
            last_page: LastPageRule::missing_element("div.nav-previous.float-left"),
        }
    }

    /// Replaces the pagination heuristic.
    pub fn with_last_page_rule(mut self, rule: LastPageRule) -> Self {
        self.last_page = rule;
        self
    }

    fn catalog_page_url(index: usize) -> Result<String, ScraperError> {
        let page = index + 1;
        Ok(UrlBuilder::parse(BASE_URL)?
            .add_path(["novel"])
            .add_if(page != 1, |url| url.add_path(["page".to_string(), page.to_string()]))
            .trailing_slash()
            .add("m_orderby", "alphabet")
            .build())
    }

    fn search_url(input: &str) -> Result<String, ScraperError> {
        Ok(UrlBuilder::parse(BASE_URL)?
            .add("s", input.trim())
            .add("post_type", "wp-manga")
            .add("op", "")
            .add("author", "")
            .add("artist", "")
            .add("release", "")
            .add("adult", "")
            .build())
    }

    async fn fetch_listing(
        &self,
        url: &str,
        index: usize,
        listing: &BookListing<'_>,
        last_page: &LastPageRule,
    ) -> Result<PagedList<BookMetadata>, ScraperError> {
        fetch_page_value(self.client.as_ref(), url, |document, base| {
            PagedList::new(
                listing.parse(&document, base),
                index,
                last_page.is_last_page(&document),
            )
        })
        .await
    }
}

#[async_trait]
impl SourceInterface for WuxiaWorld {
    fn id(&self) -> &'static str {
        "wuxia_world"
    }

    fn name(&self) -> &'static str {
        "WuxiaWorld"
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
        let call = madara::chapter_list(self.client.as_ref(), book_url, ".wp-manga-chapter > a[href]");
        try_connect(book_url, call).await
    }
}

#[async_trait]
impl CatalogSource for WuxiaWorld {
    async fn catalog_list(&self, index: usize) -> Response<PagedList<BookMetadata>> {
        try_connect_url(Self::catalog_page_url(index), CATALOG_URL, |url| async move {
            self.fetch_listing(&url, index, &madara::CATALOG_ITEMS, &self.last_page)
                .await
        })
        .await
    }

    async fn catalog_search(&self, index: usize, input: &str) -> Response<PagedList<BookMetadata>> {
        if let Some(empty) = blank_search(index, input) {
            return empty;
        }
        // all matches come back on the first page
        if index > 0 {
            return Response::Success(PagedList::empty(index));
        }
        try_connect_url(Self::search_url(input), input, |url| async move {
            self.fetch_listing(&url, index, &SEARCH_ITEMS, &LastPageRule::Always)
                .await
        })
        .await
    }
}
