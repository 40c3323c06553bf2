//! bestlightnovel.com

use super::{BookListing, content_text, description_text, fetch_chapter_list, fetch_page_value, image_src};
use crate::error::ScraperError;
use crate::network::{NetworkClient, UrlBuilder, try_connect, try_connect_url};
use crate::paging::PagedList;
use crate::response::Response;
use crate::scrapers::{
    BookMetadata, CatalogSource, ChapterMetadata, LanguageCode, LastPageRule, SourceInterface,
    blank_search,
};
use async_trait::async_trait;
use reqwest::Method;
use scraper::Html;
use std::sync::Arc;

const BASE_URL: &str = "https://bestlightnovel.com/";
const CATALOG_URL: &str = "https://bestlightnovel.com/novel_list";

const BOOK_ITEMS: BookListing<'static> = BookListing {
    item: ".update_item.list_category",
    link: "a[href]",
    title_attr: "title",
    cover: "img[src]",
};

pub struct BestLightNovel {
    client: Arc<dyn NetworkClient>,
    last_page: LastPageRule,
}

impl BestLightNovel {
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self {
            client,
            last_page: LastPageRule::second_to_last_child_matches("div.phan-trang", ".pageselect"),
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
            .add_if(page != 1, |url| {
                url.add("type", "newest")
                    .add("category", "all")
                    .add("state", "all")
                    .add("page", page)
            })
            .build())
    }

    fn search_page_url(index: usize, input: &str) -> Result<String, ScraperError> {
        let page = index + 1;
        Ok(UrlBuilder::parse(BASE_URL)?
            .add_path(["search_novels", input.trim().replace(' ', "_").as_str()])
            .add_if(page != 1, |url| url.add("page", page))
            .build())
    }

    async fn fetch_books(&self, url: &str, index: usize) -> Result<PagedList<BookMetadata>, ScraperError> {
        fetch_page_value(self.client.as_ref(), url, |document, base| {
            self.parse_books(&document, base, index)
        })
        .await
    }

    fn parse_books(&self, document: &Html, base: &str, index: usize) -> PagedList<BookMetadata> {
        PagedList::new(
            BOOK_ITEMS.parse(document, base),
            index,
            self.last_page.is_last_page(document),
        )
    }
}

#[async_trait]
impl SourceInterface for BestLightNovel {
    fn id(&self) -> &'static str {
        "best_light_novel"
    }

    fn name(&self) -> &'static str {
        "BestLightNovel"
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
        content_text(document, &["#vung_doc"])
    }

    async fn book_cover_image_url(&self, book_url: &str) -> Response<Option<String>> {
        let call = fetch_page_value(self.client.as_ref(), book_url, |document, base| {
            image_src(&document, ".info_image > img[src]", base)
        });
        try_connect(book_url, call).await
    }

    async fn book_description(&self, book_url: &str) -> Response<Option<String>> {
        let call = fetch_page_value(self.client.as_ref(), book_url, |document, _| {
            description_text(document, "#noidungm", &["h2"])
        });
        try_connect(book_url, call).await
    }

    async fn chapter_list(&self, book_url: &str) -> Response<Vec<ChapterMetadata>> {
        let call = fetch_chapter_list(
            self.client.as_ref(),
            Method::GET,
            book_url,
            "div.chapter-list a[href]",
            true,
        );
        try_connect(book_url, call).await
    }
}

#[async_trait]
impl CatalogSource for BestLightNovel {
    async fn catalog_list(&self, index: usize) -> Response<PagedList<BookMetadata>> {
        try_connect_url(Self::catalog_page_url(index), CATALOG_URL, |url| async move {
            self.fetch_books(&url, index).await
        })
        .await
    }

    async fn catalog_search(&self, index: usize, input: &str) -> Response<PagedList<BookMetadata>> {
        if let Some(empty) = blank_search(index, input) {
            return empty;
        }
        try_connect_url(Self::search_page_url(index, input), input, |url| async move {
            self.fetch_books(&url, index).await
        })
        .await
    }
}
