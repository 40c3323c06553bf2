//! Syosetu (ncode.syosetu.com / novel18.syosetu.com) source.
//!
//! Chapter indexes are paged and listed oldest-first. One-shot stories have
//! no index; their text sits on the book page itself.

use super::{chapter_links, content_text};
use crate::error::ScraperError;
use crate::network::{NetworkClient, get_request, resolve_url, try_connect};
use crate::response::Response;
use crate::scrapers::dom::{DomQuery, ElementExt};
use crate::scrapers::{ChapterMetadata, LanguageCode, SourceInterface, TextExtractor};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{COOKIE, HeaderValue};
use scraper::Html;
use std::sync::{Arc, LazyLock};

const BASE_URL: &str = "https://ncode.syosetu.com/";

/// Safety limit on index pages followed for one book.
const MAX_INDEX_PAGES: usize = 100;

/// Extracts the book URL (`https://host/nXXXXxx/`) from any book or chapter URL.
static BOOK_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://[\w.]+/n[a-z0-9]+)").unwrap());

const TITLE: &[&str] = &[".p-novel__title", "p.novel_title"];
const CHAPTER_LINKS: &[&str] = &[".p-eplist__sublist > a", ".novel_sublist2 > dd > a"];
const CONTENT: &[&str] = &[
    ".p-novel__text.js-novel-text:not(.p-novel__text--preface):not(.p-novel__text--afterword)",
    "#novel_honbun",
];
const CHAPTER_TITLE: &[&str] = &[".p-novel__title--rensai", ".novel_subtitle"];
const SUMMARY: &[&str] = &["#novel_ex", ".p-novel__summary"];

/// One page of a chapter index.
struct IndexPage {
    title: Option<String>,
    chapters: Vec<ChapterMetadata>,
    next_page: Option<String>,
    is_oneshot: bool,
}

pub struct Syosetu {
    client: Arc<dyn NetworkClient>,
}

impl Syosetu {
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self { client }
    }

    /// Normalizes a book or chapter URL to the book URL with a trailing slash.
    fn book_url(url: &str) -> Result<String, ScraperError> {
        BOOK_URL_REGEX
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| format!("{}/", m.as_str()))
            .ok_or_else(|| ScraperError::InvalidUrl(format!("not a Syosetu book URL: {}", url)))
    }

    /// GETs `url` with the age-confirmation cookie novel18 expects.
    async fn fetch(&self, url: &str) -> Result<(String, String), ScraperError> {
        let mut request = get_request(url)?;
        request
            .headers_mut()
            .insert(COOKIE, HeaderValue::from_static("over18=yes"));
        let page = self.client.call(request, true).await?;
        Ok((page.url, page.body))
    }

    async fn fetch_chapters(&self, url: &str) -> Result<Vec<ChapterMetadata>, ScraperError> {
        let book_url = Self::book_url(url)?;
        let mut chapters = Vec::new();
        let mut current_url = book_url.clone();

        for page_count in 1..=MAX_INDEX_PAGES {
            let (final_url, body) = self.fetch(&current_url).await?;
            let page = parse_index_page(&body, &final_url);

            if page_count == 1 && page.chapters.is_empty() {
                if page.is_oneshot {
                    let title = page.title.unwrap_or_default();
                    return Ok(vec![ChapterMetadata::new(title, book_url)]);
                }
                return Ok(Vec::new());
            }
            chapters.extend(page.chapters);

            match page.next_page {
                Some(next) => current_url = next,
                None => break,
            }
        }

        tracing::debug!(book = %book_url, count = chapters.len(), "syosetu chapter index");
        Ok(chapters)
    }

    async fn fetch_description(&self, url: &str) -> Result<Option<String>, ScraperError> {
        let book_url = Self::book_url(url)?;
        let (_, body) = self.fetch(&book_url).await?;
        let document = Html::parse_document(&body);
        Ok(SUMMARY
            .iter()
            .find_map(|selector| document.select_first(selector))
            .map(TextExtractor::get))
    }
}

fn parse_index_page(body: &str, page_url: &str) -> IndexPage {
    let document = Html::parse_document(body);

    let title = TITLE
        .iter()
        .filter_map(|selector| document.select_first(selector))
        .map(|el| el.text_content())
        .find(|title| !title.is_empty());

    let chapters = CHAPTER_LINKS
        .iter()
        .map(|selector| chapter_links(&document, selector, page_url))
        .find(|links| !links.is_empty())
        .unwrap_or_default();

    let is_oneshot = CONTENT
        .iter()
        .any(|selector| document.select_first(selector).is_some());

    IndexPage {
        title,
        chapters,
        next_page: find_next_page(&document, page_url),
        is_oneshot,
    }
}

fn find_next_page(document: &Html, page_url: &str) -> Option<String> {
    if let Some(next) = document.select_first(".c-pager__item--next")
        && let Some(href) = next.abs_attr("href", page_url)
    {
        return Some(href);
    }

    // older layout: a plain link labelled 次へ
    document
        .select_all("a[href]")
        .into_iter()
        .find(|link| {
            let text = link.text_content();
            text.contains("次へ") || text.contains("次ページ")
        })
        .and_then(|link| link.value().attr("href"))
        .map(|href| resolve_url(page_url, href))
}

#[async_trait]
impl SourceInterface for Syosetu {
    fn id(&self) -> &'static str {
        "syosetu"
    }

    fn name(&self) -> &'static str {
        "Syosetu"
    }

    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn language(&self) -> LanguageCode {
        LanguageCode::Japanese
    }

    fn chapter_title(&self, document: &Html) -> Option<String> {
        CHAPTER_TITLE
            .iter()
            .filter_map(|selector| document.select_first(selector))
            .map(|el| el.text_content())
            .find(|title| !title.is_empty())
    }

    fn chapter_text(&self, document: &Html) -> Result<String, ScraperError> {
        content_text(document, CONTENT)
    }

    /// Syosetu has no cover images.
    async fn book_cover_image_url(&self, _book_url: &str) -> Response<Option<String>> {
        Response::Success(None)
    }

    async fn book_description(&self, book_url: &str) -> Response<Option<String>> {
        try_connect(book_url, self.fetch_description(book_url)).await
    }

    async fn chapter_list(&self, book_url: &str) -> Response<Vec<ChapterMetadata>> {
        try_connect(book_url, self.fetch_chapters(book_url)).await
    }
}
