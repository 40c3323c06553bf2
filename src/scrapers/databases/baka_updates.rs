//! MangaUpdates (formerly Baka-Updates), legacy `series.html` pages.
//!
//! Book pages are a flat run of `div.sCat` headers, each followed by its
//! `div.sContent` value.

use super::{AuthorMetadata, BookData, DatabaseInterface, SearchGenre};
use crate::error::ScraperError;
use crate::network::{NetworkClient, UrlBuilder, try_connect, try_connect_url};
use crate::paging::PagedList;
use crate::response::Response;
use crate::scrapers::dom::{DomQuery, ElementExt};
use crate::scrapers::sources::{BookListing, fetch_page_value};
use crate::scrapers::{BookMetadata, LastPageRule, TextExtractor, blank_search};
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::sync::Arc;

const BASE_URL: &str = "https://www.mangaupdates.com/";
const SEARCH_GENRES_URL: &str = "https://www.mangaupdates.com/series.html?act=genresearch";

const SERIES_ITEMS: BookListing<'static> = BookListing {
    item: "div.col-6.py-1.py-md-0.text",
    link: "a[href]",
    title_attr: "title",
    cover: "img[src]",
};

const SERIES_LINKS: &str = "a[href*='series.html?id=']";

/// Filters of one `series.html` listing request.
#[derive(Default)]
struct SeriesQuery<'a> {
    title: Option<&'a str>,
    genres_included: &'a [SearchGenre],
    genres_excluded: &'a [SearchGenre],
}

pub struct BakaUpdates {
    client: Arc<dyn NetworkClient>,
    last_page: LastPageRule,
}

impl BakaUpdates {
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self {
            client,
            last_page: LastPageRule::missing_next_link("a[href*='page=']", "Next"),
        }
    }

    /// Replaces the pagination heuristic.
    pub fn with_last_page_rule(mut self, rule: LastPageRule) -> Self {
        self.last_page = rule;
        self
    }

    fn series_url(index: usize, query: &SeriesQuery<'_>) -> Result<String, ScraperError> {
        let page = index + 1;
        let join = |genres: &[SearchGenre]| {
            genres
                .iter()
                .map(|genre| genre.id.as_str())
                .collect::<Vec<_>>()
                .join("_")
        };

        Ok(UrlBuilder::parse(BASE_URL)?
            .add_path(["series.html"])
            .add("type", "novel")
            .add_if(query.title.is_some(), |url| {
                url.add("search", query.title.unwrap_or_default().trim())
            })
            .add_if(!query.genres_included.is_empty(), |url| {
                url.add("genre", join(query.genres_included))
            })
            .add_if(!query.genres_excluded.is_empty(), |url| {
                url.add("exclude_genre", join(query.genres_excluded))
            })
            .add("display", "list")
            .add("perpage", 50)
            .add_if(page > 1, |url| url.add("page", page))
            .build())
    }

    async fn fetch_series(&self, index: usize, query: SeriesQuery<'_>) -> Response<PagedList<BookMetadata>> {
        try_connect_url(Self::series_url(index, &query), BASE_URL, |url| async move {
            self.fetch_series_page(&url, index).await
        })
        .await
    }

    async fn fetch_series_page(&self, url: &str, index: usize) -> Result<PagedList<BookMetadata>, ScraperError> {
        fetch_page_value(self.client.as_ref(), url, |document, base| {
            PagedList::new(
                SERIES_ITEMS.parse(&document, base),
                index,
                self.last_page.is_last_page(&document),
            )
        })
        .await
    }

    async fn fetch_genres(&self) -> Result<Vec<SearchGenre>, ScraperError> {
        fetch_page_value(self.client.as_ref(), SEARCH_GENRES_URL, |document, _| {
            parse_genres(&document)
        })
        .await
    }

    async fn fetch_book_data(&self, book_url: &str) -> Result<BookData, ScraperError> {
        fetch_page_value(self.client.as_ref(), book_url, |document, base| {
            parse_book_data(&document, base)
        })
        .await?
    }
}

fn parse_genres(document: &Html) -> Vec<SearchGenre> {
    document
        .select_all(".p-1.col-6.text")
        .into_iter()
        .filter_map(|cell| {
            let name = cell
                .select_first("a")
                .map(|link| link.text_content())
                .unwrap_or_else(|| cell.text_content());
            (!name.is_empty()).then(|| SearchGenre::new(name.clone(), name))
        })
        .collect()
}

fn parse_book_data(document: &Html, base: &str) -> Result<BookData, ScraperError> {
    let title = document
        .select_first("span.releasestitle")
        .map(|title| title.text_content())
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ScraperError::ElementNotFound("series title (span.releasestitle)".to_string()))?;

    let mut data = BookData {
        title,
        cover_image_url: document
            .select_first("div.sContent img[src]")
            .and_then(|img| img.abs_attr("src", base)),
        ..BookData::default()
    };

    for header in document.select_all("div.sCat") {
        let Some(content) = header
            .next_element_sibling()
            .filter(|sibling| sibling.is("div.sContent"))
        else {
            continue;
        };

        match header.text_content().as_str() {
            "Description" => data.description = TextExtractor::get(content).trim().to_string(),
            "Type" => data.book_type = content.text_content(),
            "Related Series" => data.related_books = series_links(content, base),
            "Category Recommendations" | "Recommendations" => {
                data.similar_recommended.extend(series_links(content, base))
            }
            "Author(s)" => data.authors = authors(content, base),
            "Categories" => {
                data.tags = content
                    .select_all("li a")
                    .into_iter()
                    .map(|tag| tag.text_content())
                    .filter(|tag| !tag.is_empty())
                    .collect()
            }
            "Genre" => {
                data.genres = content
                    .select_all("a")
                    .into_iter()
                    .map(|genre| genre.text_content())
                    .filter(|genre| !genre.is_empty() && !genre.starts_with("Search for"))
                    .map(|genre| SearchGenre::new(genre.clone(), genre))
                    .collect()
            }
            "Associated Names" => {
                data.alternative_titles = TextExtractor::get(content)
                    .lines()
                    .map(str::trim)
                    .filter(|name| !name.is_empty() && *name != "N/A")
                    .map(str::to_string)
                    .collect()
            }
            _ => {}
        }
    }

    Ok(data)
}

fn series_links(content: ElementRef<'_>, base: &str) -> Vec<BookMetadata> {
    content
        .select_all(SERIES_LINKS)
        .into_iter()
        .filter_map(|link| {
            let url = link.abs_attr("href", base)?;
            Some(BookMetadata::new(link.text_content(), url, ""))
        })
        .collect()
}

fn authors(content: ElementRef<'_>, base: &str) -> Vec<AuthorMetadata> {
    let linked: Vec<_> = content
        .select_all("a[href]")
        .into_iter()
        .map(|link| AuthorMetadata {
            name: link.text_content(),
            url: link.abs_attr("href", base),
        })
        .filter(|author| !author.name.is_empty())
        .collect();
    if !linked.is_empty() {
        return linked;
    }

    // unlinked names are listed one per line
    TextExtractor::get(content)
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "N/A")
        .map(|name| AuthorMetadata {
            name: name.to_string(),
            url: None,
        })
        .collect()
}

#[async_trait]
impl DatabaseInterface for BakaUpdates {
    fn id(&self) -> &'static str {
        "baka_updates"
    }

    fn name(&self) -> &'static str {
        "Baka-Updates"
    }

    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn search_genres_url(&self) -> &'static str {
        SEARCH_GENRES_URL
    }

    async fn catalog_list(&self, index: usize) -> Response<PagedList<BookMetadata>> {
        self.fetch_series(index, SeriesQuery::default()).await
    }

    async fn search_by_title(&self, index: usize, input: &str) -> Response<PagedList<BookMetadata>> {
        if let Some(empty) = blank_search(index, input) {
            return empty;
        }
        let query = SeriesQuery {
            title: Some(input),
            ..SeriesQuery::default()
        };
        self.fetch_series(index, query).await
    }

    async fn search_by_filters(
        &self,
        index: usize,
        genres_included: &[SearchGenre],
        genres_excluded: &[SearchGenre],
    ) -> Response<PagedList<BookMetadata>> {
        let query = SeriesQuery {
            title: None,
            genres_included,
            genres_excluded,
        };
        self.fetch_series(index, query).await
    }

    async fn search_genres(&self) -> Response<Vec<SearchGenre>> {
        try_connect(SEARCH_GENRES_URL, self.fetch_genres()).await
    }

    async fn book_data(&self, book_url: &str) -> Response<BookData> {
        try_connect(book_url, self.fetch_book_data(book_url)).await
    }
}
