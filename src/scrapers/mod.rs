//! Source traits, shared data types and the scraper registry.
//!
//! Every site adapter implements [`SourceInterface`]; the ones with a
//! browsable catalog also implement [`CatalogSource`]. Metadata-only sites
//! implement [`DatabaseInterface`] instead.

pub mod databases;
pub mod dom;
mod pagination;
pub mod sources;
mod text_extractor;

pub use databases::{AuthorMetadata, BakaUpdates, BookData, DatabaseInterface, SearchGenre};
pub use pagination::LastPageRule;
pub use sources::{BestLightNovel, FirstKissNovel, Kakuyomu, MtlNovel, Syosetu, WuxiaWorld};
pub use text_extractor::TextExtractor;

use crate::error::ScraperError;
use crate::network::{NetworkClient, get_request, try_connect};
use crate::paging::{PagedList, PagedListIterator};
use crate::response::Response;
use async_trait::async_trait;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A book as listed in a catalog or search result. Identified by `url`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,

    /// Absolute URL of the book page.
    pub url: String,

    /// Empty when the listing has no cover.
    pub cover_image_url: String,

    pub description: Option<String>,
}

impl BookMetadata {
    pub fn new(title: impl Into<String>, url: impl Into<String>, cover_image_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            cover_image_url: cover_image_url.into(),
            description: None,
        }
    }
}

/// One chapter in reading order. Identified by `url`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterMetadata {
    pub title: String,
    pub url: String,
}

impl ChapterMetadata {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A downloaded chapter ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterContent {
    /// Title override from the chapter page, if the source provides one.
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    English,
    Japanese,
    Chinese,
    Korean,
}

impl LanguageCode {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            LanguageCode::English => "en",
            LanguageCode::Japanese => "ja",
            LanguageCode::Chinese => "zh",
            LanguageCode::Korean => "ko",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LanguageCode::English => "English",
            LanguageCode::Japanese => "Japanese",
            LanguageCode::Chinese => "Chinese",
            LanguageCode::Korean => "Korean",
        };
        f.write_str(name)
    }
}

/// Contract implemented once per content site.
///
/// Methods returning [`Response`] never fail by other means: errors and
/// panics are converted at the adapter boundary. A `Success(None)` from the
/// cover and description lookups means the page has no such element.
#[async_trait]
pub trait SourceInterface: Send + Sync {
    /// Stable identifier, unique across sources.
    fn id(&self) -> &'static str;

    /// Display name.
    fn name(&self) -> &'static str;

    /// URL prefix owned by this source; used for URL resolution.
    fn base_url(&self) -> &'static str;

    fn catalog_url(&self) -> Option<&'static str> {
        None
    }

    fn icon_url(&self) -> Option<&'static str> {
        None
    }

    fn language(&self) -> LanguageCode;

    /// Returns the catalog capability when this source has one.
    fn as_catalog(&self) -> Option<&dyn CatalogSource> {
        None
    }

    /// Chapter title taken from the chapter page itself.
    fn chapter_title(&self, _document: &Html) -> Option<String> {
        None
    }

    /// Reading text of a chapter page. A missing content node is an error.
    fn chapter_text(&self, document: &Html) -> Result<String, ScraperError>;

    async fn book_cover_image_url(&self, book_url: &str) -> Response<Option<String>>;

    async fn book_description(&self, book_url: &str) -> Response<Option<String>>;

    /// Full chapter index, oldest chapter first.
    async fn chapter_list(&self, book_url: &str) -> Response<Vec<ChapterMetadata>>;
}

/// A source with a browsable, searchable catalog.
#[async_trait]
pub trait CatalogSource: SourceInterface {
    /// Catalog page `index` (0-based; sites count from 1).
    async fn catalog_list(&self, index: usize) -> Response<PagedList<BookMetadata>>;

    /// Search results page `index`. Blank input yields an empty last page
    /// without touching the network.
    async fn catalog_search(&self, index: usize, input: &str) -> Response<PagedList<BookMetadata>>;
}

/// Fetches a chapter page and extracts its title and text with `source`.
pub async fn download_chapter(
    client: &dyn NetworkClient,
    source: &dyn SourceInterface,
    chapter_url: &str,
) -> Response<ChapterContent> {
    try_connect(chapter_url, fetch_chapter(client, source, chapter_url)).await
}

async fn fetch_chapter(
    client: &dyn NetworkClient,
    source: &dyn SourceInterface,
    chapter_url: &str,
) -> Result<ChapterContent, ScraperError> {
    let page = client.call(get_request(chapter_url)?, true).await?;
    let document = page.document();
    let text = source.chapter_text(&document)?;
    Ok(ChapterContent {
        title: source.chapter_title(&document),
        text,
    })
}

/// Returns the blank-query short-circuit page when `input` is blank.
pub(crate) fn blank_search(index: usize, input: &str) -> Option<Response<PagedList<BookMetadata>>> {
    input
        .trim()
        .is_empty()
        .then(|| Response::Success(PagedList::empty(index)))
}

/// Search running against one catalog source.
pub struct SourceSearch {
    pub source: Arc<dyn CatalogSource>,
    pub iterator: PagedListIterator<BookMetadata>,
}

/// Fixed set of sources and databases with URL-based lookup.
pub struct ScraperRegistry {
    sources: Vec<Arc<dyn SourceInterface>>,
    catalogs: Vec<Arc<dyn CatalogSource>>,
    databases: Vec<Arc<dyn DatabaseInterface>>,
}

impl ScraperRegistry {
    /// Creates a registry with every shipped adapter sharing `client`.
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self::empty()
            .with_catalog_source(Arc::new(BestLightNovel::new(client.clone())))
            .with_catalog_source(Arc::new(MtlNovel::new(client.clone())))
            .with_catalog_source(Arc::new(WuxiaWorld::new(client.clone())))
            .with_catalog_source(Arc::new(FirstKissNovel::new(client.clone())))
            .with_source(Arc::new(Syosetu::new(client.clone())))
            .with_source(Arc::new(Kakuyomu::new(client.clone())))
            .with_database(Arc::new(BakaUpdates::new(client)))
    }

    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
            catalogs: Vec::new(),
            databases: Vec::new(),
        }
    }

    /// Registers a source without a catalog.
    pub fn with_source<S: SourceInterface + 'static>(mut self, source: Arc<S>) -> Self {
        self.sources.push(source);
        self
    }

    /// Registers a source with a catalog.
    pub fn with_catalog_source<S: CatalogSource + 'static>(mut self, source: Arc<S>) -> Self {
        self.sources.push(source.clone());
        self.catalogs.push(source);
        self
    }

    pub fn with_database<D: DatabaseInterface + 'static>(mut self, database: Arc<D>) -> Self {
        self.databases.push(database);
        self
    }

    pub fn sources(&self) -> &[Arc<dyn SourceInterface>] {
        &self.sources
    }

    pub fn catalog_sources(&self) -> &[Arc<dyn CatalogSource>] {
        &self.catalogs
    }

    pub fn databases(&self) -> &[Arc<dyn DatabaseInterface>] {
        &self.databases
    }

    /// Languages offered by the catalog sources.
    pub fn catalog_languages(&self) -> BTreeSet<LanguageCode> {
        self.catalogs.iter().map(|source| source.language()).collect()
    }

    pub fn source_by_id(&self, id: &str) -> Option<Arc<dyn SourceInterface>> {
        self.sources.iter().find(|source| source.id() == id).cloned()
    }

    pub fn catalog_by_id(&self, id: &str) -> Option<Arc<dyn CatalogSource>> {
        self.catalogs.iter().find(|source| source.id() == id).cloned()
    }

    pub fn compatible_source(&self, url: &str) -> Option<Arc<dyn SourceInterface>> {
        self.sources
            .iter()
            .find(|source| is_compatible_with_base_url(url, source.base_url()))
            .cloned()
    }

    pub fn compatible_source_catalog(&self, url: &str) -> Option<Arc<dyn CatalogSource>> {
        self.catalogs
            .iter()
            .find(|source| is_compatible_with_base_url(url, source.base_url()))
            .cloned()
    }

    pub fn compatible_database(&self, url: &str) -> Option<Arc<dyn DatabaseInterface>> {
        self.databases
            .iter()
            .find(|database| is_compatible_with_base_url(url, database.base_url()))
            .cloned()
    }

    /// Starts one independent search iterator per catalog source.
    ///
    /// The first page of each is requested immediately; later pages are
    /// fetched on demand through each iterator.
    pub fn global_search(&self, query: &str) -> Vec<SourceSearch> {
        self.catalogs
            .iter()
            .map(|source| {
                let fetch_source = source.clone();
                let query = query.to_string();
                let iterator = PagedListIterator::new(move |index| {
                    let source = fetch_source.clone();
                    let query = query.clone();
                    async move { source.catalog_search(index, &query).await }
                });
                iterator.fetch_next();
                SourceSearch {
                    source: source.clone(),
                    iterator,
                }
            })
            .collect()
    }
}

fn with_trailing_slash(url: &str) -> Cow<'_, str> {
    if url.ends_with('/') {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(format!("{}/", url))
    }
}

fn is_compatible_with_base_url(url: &str, base_url: &str) -> bool {
    with_trailing_slash(url).starts_with(with_trailing_slash(base_url).as_ref())
}
