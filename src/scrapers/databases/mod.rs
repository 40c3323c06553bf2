//! Metadata-only sites: search, genres and book details, no chapter text.

mod baka_updates;

pub use baka_updates::BakaUpdates;

use super::BookMetadata;
use crate::paging::PagedList;
use crate::response::Response;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A genre as offered by a database's filter search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchGenre {
    pub genre_name: String,

    /// Value the site expects in filter URLs.
    pub id: String,
}

impl SearchGenre {
    pub fn new(genre_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            genre_name: genre_name.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorMetadata {
    pub name: String,
    pub url: Option<String>,
}

/// Everything a database knows about one book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookData {
    pub title: String,
    pub description: String,
    pub cover_image_url: Option<String>,
    pub alternative_titles: Vec<String>,
    pub authors: Vec<AuthorMetadata>,
    pub tags: Vec<String>,
    pub genres: Vec<SearchGenre>,
    pub book_type: String,
    pub related_books: Vec<BookMetadata>,
    pub similar_recommended: Vec<BookMetadata>,
}

/// Contract for metadata databases.
///
/// Like sources, every async operation reports failure through
/// [`Response::Error`]; blank title searches answer an empty last page
/// without touching the network.
#[async_trait]
pub trait DatabaseInterface: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn base_url(&self) -> &'static str;

    fn search_genres_url(&self) -> &'static str;

    async fn catalog_list(&self, index: usize) -> Response<PagedList<BookMetadata>>;

    async fn search_by_title(&self, index: usize, input: &str) -> Response<PagedList<BookMetadata>>;

    async fn search_by_filters(
        &self,
        index: usize,
        genres_included: &[SearchGenre],
        genres_excluded: &[SearchGenre],
    ) -> Response<PagedList<BookMetadata>>;

    async fn search_genres(&self) -> Response<Vec<SearchGenre>>;

    async fn book_data(&self, book_url: &str) -> Response<BookData>;
}
