//! Shiori - web novel scraping engine.
//!
//! This library provides:
//! - A polymorphic adapter contract for novel sites ([`SourceInterface`],
//!   [`CatalogSource`]) and metadata databases ([`DatabaseInterface`])
//! - A paged iterator that fetches result pages incrementally
//! - A shared HTTP client with caching, cookies and charset decoding
//! - A registry resolving URLs to the adapter that owns them

pub mod config;
pub mod console;
pub mod error;
pub mod network;
pub mod paging;
pub mod response;
pub mod scrapers;

pub use config::Config;
pub use console::Console;
pub use error::{ConfigError, CookieError, ScraperError};
pub use network::{HttpPage, NetworkClient, ScraperNetworkClient, UrlBuilder, try_connect};
pub use paging::{IteratorState, IteratorStatus, PagedList, PagedListIterator};
pub use response::Response;
pub use scrapers::{
    BookData, BookMetadata, CatalogSource, ChapterContent, ChapterMetadata, DatabaseInterface,
    LanguageCode, ScraperRegistry, SearchGenre, SourceInterface,
};
