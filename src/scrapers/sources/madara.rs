//! Markup shared by sites running the Madara WordPress theme.

use super::{BookListing, content_text, description_text, fetch_chapter_list, image_src};
use crate::error::ScraperError;
use crate::network::{NetworkClient, UrlBuilder};
use crate::scrapers::ChapterMetadata;
use crate::scrapers::dom::{DomQuery, ElementExt};
use reqwest::Method;
use scraper::Html;

pub(crate) const CATALOG_ITEMS: BookListing<'static> = BookListing {
    item: ".page-item-detail",
    link: "a[href]",
    title_attr: "title",
    cover: "img[src]",
};

pub(crate) fn cover(document: &Html, base: &str) -> Option<String> {
    image_src(document, "div.summary_image img[src]", base)
}

pub(crate) fn description(document: Html) -> Option<String> {
    description_text(document, ".summary__content.show-more", &[])
}

pub(crate) fn chapter_text(document: &Html) -> Result<String, ScraperError> {
    content_text(document, &[".reading-content .text-left", ".reading-content"])
}

pub(crate) fn chapter_title(document: &Html) -> Option<String> {
    document
        .select_first("#chapter-heading")
        .map(|heading| heading.text_content())
        .filter(|title| !title.is_empty())
}

/// Chapter index from the theme's AJAX endpoint; listed newest-first.
pub(crate) async fn chapter_list(
    client: &dyn NetworkClient,
    book_url: &str,
    selector: &str,
) -> Result<Vec<ChapterMetadata>, ScraperError> {
    let url = UrlBuilder::parse(book_url)?
        .add_path(["ajax", "chapters"])
        .build();
    fetch_chapter_list(client, Method::POST, &url, selector, true).await
}
