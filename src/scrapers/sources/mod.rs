//! Per-site source adapters and the parsing helpers they share.

mod best_light_novel;
mod first_kiss_novel;
mod kakuyomu;
mod madara;
mod mtl_novel;
mod syosetu;
mod wuxia_world;

pub use best_light_novel::BestLightNovel;
pub use first_kiss_novel::FirstKissNovel;
pub use kakuyomu::Kakuyomu;
pub use mtl_novel::MtlNovel;
pub use syosetu::Syosetu;
pub use wuxia_world::WuxiaWorld;

use super::dom::{DomQuery, ElementExt, remove_matching};
use super::{BookMetadata, ChapterMetadata, TextExtractor};
use crate::error::ScraperError;
use crate::network::NetworkClient;
use reqwest::Method;
use scraper::Html;
use url::Url;

/// Where book entries live in a listing page.
pub(crate) struct BookListing<'a> {
    /// One element per book.
    pub item: &'a str,
    /// Link to the book page, searched inside `item`.
    pub link: &'a str,
    /// Attribute of the link holding the title; the link text is the fallback.
    pub title_attr: &'a str,
    /// Cover image, searched inside `item`.
    pub cover: &'a str,
}

impl BookListing<'_> {
    pub fn parse(&self, document: &Html, base: &str) -> Vec<BookMetadata> {
        document
            .select_all(self.item)
            .into_iter()
            .filter_map(|item| {
                let link = item.select_first(self.link)?;
                let url = link.abs_attr("href", base)?;
                let title = link
                    .value()
                    .attr(self.title_attr)
                    .map(str::trim)
                    .filter(|title| !title.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| link.text_content());
                let cover = item
                    .select_first(self.cover)
                    .and_then(|img| img.abs_attr("src", base))
                    .unwrap_or_default();
                Some(BookMetadata::new(title, url, cover))
            })
            .collect()
    }
}

/// Fetches `url` and runs `extract` over the parsed page.
///
/// `extract` receives the document by value so it may detach nodes, and the
/// final page URL for resolving relative links.
pub(crate) async fn fetch_page_value<T>(
    client: &dyn NetworkClient,
    url: &str,
    extract: impl FnOnce(Html, &str) -> T + Send,
) -> Result<T, ScraperError> {
    let page = client.get(url).await?;
    let document = page.document();
    Ok(extract(document, &page.url))
}

/// Fetches a chapter index with `method` and collects links matching
/// `selector`, reversing listings that are newest-first on the site.
pub(crate) async fn fetch_chapter_list(
    client: &dyn NetworkClient,
    method: Method,
    url: &str,
    selector: &str,
    newest_first: bool,
) -> Result<Vec<ChapterMetadata>, ScraperError> {
    let request = reqwest::Request::new(method, Url::parse(url)?);
    let page = client.call(request, false).await?;
    let mut chapters = chapter_links(&page.document(), selector, &page.url);
    if newest_first {
        chapters.reverse();
    }
    Ok(chapters)
}

pub(crate) fn chapter_links(document: &Html, selector: &str, base: &str) -> Vec<ChapterMetadata> {
    document
        .select_all(selector)
        .into_iter()
        .filter_map(|link| {
            let url = link.abs_attr("href", base)?;
            Some(ChapterMetadata::new(link.text_content(), url))
        })
        .collect()
}

/// Reading text of the first element matching any of `selectors`.
pub(crate) fn content_text(document: &Html, selectors: &[&str]) -> Result<String, ScraperError> {
    selectors
        .iter()
        .find_map(|selector| document.select_first(selector))
        .map(TextExtractor::get)
        .ok_or_else(|| ScraperError::ElementNotFound(format!("chapter content ({})", selectors.join(", "))))
}

/// Text of `root` after detaching its descendants matching `removed`.
pub(crate) fn description_text(mut document: Html, root: &str, removed: &[&str]) -> Option<String> {
    for selector in removed {
        remove_matching(&mut document, &format!("{} {}", root, selector));
    }
    document
        .select_first(root)
        .map(|node| TextExtractor::get(node).trim().to_string())
}

pub(crate) fn image_src(document: &Html, selector: &str, base: &str) -> Option<String> {
    document.select_first(selector)?.abs_attr("src", base)
}
