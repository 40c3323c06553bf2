//! Kakuyomu (kakuyomu.jp)
//!
//! The site renders with generated class names, so the table of contents is
//! matched by class prefix.

use super::{content_text, fetch_page_value};
use crate::error::ScraperError;
use crate::network::{NetworkClient, resolve_url, try_connect};
use crate::response::Response;
use crate::scrapers::dom::{DomQuery, ElementExt};
use crate::scrapers::{ChapterMetadata, LanguageCode, SourceInterface};
use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use std::sync::{Arc, LazyLock};

const BASE_URL: &str = "https://kakuyomu.jp/";

static WORK_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://kakuyomu\.jp/works/(\d+)").unwrap());

const TOC_LINKS: &str = r#"a[class^="WorkTocSection_link"]"#;
const TOC_TITLE: &str = r#"[class^="WorkTocSection_title"]"#;

pub struct Kakuyomu {
    client: Arc<dyn NetworkClient>,
}

impl Kakuyomu {
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self { client }
    }

    /// Strips any `/episodes/...` suffix, leaving `https://kakuyomu.jp/works/<id>`.
    fn work_url(url: &str) -> Result<String, ScraperError> {
        WORK_URL_REGEX
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|id| format!("https://kakuyomu.jp/works/{}", id.as_str()))
            .ok_or_else(|| ScraperError::InvalidUrl(format!("not a Kakuyomu work URL: {}", url)))
    }

    async fn fetch_chapters(&self, book_url: &str) -> Result<Vec<ChapterMetadata>, ScraperError> {
        let work_url = Self::work_url(book_url)?;
        fetch_page_value(self.client.as_ref(), &work_url, |document, base| {
            parse_toc(&document, base)
        })
        .await
    }

    async fn fetch_meta(&self, book_url: &str, property: &str) -> Result<Option<String>, ScraperError> {
        let work_url = Self::work_url(book_url)?;
        let selector = format!(r#"meta[property="{}"]"#, property);
        fetch_page_value(self.client.as_ref(), &work_url, move |document, _| {
            document
                .select_first(&selector)
                .map(|meta| meta.attr_or_empty("content").trim().to_string())
                .filter(|content| !content.is_empty())
        })
        .await
    }
}

fn parse_toc(document: &Html, base: &str) -> Vec<ChapterMetadata> {
    document
        .select_all(TOC_LINKS)
        .into_iter()
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let url = resolve_url(base, href).trim_end_matches('/').to_string();
            // links also carry the publish date; prefer the title node
            let title = link
                .select_first(TOC_TITLE)
                .map(|title| title.text_content())
                .unwrap_or_else(|| link.text_content());
            Some(ChapterMetadata::new(title, url))
        })
        .collect()
}

#[async_trait]
impl SourceInterface for Kakuyomu {
    fn id(&self) -> &'static str {
        "kakuyomu"
    }

    fn name(&self) -> &'static str {
        "Kakuyomu"
    }

    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn language(&self) -> LanguageCode {
        LanguageCode::Japanese
    }

    fn chapter_title(&self, document: &Html) -> Option<String> {
        document
            .select_first(".widget-episodeTitle")
            .map(|title| title.text_content())
            .filter(|title| !title.is_empty())
    }

    fn chapter_text(&self, document: &Html) -> Result<String, ScraperError> {
        content_text(document, &["div.widget-episodeBody"])
    }

    async fn book_cover_image_url(&self, book_url: &str) -> Response<Option<String>> {
        try_connect(book_url, self.fetch_meta(book_url, "og:image")).await
    }

    async fn book_description(&self, book_url: &str) -> Response<Option<String>> {
        try_connect(book_url, self.fetch_meta(book_url, "og:description")).await
    }

    async fn chapter_list(&self, book_url: &str) -> Response<Vec<ChapterMetadata>> {
        try_connect(book_url, self.fetch_chapters(book_url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::testing::FakeClient;

    const WORK_PAGE: &str = r#"
        <html><head>
          <meta property="og:image" content="https://cdn-static.kakuyomu.jp/works/1177354054881165840/ogimage.png">
          <meta property="og:description" content="  異世界に転生した少年の物語。 ">
        </head><body>
          <h1 class="Heading_heading__lQ85n"><a href="/works/1177354054881165840" title="魔法の書">魔法の書</a></h1>
          <a class="WorkTocSection_link__ocg9K" href="/works/1177354054881165840/episodes/1177354054881165900/">
            <div class="WorkTocSection_title__H2007">第1話 目覚め</div>
            <time>2024年1月1日</time>
          </a>
          <a class="WorkTocSection_link__ocg9K" href="/works/1177354054881165840/episodes/1177354054881166000">第2話 旅立ち</a>
        </body></html>
    "#;

    #[test]
    fn test_work_url() {
        assert_eq!(
            Kakuyomu::work_url("https://kakuyomu.jp/works/1234567890/episodes/111/").unwrap(),
            "https://kakuyomu.jp/works/1234567890"
        );
        assert_eq!(
            Kakuyomu::work_url("https://kakuyomu.jp/works/1234567890").unwrap(),
            "https://kakuyomu.jp/works/1234567890"
        );
        assert!(Kakuyomu::work_url("https://kakuyomu.jp/users/123").is_err());
    }

    #[tokio::test]
    async fn test_chapter_list() {
        let client = Arc::new(
            FakeClient::new().with_page("https://kakuyomu.jp/works/1177354054881165840", WORK_PAGE),
        );
        let source = Kakuyomu::new(client);

        let chapters = source
            .chapter_list("https://kakuyomu.jp/works/1177354054881165840/episodes/1177354054881165900")
            .await
            .ok()
            .unwrap();
        assert_eq!(
            chapters,
            vec![
                ChapterMetadata::new(
                    "第1話 目覚め",
                    "https://kakuyomu.jp/works/1177354054881165840/episodes/1177354054881165900"
                ),
                ChapterMetadata::new(
                    "第2話 旅立ち",
                    "https://kakuyomu.jp/works/1177354054881165840/episodes/1177354054881166000"
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_cover_and_description_from_meta() {
        let book_url = "https://kakuyomu.jp/works/1177354054881165840";
        let client = Arc::new(FakeClient::new().with_page(book_url, WORK_PAGE));
        let source = Kakuyomu::new(client);

        assert_eq!(
            source.book_cover_image_url(book_url).await.ok().unwrap().as_deref(),
            Some("https://cdn-static.kakuyomu.jp/works/1177354054881165840/ogimage.png")
        );
        assert_eq!(
            source.book_description(book_url).await.ok().unwrap().as_deref(),
            Some("異世界に転生した少年の物語。")
        );
    }

    #[tokio::test]
    async fn test_foreign_url_is_error() {
        let client = Arc::new(FakeClient::new());
        let source = Kakuyomu::new(client.clone());

        let response = source.chapter_list("https://kakuyomu.jp/users/someone").await;
        assert!(response.error_message().is_some());
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn test_chapter_page() {
        let source = Kakuyomu::new(Arc::new(FakeClient::new()));
        let document = Html::parse_document(
            r#"<p class="widget-episodeTitle">第1話 目覚め</p>
               <div class="widget-episodeBody js-episode-body">
                 <p id="p1">朝が来た。</p>
                 <p id="p2" class="blank"><br></p>
                 <p id="p3">彼は目を開けた。</p>
               </div>"#,
        );
        assert_eq!(source.chapter_title(&document).as_deref(), Some("第1話 目覚め"));
        assert_eq!(source.chapter_text(&document).unwrap(), "朝が来た。\n\n彼は目を開けた。");
    }
}
