//! Minimal DOM query surface used by adapters.
//!
//! Selectors are passed as strings; an invalid selector matches nothing and
//! is logged, so a typo in an adapter degrades to "element not found".

use crate::network::resolve_url;
use scraper::{ElementRef, Html, Selector};

pub(crate) fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(err) => {
            tracing::warn!(selector = css, error = %err, "invalid CSS selector");
            None
        }
    }
}

/// `select`/`select_first` over documents and elements.
pub trait DomQuery {
    fn select_all(&self, css: &str) -> Vec<ElementRef<'_>>;

    fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        self.select_all(css).into_iter().next()
    }
}

impl DomQuery for Html {
    fn select_all(&self, css: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(css) {
            Some(selector) => self.select(&selector).collect(),
            None => Vec::new(),
        }
    }

    fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = parse_selector(css)?;
        let first = self.select(&selector).next();
        first
    }
}

impl DomQuery for ElementRef<'_> {
    fn select_all(&self, css: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(css) {
            Some(selector) => self.select(&selector).collect(),
            None => Vec::new(),
        }
    }

    fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = parse_selector(css)?;
        let first = self.select(&selector).next();
        first
    }
}

/// Convenience accessors on a single element.
pub trait ElementExt<'a> {
    /// Text of the subtree with whitespace collapsed.
    fn text_content(&self) -> String;

    /// Attribute value, or an empty string when absent.
    fn attr_or_empty(&self, name: &str) -> String;

    /// Attribute value resolved against `base`, if present.
    fn abs_attr(&self, name: &str, base: &str) -> Option<String>;

    /// Element children, skipping text and comment nodes.
    fn element_children(&self) -> Vec<ElementRef<'a>>;

    fn next_element_sibling(&self) -> Option<ElementRef<'a>>;

    /// Whether the element itself matches `css`.
    fn is(&self, css: &str) -> bool;
}

impl<'a> ElementExt<'a> for ElementRef<'a> {
    fn text_content(&self) -> String {
        collapse_whitespace(&self.text().collect::<String>())
    }

    fn attr_or_empty(&self, name: &str) -> String {
        self.value().attr(name).unwrap_or_default().to_string()
    }

    fn abs_attr(&self, name: &str, base: &str) -> Option<String> {
        let value = self.value().attr(name)?.trim();
        if value.is_empty() {
            return None;
        }
        Some(resolve_url(base, value))
    }

    fn element_children(&self) -> Vec<ElementRef<'a>> {
        self.children().filter_map(ElementRef::wrap).collect()
    }

    fn next_element_sibling(&self) -> Option<ElementRef<'a>> {
        self.next_siblings().find_map(ElementRef::wrap)
    }

    fn is(&self, css: &str) -> bool {
        parse_selector(css).is_some_and(|selector| selector.matches(self))
    }
}

/// Detaches every element matching `css` from the tree.
pub(crate) fn remove_matching(html: &mut Html, css: &str) {
    let Some(selector) = parse_selector(css) else {
        return;
    };
    let ids: Vec<_> = html.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = html.tree.get_mut(id) {
            node.detach();
        }
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="nav">
            <a href="/page/1">1</a>
            text
            <span class="current">2</span>
          </div>
          <div class="sCat"><b>Type</b></div>
          <div class="sContent">  Novel
          </div>
          <img src="cover.jpg">
        </body></html>
    "#;

    #[test]
    fn test_select_and_text() {
        let html = Html::parse_document(PAGE);
        let nav = html.select_first("#nav").unwrap();
        assert_eq!(nav.select_all("a").len(), 1);
        assert_eq!(nav.text_content(), "1 text 2");
        assert!(html.select_first(".missing").is_none());
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let html = Html::parse_document(PAGE);
        assert!(html.select_first("div[").is_none());
        assert!(html.select_all("div[").is_empty());
    }

    #[test]
    fn test_children_and_siblings() {
        let html = Html::parse_document(PAGE);
        let nav = html.select_first("#nav").unwrap();
        let children = nav.element_children();
        assert_eq!(children.len(), 2);
        assert!(children[1].is("span.current"));
        assert!(!children[0].is(".current"));

        let header = html.select_first("div.sCat").unwrap();
        let value = header.next_element_sibling().unwrap();
        assert_eq!(value.text_content(), "Novel");
    }

    #[test]
    fn test_abs_attr() {
        let html = Html::parse_document(PAGE);
        let img = html.select_first("img").unwrap();
        assert_eq!(
            img.abs_attr("src", "https://example.com/book/").as_deref(),
            Some("https://example.com/book/cover.jpg")
        );
        assert_eq!(img.abs_attr("alt", "https://example.com/"), None);
        assert_eq!(img.attr_or_empty("alt"), "");
    }

    #[test]
    fn test_remove_matching() {
        let mut html = Html::parse_document(PAGE);
        remove_matching(&mut html, "#nav a");
        let nav = html.select_first("#nav").unwrap();
        assert_eq!(nav.text_content(), "text 2");
    }
}
