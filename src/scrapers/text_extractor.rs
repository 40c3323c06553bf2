//! Turns a DOM subtree into paragraphed plain text.
//!
//! Block elements end a paragraph, `<br>` ends a line, runs of whitespace
//! collapse to one space. Scripts, styles, ruby annotations and ad slots are
//! skipped entirely. Paragraphs are joined by a blank line.

use scraper::ElementRef;
use scraper::node::Element;

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "ins", "rt", "rp", "template", "button", "form",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "blockquote", "section",
    "article", "header", "footer", "tr", "table", "pre", "hr",
];

const AD_CLASSES: &[&str] = &["ads", "adsbygoogle", "advertisement", "ad-container", "code-block"];

#[derive(Default)]
pub struct TextExtractor {
    paragraphs: Vec<String>,
    current: String,
    pending_space: bool,
}

impl TextExtractor {
    /// Extracts the text of `element` and its descendants.
    pub fn get(element: ElementRef<'_>) -> String {
        let mut extractor = Self::default();
        extractor.walk(element);
        extractor.finish()
    }

    fn walk(&mut self, element: ElementRef<'_>) {
        for node in element.children() {
            if let Some(text) = node.value().as_text() {
                self.push_text(text);
                continue;
            }
            let Some(child) = ElementRef::wrap(node) else {
                continue;
            };

            let value = child.value();
            if is_skipped(value) {
                continue;
            }
            if value.name() == "br" {
                self.line_break();
                continue;
            }

            let block = BLOCK_TAGS.contains(&value.name());
            if block {
                self.end_paragraph();
            }
            self.walk(child);
            if block {
                self.end_paragraph();
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = !self.current.is_empty() && !self.current.ends_with('\n');
                continue;
            }
            if self.pending_space {
                self.current.push(' ');
                self.pending_space = false;
            }
            self.current.push(c);
        }
    }

    fn line_break(&mut self) {
        let trimmed = self.current.trim_end_matches(' ').len();
        self.current.truncate(trimmed);
        if !self.current.is_empty() && !self.current.ends_with("\n\n") {
            self.current.push('\n');
        }
        self.pending_space = false;
    }

    fn end_paragraph(&mut self) {
        let paragraph = self.current.trim();
        if !paragraph.is_empty() {
            self.paragraphs.push(paragraph.to_string());
        }
        self.current.clear();
        self.pending_space = false;
    }

    fn finish(mut self) -> String {
        self.end_paragraph();
        self.paragraphs.join("\n\n")
    }
}

fn is_skipped(element: &Element) -> bool {
    SKIPPED_TAGS.contains(&element.name())
        || element.classes().any(|class| AD_CLASSES.contains(&class))
        || element.attr("style").is_some_and(|style| {
            style.replace(' ', "").to_ascii_lowercase().contains("display:none")
        })
}
