//! Per-site "is this the last page" predicates.
//!
//! Every rule fails closed: when the pagination markup can't be found or
//! classified the page counts as the last one, so a changed layout stops an
//! iterator instead of looping on the same page.

use super::dom::{DomQuery, ElementExt};
use scraper::Html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastPageRule {
    /// Last when the final child of `nav` matches `item`.
    LastChildMatches { nav: String, item: String },

    /// Last when the second-to-last child of `nav` (or its only child)
    /// matches `item`.
    SecondToLastChildMatches { nav: String, item: String },

    /// Last when no element matches the selector.
    MissingElement(String),

    /// Last when no `link` element has text containing `label`.
    MissingNextLink { link: String, label: String },

    /// Single-page listings.
    Always,
}

impl LastPageRule {
    pub fn last_child_matches(nav: &str, item: &str) -> Self {
        Self::LastChildMatches {
            nav: nav.to_string(),
            item: item.to_string(),
        }
    }

    pub fn second_to_last_child_matches(nav: &str, item: &str) -> Self {
        Self::SecondToLastChildMatches {
            nav: nav.to_string(),
            item: item.to_string(),
        }
    }

    pub fn missing_element(selector: &str) -> Self {
        Self::MissingElement(selector.to_string())
    }

    pub fn missing_next_link(link: &str, label: &str) -> Self {
        Self::MissingNextLink {
            link: link.to_string(),
            label: label.to_string(),
        }
    }

    pub fn is_last_page(&self, document: &Html) -> bool {
        match self {
            LastPageRule::LastChildMatches { nav, item } => {
                let Some(nav) = document.select_first(nav) else {
                    return true;
                };
                nav.element_children()
                    .last()
                    .is_none_or(|child| child.is(item))
            }
            LastPageRule::SecondToLastChildMatches { nav, item } => {
                let Some(nav) = document.select_first(nav) else {
                    return true;
                };
                let children = nav.element_children();
                let candidate = match children.len() {
                    0 => return true,
                    1 => children[0],
                    n => children[n - 2],
                };
                candidate.is(item)
            }
            LastPageRule::MissingElement(selector) => document.select_first(selector).is_none(),
            LastPageRule::MissingNextLink { link, label } => !document
                .select_all(link)
                .iter()
                .any(|el| el.text_content().contains(label.as_str())),
            LastPageRule::Always => true,
        }
    }
}
