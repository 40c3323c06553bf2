//! Terminal output for the `shiori` CLI.
//!
//! Colors are used only when stdout is a terminal and `NO_COLOR` is unset.

use crate::paging::{IteratorState, IteratorStatus};
use crate::scrapers::{BookMetadata, ChapterMetadata, LanguageCode};
use std::io::{self, IsTerminal};

#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
        }
    }
}

const RESET: &str = "\x1b[0m";

#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        let colors_enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { colors_enabled }
    }

    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Wraps `text` in the ANSI codes for `styles` when colors are on.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        match (self.colors_enabled, styles) {
            (false, _) | (_, []) => text.to_string(),
            (true, styles) => {
                let codes = styles.iter().map(|style| style.code()).collect::<Vec<_>>();
                format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
            }
        }
    }

    /// Prints `[TAG] message`; errors go to stderr.
    fn emit(&self, tag: &str, color: Style, message: &str) {
        let line = format!("[{}] {}", self.style(tag, &[color, Style::Bold]), message);
        match color {
            Style::Red => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    pub fn info(&self, message: &str) {
        self.emit("INFO", Style::Blue, message);
    }

    pub fn success(&self, message: &str) {
        self.emit("OK", Style::Green, message);
    }

    pub fn warning(&self, message: &str) {
        self.emit("WARN", Style::Yellow, message);
    }

    pub fn error(&self, message: &str) {
        self.emit("ERROR", Style::Red, message);
    }

    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Dim])
    }

    /// One catalog or search entry: title, then the URL dimmed.
    pub fn book_line(&self, book: &BookMetadata) -> String {
        format!("{}  {}", self.style(&book.title, &[Style::Bold]), self.muted(&book.url))
    }

    /// Chapter entry numbered from 1.
    pub fn chapter_line(&self, position: usize, chapter: &ChapterMetadata) -> String {
        let number = self.style(&format!("{:>5}.", position), &[Style::Cyan]);
        format!("{} {}  {}", number, chapter.title, self.muted(&chapter.url))
    }

    pub fn language_tag(&self, language: LanguageCode) -> String {
        self.style(&format!("[{}]", language.code()), &[Style::Yellow])
    }

    /// Short iterator summary such as `12 items, consumed`.
    pub fn iterator_summary(&self, status: &IteratorStatus) -> String {
        let state = match status.state {
            IteratorState::Idle => self.style("more available", &[Style::Green]),
            IteratorState::Loading => self.style("loading", &[Style::Cyan]),
            IteratorState::Consumed if status.error.is_some() => self.style("failed", &[Style::Red]),
            IteratorState::Consumed => self.style("consumed", &[Style::Dim]),
        };
        format!("{} items, {}", status.item_count, state)
    }
}
