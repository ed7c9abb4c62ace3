//! Markdown rendering service
//!
//! This module provides Markdown to HTML conversion for blog posts and legal
//! pages. It uses pulldown-cmark for Markdown parsing.
//!
//! # Example
//!
//! ```
//! use vitrine::services::markdown::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::new();
//! let html = renderer.render("# Hello World\n\nThis is **bold** text.");
//! assert!(html.contains("<h1>"));
//! assert!(html.contains("<strong>"));
//! ```

use pulldown_cmark::{html, Options, Parser};

/// A thread-safe Markdown renderer.
///
/// The renderer supports common Markdown features including:
/// - Headings (h1-h6)
/// - Lists (ordered and unordered)
/// - Links and images
/// - Blockquotes
/// - Inline and fenced code
/// - Bold, italic, and strikethrough text
/// - Tables
/// - Smart punctuation
#[derive(Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Creates a new MarkdownRenderer with the standard feature set.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        Self { options }
    }

    /// Render markdown to HTML.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::with_capacity(markdown.len() * 2);
        html::push_html(&mut html_output, parser);
        html_output
    }

    /// Render a short plain-text preview (first `max_len` characters of the
    /// markdown source with formatting markers stripped by the parser).
    pub fn render_preview(&self, markdown: &str, max_len: usize) -> String {
        use pulldown_cmark::Event;

        let parser = Parser::new_ext(markdown, self.options);
        let mut text = String::new();

        for event in parser {
            match event {
                Event::Text(t) | Event::Code(t) => {
                    if !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                    text.push_str(&t);
                }
                _ => {}
            }
            if text.len() >= max_len {
                break;
            }
        }

        if text.len() > max_len {
            let mut cut = max_len;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
            text.push_str("...");
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_heading_and_bold() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Title\n\nSome **bold** text.");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_render_table() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_render_empty() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.render(""), "");
    }

    #[test]
    fn test_render_preview_strips_formatting() {
        let renderer = MarkdownRenderer::new();
        let preview = renderer.render_preview("# Title\n\nSome **bold** text.", 100);
        assert!(!preview.contains('#'));
        assert!(!preview.contains("**"));
        assert!(preview.contains("Title"));
        assert!(preview.contains("bold"));
    }

    #[test]
    fn test_render_preview_truncates() {
        let renderer = MarkdownRenderer::new();
        let long = "word ".repeat(100);
        let preview = renderer.render_preview(&long, 20);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= 24);
    }
}
