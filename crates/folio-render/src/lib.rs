//! Markdown to HTML rendering for Folio pages.
//!
//! Page bodies are rendered through the [`Render`] trait so the archive does not
//! depend on a particular markup engine. [`MarkdownRenderer`] is the default
//! implementation, built on `pulldown-cmark` with GitHub Flavored Markdown
//! enabled.
//!
//! # Example
//!
//! ```
//! use folio_render::{MarkdownRenderer, Render};
//!
//! let html = MarkdownRenderer::new().render("# Hi\n\n~~old~~ new");
//! assert!(html.contains("<h1>Hi</h1>"));
//! assert!(html.contains("<del>old</del>"));
//! ```

use pulldown_cmark::{Options, Parser, html};

/// Converts a markup string into its rendered form.
///
/// Rendering is pure and infallible: malformed input is rendered best-effort.
pub trait Render: Send + Sync {
    /// Render `markdown` into presentation markup.
    fn render(&self, markdown: &str) -> String;
}

impl<F> Render for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn render(&self, markdown: &str) -> String {
        self(markdown)
    }
}

/// `pulldown-cmark` based HTML renderer.
#[derive(Clone, Copy, Debug)]
pub struct MarkdownRenderer {
    gfm: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a new renderer with GFM enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    /// - Blockquote alerts (`> [!NOTE]`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }
}

impl Render for MarkdownRenderer {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}
