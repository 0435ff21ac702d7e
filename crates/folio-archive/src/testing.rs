//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use folio_render::Render;

/// Renderer that wraps markdown in a paragraph and counts its calls.
#[derive(Debug, Default)]
pub(crate) struct CountingRenderer(AtomicUsize);

impl CountingRenderer {
    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Render for CountingRenderer {
    fn render(&self, markdown: &str) -> String {
        self.0.fetch_add(1, Ordering::SeqCst);
        format!("<p>{markdown}</p>")
    }
}
