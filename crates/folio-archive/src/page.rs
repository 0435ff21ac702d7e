//! A single document with lazily loaded and rendered body.

use std::borrow::Cow;
use std::path::Path;

use chrono::{DateTime, Utc};
use folio_meta::{FrontMatter, PageMeta, to_snake_case};
use folio_render::Render;
use serde::{Deserialize, Serialize};

use crate::scan::{SourceStat, read_source};
use crate::{ArchiveError, IndexEntry};

/// A document page.
///
/// Metadata is fixed at construction. The raw body is read from the source
/// file on first access, and the rendered body is computed from the raw body
/// on first access. Both are serialized, so a page restored from a cache
/// artifact needs neither the source file nor the renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    entry: IndexEntry,
    #[serde(default)]
    raw_body: Option<String>,
    #[serde(default)]
    rendered_body: Option<String>,
}

impl Page {
    /// Create an unloaded page from an index entry.
    #[must_use]
    pub fn new(entry: &IndexEntry) -> Self {
        Self {
            entry: entry.clone(),
            raw_body: None,
            rendered_body: None,
        }
    }

    /// Create an unloaded page from raw metadata of the file at `filepath`.
    ///
    /// Size and modification time are read from the file.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::IncompleteMetadata`] if `title` or `url` is
    /// missing, or [`ArchiveError::Io`] if the file cannot be inspected.
    pub fn from_front_matter(fields: FrontMatter, filepath: &Path) -> Result<Self, ArchiveError> {
        let stat = SourceStat::read(filepath)?;
        let entry = IndexEntry::from_front_matter(
            fields,
            filepath.to_path_buf(),
            stat.size,
            stat.modified,
        )?;
        Ok(Self::new(&entry))
    }

    /// Raw markdown body, read from the source file on first access.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] if the file cannot be read,
    /// [`ArchiveError::InvalidEncoding`] if it is not UTF-8, or
    /// [`ArchiveError::MalformedDocument`] if it lost its separator.
    pub fn raw_body(&mut self) -> Result<&str, ArchiveError> {
        let body = match self.raw_body.take() {
            Some(body) => body,
            None => self.read_body()?,
        };
        Ok(self.raw_body.insert(body).as_str())
    }

    /// Raw body if it has been loaded.
    #[must_use]
    pub fn loaded_raw_body(&self) -> Option<&str> {
        self.raw_body.as_deref()
    }

    /// Replace the raw body.
    ///
    /// With a renderer the body is rendered immediately. Without one the
    /// rendered body is dropped and recomputed by the next [`Page::html`].
    pub fn set_raw_body(&mut self, content: impl Into<String>, recompile: Option<&dyn Render>) {
        let raw = content.into();
        self.rendered_body = recompile.map(|renderer| renderer.render(&raw));
        self.raw_body = Some(raw);
    }

    /// Rendered body, computed once from the raw body.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw body has to be loaded and loading fails.
    pub fn html(&mut self, renderer: &dyn Render) -> Result<&str, ArchiveError> {
        let rendered = match self.rendered_body.take() {
            Some(rendered) => rendered,
            None => renderer.render(self.raw_body()?),
        };
        Ok(self.rendered_body.insert(rendered).as_str())
    }

    /// Load and render the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw body cannot be loaded.
    pub fn compile(&mut self, renderer: &dyn Render) -> Result<(), ArchiveError> {
        self.html(renderer)?;
        Ok(())
    }

    /// Whether the rendered body is available without rendering.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.rendered_body.is_some()
    }

    /// Index entry this page was built from.
    #[must_use]
    pub fn entry(&self) -> &IndexEntry {
        &self.entry
    }

    /// Front-matter metadata.
    #[must_use]
    pub fn meta(&self) -> &PageMeta {
        &self.entry.meta
    }

    /// Page title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.entry.meta.title
    }

    /// Page URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.entry.meta.url
    }

    /// Page author, if any.
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.entry.meta.author.as_deref()
    }

    /// Absolute path of the source file.
    #[must_use]
    pub fn filepath(&self) -> &Path {
        &self.entry.filepath
    }

    /// Source file size in bytes when the page was built.
    #[must_use]
    pub fn filesize(&self) -> u64 {
        self.entry.filesize
    }

    /// Source file modification time.
    #[must_use]
    pub fn last_update(&self) -> DateTime<Utc> {
        self.entry.last_update
    }

    /// Look up any field by name.
    ///
    /// Covers the front-matter fields (`title`, `url`, `author`, extra
    /// fields) and the source fields (`filepath`, `filesize`, `last_update`).
    /// Names are accepted in snake_case or camelCase.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::IncompleteMetadata`] if the page has no such
    /// field.
    pub fn get(&self, name: &str) -> Result<Cow<'_, str>, ArchiveError> {
        self.lookup(name)
            .or_else(|| self.lookup(&to_snake_case(name)))
            .ok_or_else(|| ArchiveError::IncompleteMetadata {
                path: self.entry.filepath.clone(),
                field: name.to_owned(),
            })
    }

    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "filepath" => Some(self.entry.filepath.to_string_lossy()),
            "filesize" => Some(Cow::Owned(self.entry.filesize.to_string())),
            "last_update" => Some(Cow::Owned(self.entry.last_update.to_rfc3339())),
            _ => self.entry.meta.get(name).map(Cow::Borrowed),
        }
    }

    pub(crate) fn set_filesize(&mut self, filesize: u64) {
        self.entry.filesize = filesize;
    }

    fn read_body(&self) -> Result<String, ArchiveError> {
        let path = &self.entry.filepath;
        let content = read_source(path)?;
        let body = folio_meta::body(&content).map_err(|e| ArchiveError::metadata(path, e))?;
        Ok(body.to_owned())
    }
}
