//! The archive index: one entry per document, keyed by URL.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use folio_meta::{FrontMatter, PageMeta};
use serde::{Deserialize, Serialize};

use crate::ArchiveError;

/// Indexed metadata of a single document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Front-matter metadata.
    #[serde(flatten)]
    pub meta: PageMeta,
    /// Byte length of the source file as last observed.
    pub filesize: u64,
    /// Absolute path of the source file.
    pub filepath: PathBuf,
    /// Source file modification time.
    pub last_update: DateTime<Utc>,
}

impl IndexEntry {
    /// Build an entry from parsed front matter and source file facts.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::IncompleteMetadata`] if `title` or `url` is
    /// missing.
    pub fn from_front_matter(
        fields: FrontMatter,
        filepath: PathBuf,
        filesize: u64,
        last_update: DateTime<Utc>,
    ) -> Result<Self, ArchiveError> {
        let meta = PageMeta::from_front_matter(fields)
            .map_err(|e| ArchiveError::metadata(&filepath, e))?;
        Ok(Self {
            meta,
            filesize,
            filepath,
            last_update,
        })
    }

    /// Page URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.meta.url
    }

    /// Source file path.
    #[must_use]
    pub fn filepath(&self) -> &Path {
        &self.filepath
    }
}

/// Partial update of an [`IndexEntry`].
///
/// Present fields overwrite the entry's values. `extra` keys are merged into
/// the entry's extra metadata; no key is ever removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryPatch {
    /// New file size.
    pub filesize: Option<u64>,
    /// New modification time.
    pub last_update: Option<DateTime<Utc>>,
    /// Extra metadata to merge.
    pub extra: BTreeMap<String, String>,
}

impl EntryPatch {
    /// Patch that only corrects the file size.
    #[must_use]
    pub fn filesize(filesize: u64) -> Self {
        Self {
            filesize: Some(filesize),
            ..Self::default()
        }
    }

    fn apply(&self, entry: &mut IndexEntry) {
        if let Some(filesize) = self.filesize {
            entry.filesize = filesize;
        }
        if let Some(last_update) = self.last_update {
            entry.last_update = last_update;
        }
        entry
            .meta
            .extra
            .extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// All indexed documents, sorted by URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry by URL.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&IndexEntry> {
        self.entries.get(url)
    }

    /// Insert an entry under its URL, returning the entry it replaced.
    pub fn insert(&mut self, entry: IndexEntry) -> Option<IndexEntry> {
        self.entries.insert(entry.meta.url.clone(), entry)
    }

    /// Apply a patch to the entry at `url`.
    ///
    /// Returns `false` if no entry exists for `url`.
    pub fn patch(&mut self, url: &str, patch: &EntryPatch) -> bool {
        match self.entries.get_mut(url) {
            Some(entry) => {
                patch.apply(entry);
                true
            }
            None => false,
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over URLs in sorted order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over entries in URL order.
    pub fn iter(&self) -> btree_map::Values<'_, String, IndexEntry> {
        self.entries.values()
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a IndexEntry;
    type IntoIter = btree_map::Values<'a, String, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
