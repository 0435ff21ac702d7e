//! Versioned wrappers for everything written to the cache.
//!
//! Entries written by a different cache format version are treated as misses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache format version. Bump when [`Page`](crate::Page) or
/// [`IndexEntry`](crate::IndexEntry) change shape.
pub(crate) const CACHE_VERSION: u32 = 1;

/// Index snapshot stored under [`folio_cache::INDEX_KEY`].
#[derive(Serialize, Deserialize)]
pub(crate) struct Snapshot<I> {
    pub(crate) version: u32,
    pub(crate) created: DateTime<Utc>,
    pub(crate) pages: I,
}

impl<I> Snapshot<I> {
    pub(crate) fn new(pages: I) -> Self {
        Self {
            version: CACHE_VERSION,
            created: Utc::now(),
            pages,
        }
    }

    /// Unwrap the payload if it was written by this cache format version.
    pub(crate) fn into_current(self) -> Option<I> {
        (self.version == CACHE_VERSION).then_some(self.pages)
    }
}

/// Page artifact stored under the source file's artifact key.
#[derive(Serialize, Deserialize)]
pub(crate) struct Artifact<P> {
    pub(crate) version: u32,
    pub(crate) page: P,
}

impl<P> Artifact<P> {
    pub(crate) fn new(page: P) -> Self {
        Self {
            version: CACHE_VERSION,
            page,
        }
    }

    /// Unwrap the payload if it was written by this cache format version.
    pub(crate) fn into_current(self) -> Option<P> {
        (self.version == CACHE_VERSION).then_some(self.page)
    }
}
