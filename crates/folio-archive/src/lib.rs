//! Document archive for Folio.
//!
//! An [`Archive`] turns a directory of documents (YAML metadata, a `===`
//! separator, a markdown body) into [`Page`]s addressed by URL. Two caches
//! keep repeated lookups cheap across process restarts:
//!
//! - the index snapshot: every document's metadata, size and location
//! - page artifacts: one fully loaded and rendered page per document
//!
//! Both live in the cache directory and expire after the configured TTL. A
//! page artifact is also discarded when its source file changed size; the
//! index then gets the new size, written back when the archive is closed.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use folio_archive::Archive;
//! use folio_config::ArchiveConfig;
//! use folio_render::{MarkdownRenderer, Render};
//!
//! let config = ArchiveConfig::for_storage(PathBuf::from("pages"));
//! let renderer: Arc<dyn Render> = Arc::new(MarkdownRenderer::new());
//!
//! let html = Archive::session(&config, Arc::clone(&renderer), |archive| {
//!     let mut page = archive.get_by_url("hello")?;
//!     Ok(page.html(renderer.as_ref())?.to_owned())
//! })?;
//! assert!(html.contains("<h1>"));
//! # Ok::<(), folio_archive::ArchiveError>(())
//! ```

mod archive;
mod envelope;
mod error;
mod index;
mod page;
mod scan;
#[cfg(test)]
mod testing;

pub use archive::Archive;
pub use error::ArchiveError;
pub use index::{EntryPatch, Index, IndexEntry};
pub use page::Page;
pub use scan::{Scan, ScannedBodies, scan_directory};
