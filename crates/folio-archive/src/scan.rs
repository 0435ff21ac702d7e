//! Directory scan that builds the index.
//!
//! Scans the storage directory (non-recursive) for documents with the
//! configured extension, in file name order. Each document is read, split,
//! and its front matter parsed into an [`IndexEntry`]. The body halves are
//! kept as [`ScannedBodies`] so pages loaded in the same session don't read
//! the files again.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::{ArchiveError, Index, IndexEntry};

/// Document bodies captured during a scan, keyed by URL.
pub type ScannedBodies = HashMap<String, String>;

/// Result of a directory scan.
#[derive(Debug, Default)]
pub struct Scan {
    /// Index of all valid documents.
    pub index: Index,
    /// Bodies of the indexed documents.
    pub bodies: ScannedBodies,
}

/// Size and modification time of a source file.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SourceStat {
    pub(crate) size: u64,
    pub(crate) modified: DateTime<Utc>,
}

/// Read a source document as UTF-8 text.
pub(crate) fn read_source(path: &Path) -> Result<String, ArchiveError> {
    let bytes = fs::read(path).map_err(|e| ArchiveError::io(path, e))?;
    String::from_utf8(bytes).map_err(|_| ArchiveError::InvalidEncoding {
        path: path.to_path_buf(),
    })
}

impl SourceStat {
    pub(crate) fn read(path: &Path) -> Result<Self, ArchiveError> {
        let metadata = fs::metadata(path).map_err(|e| ArchiveError::io(path, e))?;
        let modified = metadata.modified().map_err(|e| ArchiveError::io(path, e))?;
        Ok(Self {
            size: metadata.len(),
            modified: modified.into(),
        })
    }
}

/// Scan `dir` for documents ending in `.{extension}`.
///
/// With `skip_invalid`, documents with a missing separator or bad metadata
/// are logged and skipped; otherwise the first one aborts the scan. I/O
/// errors always abort. When two documents share a URL the later one in
/// file name order wins.
///
/// # Errors
///
/// Returns [`ArchiveError::Io`] if the directory or a document cannot be
/// read, or the document error for an invalid document.
pub fn scan_directory(
    dir: &Path,
    extension: &str,
    skip_invalid: bool,
) -> Result<Scan, ArchiveError> {
    let start = Instant::now();
    let mut scan = Scan::default();
    let mut skipped = 0_usize;

    for path in document_paths(dir, extension)? {
        let (entry, body) = match read_document(&path) {
            Ok(document) => document,
            Err(e) if skip_invalid && e.is_invalid_document() => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping invalid document");
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let url = entry.meta.url.clone();
        if let Some(previous) = scan.index.insert(entry) {
            tracing::warn!(
                url = %url,
                replaced = %previous.filepath.display(),
                path = %path.display(),
                "Duplicate page url"
            );
        }
        scan.bodies.insert(url, body);
    }

    tracing::info!(
        dir = %dir.display(),
        page_count = scan.index.len(),
        skipped,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Archive scanned"
    );

    Ok(scan)
}

/// Document files directly in `dir`, sorted by file name.
fn document_paths(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ArchiveError> {
    let entries = fs::read_dir(dir).map_err(|e| ArchiveError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ArchiveError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_document(path: &Path) -> Result<(IndexEntry, String), ArchiveError> {
    let filepath = fs::canonicalize(path).map_err(|e| ArchiveError::io(path, e))?;
    let content = read_source(&filepath)?;
    let stat = SourceStat::read(&filepath)?;

    let (block, body) =
        folio_meta::split(&content).map_err(|e| ArchiveError::metadata(&filepath, e))?;
    let fields =
        folio_meta::parse_front_matter(block).map_err(|e| ArchiveError::metadata(&filepath, e))?;
    let entry = IndexEntry::from_front_matter(fields, filepath, stat.size, stat.modified)?;

    Ok((entry, body.to_owned()))
}
