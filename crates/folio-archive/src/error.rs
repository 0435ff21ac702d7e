//! Archive error type.

use std::path::{Path, PathBuf};

use folio_cache::CacheError;
use folio_meta::MetadataError;

/// Error returned by archive and page operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// A required metadata field is missing.
    #[error("{}: {field} is missing", .path.display())]
    IncompleteMetadata {
        /// Source document.
        path: PathBuf,
        /// Name of the missing field.
        field: String,
    },
    /// No page is indexed under the URL.
    #[error("no page with url {0:?}")]
    NotFound(String),
    /// The document has no metadata separator.
    #[error("{}: document has no metadata separator", .path.display())]
    MalformedDocument {
        /// Source document.
        path: PathBuf,
    },
    /// The document is not valid UTF-8.
    #[error("{}: document is not valid UTF-8", .path.display())]
    InvalidEncoding {
        /// Source document.
        path: PathBuf,
    },
    /// The metadata block could not be parsed.
    #[error("{}: invalid metadata: {message}", .path.display())]
    InvalidMetadata {
        /// Source document.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// I/O error on a source document or directory.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// Cache write failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ArchiveError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Attach the source document to a metadata error.
    pub(crate) fn metadata(path: &Path, err: MetadataError) -> Self {
        let path = path.to_path_buf();
        match err {
            MetadataError::MissingSeparator => Self::MalformedDocument { path },
            MetadataError::Incomplete { field } => Self::IncompleteMetadata { path, field },
            err @ (MetadataError::Parse(_) | MetadataError::NonScalar { .. }) => {
                Self::InvalidMetadata {
                    path,
                    message: err.to_string(),
                }
            }
        }
    }

    /// Whether the error describes a bad document rather than a failing system.
    #[must_use]
    pub fn is_invalid_document(&self) -> bool {
        matches!(
            self,
            Self::IncompleteMetadata { .. }
                | Self::MalformedDocument { .. }
                | Self::InvalidEncoding { .. }
                | Self::InvalidMetadata { .. }
        )
    }
}
