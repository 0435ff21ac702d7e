//! Time-bounded artifact cache for Folio.
//!
//! This crate provides the storage layer behind the archive's index snapshot and
//! per-page artifacts. The [`CacheStore`] trait decouples the archive from the
//! storage mechanism:
//!
//! - [`NullCache`]: No-op implementation (always misses), used when caching is disabled
//! - [`FileCache`]: One file per key, fresh only while newer than the cache horizon
//!
//! Freshness is time based: a [`FileCache`] computes its horizon (`now - ttl`)
//! once at construction, and an entry is a hit only if its file was modified
//! after that horizon.
//!
//! # Example
//!
//! ```
//! use folio_cache::{CacheStore, NullCache};
//!
//! let cache = NullCache;
//! cache.set("my-page", b"<html>hello</html>").unwrap();
//! assert_eq!(cache.get("my-page"), None); // NullCache always misses
//! ```

mod ext;
mod file;

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

pub use ext::CacheStoreExt;
pub use file::FileCache;

/// Key of the index snapshot entry.
pub const INDEX_KEY: &str = "index";

/// Key-value store for cache artifacts.
///
/// Keys are plain file-name-safe strings (see [`artifact_key`]).
pub trait CacheStore: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `None` if the key does not exist or the entry has expired.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a value, replacing any existing entry for the same key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the entry cannot be written.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Whether this store persists anything at all.
    fn is_enabled(&self) -> bool;
}

/// No-op [`CacheStore`] that never stores or retrieves data.
///
/// Every `get` returns `None`; every `set` is silently discarded.
pub struct NullCache;

impl CacheStore for NullCache {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<(), CacheError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Error returned by cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error while reading or writing a cache file.
    #[error("cache I/O error at {}: {source}", .path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// A value could not be serialized.
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// Compute the artifact key for a source file.
///
/// The key is the SHA-256 of the path string, hex encoded, so it is stable
/// across processes and safe to use as a file name.
#[must_use]
pub fn artifact_key(source: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.to_string_lossy().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let cache = NullCache;

        assert_eq!(cache.get("key"), None);

        cache.set("key", b"hello").unwrap();
        assert_eq!(cache.get("key"), None);
        assert!(!cache.is_enabled());
    }

    #[test]
    fn test_artifact_key_is_stable() {
        let a = artifact_key(Path::new("/docs/hello.md"));
        let b = artifact_key(Path::new("/docs/hello.md"));
        let c = artifact_key(Path::new("/docs/other.md"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        // 64 hex characters (256 bits)
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
