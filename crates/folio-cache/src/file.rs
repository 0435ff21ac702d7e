//! File-based cache implementation.
//!
//! [`FileCache`] stores each entry as a hidden file directly in the cache root:
//!
//! ```text
//! {root}/
//! +-- .index.json          # index snapshot (key "index")
//! +-- .3f7a...c01e.json    # page artifact (key = sha256 of the source path)
//! ```
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so concurrent readers see either the old or the new entry.
//! Concurrent writers race; the last rename wins.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::{CacheError, CacheStore};

/// File extension of cache entries.
const EXTENSION: &str = "json";

/// File-based [`CacheStore`] rooted at a directory on disk.
#[derive(Debug)]
pub struct FileCache {
    root: PathBuf,
    horizon: SystemTime,
}

impl FileCache {
    /// Create a file cache at `root` whose entries live for `ttl`.
    ///
    /// The horizon (`now - ttl`) is computed once here; entries modified at or
    /// before it are treated as expired for the lifetime of this cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if `root` cannot be created.
    pub fn new(root: PathBuf, ttl: Duration) -> Result<Self, CacheError> {
        let horizon = SystemTime::now()
            .checked_sub(ttl)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        Self::with_horizon(root, horizon)
    }

    /// Create a file cache with an explicit horizon.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if `root` cannot be created.
    pub fn with_horizon(root: PathBuf, horizon: SystemTime) -> Result<Self, CacheError> {
        fs::create_dir_all(&root).map_err(|source| CacheError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root, horizon })
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entries modified at or before this instant are expired.
    #[must_use]
    pub fn horizon(&self) -> SystemTime {
        self.horizon
    }

    /// Path of the file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{key}.{EXTENSION}"))
    }

    /// Whether `key` exists and is newer than the horizon.
    #[must_use]
    pub fn is_fresh(&self, key: &str) -> bool {
        fs::metadata(self.path_for(key))
            .and_then(|meta| meta.modified())
            .is_ok_and(|modified| modified > self.horizon)
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        if !self.is_fresh(key) {
            tracing::debug!(key, path = %path.display(), "Cache entry expired");
            return None;
        }

        match fs::read(&path) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::debug!(key, error = %e, "Failed to read cache entry");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let tmp_path = self
            .root
            .join(format!(".{key}.{EXTENSION}.{}.tmp", std::process::id()));

        if let Err(source) = fs::write(&tmp_path, value) {
            let _ = fs::remove_file(&tmp_path);
            return Err(CacheError::Io {
                path: tmp_path,
                source,
            });
        }

        if let Err(source) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(CacheError::Io { path, source });
        }

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}
