//! The archive: index, page artifacts and lookups by URL.
//!
//! # Cache layout
//!
//! ```text
//! {cache_dir}/
//! +-- .index.json        # index snapshot { version, created, pages }
//! +-- .{sha256}.json     # page artifact, keyed by the source file path
//! ```
//!
//! A page artifact is used only while it is newer than the cache horizon,
//! the source file still has the size recorded in both the index and the
//! artifact, and its body matches the one scanned in this session, if any.
//! Otherwise the page is rebuilt, the artifact rewritten, and the index
//! entry's size corrected. Index corrections are written back by [`Archive::flush`], at
//! the latest when the archive is closed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_cache::{CacheStore, CacheStoreExt, FileCache, INDEX_KEY, NullCache, artifact_key};
use folio_config::{ArchiveConfig, Config};
use folio_render::Render;

use crate::envelope::{Artifact, Snapshot};
use crate::scan::{ScannedBodies, scan_directory};
use crate::{ArchiveError, EntryPatch, Index, IndexEntry, Page};

/// A directory of documents addressed by URL.
///
/// Create one per session and finish it with [`Archive::close`], or use
/// [`Archive::session`]. An archive dropped with unsaved index corrections
/// flushes them on a best-effort basis.
pub struct Archive {
    storage_dir: PathBuf,
    extension: String,
    skip_invalid: bool,
    cache: Box<dyn CacheStore>,
    renderer: Arc<dyn Render>,
    index: Option<Index>,
    bodies: ScannedBodies,
    dirty: bool,
}

impl Archive {
    /// Open the archive described by `config`.
    ///
    /// Creates the cache directory if needed. With caching enabled, a fresh
    /// index snapshot is loaded; otherwise the index is built on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] or [`ArchiveError::Cache`] if the cache
    /// directory cannot be created.
    pub fn new(config: &ArchiveConfig, renderer: Arc<dyn Render>) -> Result<Self, ArchiveError> {
        fs::create_dir_all(&config.cache_dir)
            .map_err(|e| ArchiveError::io(&config.cache_dir, e))?;

        let cache: Box<dyn CacheStore> = if config.cache_enabled {
            Box::new(FileCache::new(config.cache_dir.clone(), config.cache_ttl)?)
        } else {
            Box::new(NullCache)
        };
        Ok(Self::with_store(config, cache, renderer))
    }

    /// Open an archive backed by a custom cache store.
    ///
    /// `config.cache_dir`, `cache_enabled` and `cache_ttl` are ignored; the
    /// store decides where and for how long entries live.
    #[must_use]
    pub fn with_store(
        config: &ArchiveConfig,
        cache: Box<dyn CacheStore>,
        renderer: Arc<dyn Render>,
    ) -> Self {
        let index = load_snapshot(cache.as_ref());

        Self {
            storage_dir: config.storage_dir.clone(),
            extension: config.extension.clone(),
            skip_invalid: config.skip_invalid,
            cache,
            renderer,
            index,
            bodies: ScannedBodies::new(),
            dirty: false,
        }
    }

    /// Open the archive configured in `config`.
    ///
    /// # Errors
    ///
    /// See [`Archive::new`].
    pub fn from_config(config: &Config, renderer: Arc<dyn Render>) -> Result<Self, ArchiveError> {
        Self::new(&config.archive_resolved, renderer)
    }

    /// Run `f` against an archive and close it afterwards.
    ///
    /// The archive is closed whether `f` succeeds or fails. An error from `f`
    /// takes precedence over an error while closing.
    ///
    /// # Errors
    ///
    /// Returns the error of opening the archive, of `f`, or of closing.
    pub fn session<T, F>(
        config: &ArchiveConfig,
        renderer: Arc<dyn Render>,
        f: F,
    ) -> Result<T, ArchiveError>
    where
        F: FnOnce(&mut Self) -> Result<T, ArchiveError>,
    {
        let mut archive = Self::new(config, renderer)?;
        let result = f(&mut archive);
        let closed = archive.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Directory containing the documents.
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Current index, if one has been loaded or built.
    #[must_use]
    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    /// Bodies captured by the last scan in this session.
    #[must_use]
    pub fn scanned_bodies(&self) -> &ScannedBodies {
        &self.bodies
    }

    /// Whether the index has corrections not yet written to the cache.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// All pages, building the index if none is loaded.
    ///
    /// # Errors
    ///
    /// Returns the scan error if the index has to be built and the scan fails.
    pub fn list_pages(&mut self) -> Result<&Index, ArchiveError> {
        let index = match self.index.take() {
            Some(index) => index,
            None => self.scan()?,
        };
        Ok(&*self.index.insert(index))
    }

    /// Alias of [`Archive::list_pages`].
    ///
    /// # Errors
    ///
    /// See [`Archive::list_pages`].
    pub fn files_list(&mut self) -> Result<&Index, ArchiveError> {
        self.list_pages()
    }

    /// Rebuild the index by scanning the storage directory.
    ///
    /// The new index replaces the current one and, with caching enabled, is
    /// written as the index snapshot.
    ///
    /// # Errors
    ///
    /// Returns the scan error, or [`ArchiveError::Cache`] if the snapshot
    /// cannot be written.
    pub fn generate_index(&mut self) -> Result<&Index, ArchiveError> {
        let index = self.scan()?;
        Ok(&*self.index.insert(index))
    }

    /// Page with the given URL.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if no document has this URL, or the
    /// error of loading the page.
    pub fn get_by_url(&mut self, url: &str) -> Result<Page, ArchiveError> {
        let entry = self
            .list_pages()?
            .get(url)
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(url.to_owned()))?;
        self.load_file(&entry)
    }

    /// Page for an index entry, from its artifact if still valid.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] if the source file is gone or unreadable,
    /// a document error if it became invalid, or [`ArchiveError::Cache`] if
    /// the rebuilt artifact cannot be written.
    pub fn load_file(&mut self, entry: &IndexEntry) -> Result<Page, ArchiveError> {
        let scanned = self.bodies.get(&entry.meta.url).map(String::as_str);
        let (page, current_size) = self.load_page(entry, scanned)?;

        if entry.filesize != current_size {
            tracing::info!(
                url = %entry.meta.url,
                indexed = entry.filesize,
                current = current_size,
                "Source size changed"
            );
            let patch = EntryPatch::filesize(current_size);
            let patched = self
                .index
                .as_mut()
                .is_some_and(|index| index.patch(&entry.meta.url, &patch));
            self.dirty |= patched;
        }

        Ok(page)
    }

    /// Merge `patch` into the index entry at `url`.
    ///
    /// The change is written by the next [`Archive::flush`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] if no entry has this URL, or the
    /// scan error if the index has to be built first.
    pub fn patch_index(&mut self, url: &str, patch: &EntryPatch) -> Result<(), ArchiveError> {
        self.list_pages()?;
        let patched = self
            .index
            .as_mut()
            .is_some_and(|index| index.patch(url, patch));
        if !patched {
            return Err(ArchiveError::NotFound(url.to_owned()));
        }
        self.dirty = true;
        Ok(())
    }

    /// Write pending index corrections to the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Cache`] if the snapshot cannot be written; the
    /// corrections stay pending.
    pub fn flush(&mut self) -> Result<(), ArchiveError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(index) = &self.index {
            write_snapshot(self.cache.as_ref(), index)?;
        }
        self.dirty = false;
        Ok(())
    }

    /// Flush and close the archive.
    ///
    /// A failed flush is returned and not retried on drop.
    ///
    /// # Errors
    ///
    /// See [`Archive::flush`].
    pub fn close(mut self) -> Result<(), ArchiveError> {
        let result = self.flush();
        self.dirty = false;
        result
    }

    fn scan(&mut self) -> Result<Index, ArchiveError> {
        let scan = scan_directory(&self.storage_dir, &self.extension, self.skip_invalid)?;
        write_snapshot(self.cache.as_ref(), &scan.index)?;
        self.bodies = scan.bodies;
        self.dirty = false;
        Ok(scan.index)
    }

    /// Load or rebuild the page for `entry`, returning it with the current
    /// size of its source file.
    fn load_page(
        &self,
        entry: &IndexEntry,
        scanned: Option<&str>,
    ) -> Result<(Page, u64), ArchiveError> {
        let renderer = self.renderer.as_ref();
        let key = artifact_key(&entry.filepath);
        let current_size = fs::metadata(&entry.filepath)
            .map_err(|e| ArchiveError::io(&entry.filepath, e))?
            .len();

        // The artifact must agree with the source size and with the body
        // scanned in this session.
        let cached = if entry.filesize == current_size {
            self.cache
                .get_json::<Artifact<Page>>(&key)
                .and_then(Artifact::into_current)
                .filter(|page| page.filesize() == current_size)
                .filter(|page| scanned.is_none_or(|body| page.loaded_raw_body() == Some(body)))
        } else {
            None
        };

        if let Some(page) = cached {
            tracing::debug!(url = %entry.meta.url, "Page artifact hit");
            return Ok((page, current_size));
        }

        tracing::debug!(url = %entry.meta.url, "Page artifact miss");
        let mut page = Page::new(entry);
        page.set_filesize(current_size);
        if let Some(body) = scanned {
            page.set_raw_body(body, Some(renderer));
        }
        page.compile(renderer)?;
        self.cache.set_json(&key, &Artifact::new(&page))?;

        Ok((page, current_size))
    }
}

impl Drop for Archive {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(
                dir = %self.storage_dir.display(),
                error = %e,
                "Failed to flush archive index"
            );
        }
    }
}

fn load_snapshot(cache: &dyn CacheStore) -> Option<Index> {
    if !cache.is_enabled() {
        return None;
    }
    let Some(snapshot) = cache.get_json::<Snapshot<Index>>(INDEX_KEY) else {
        tracing::debug!("No fresh index snapshot");
        return None;
    };
    let index = snapshot.into_current();
    if index.is_none() {
        tracing::warn!("Ignoring index snapshot from another cache version");
    }
    index
}

fn write_snapshot(cache: &dyn CacheStore, index: &Index) -> Result<(), ArchiveError> {
    if !cache.is_enabled() {
        return Ok(());
    }
    cache.set_json(INDEX_KEY, &Snapshot::new(index))?;
    tracing::info!(page_count = index.len(), "Index snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};

    use folio_cache::CacheError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::testing::CountingRenderer;

    const HELLO: &str = "title: Hello\nurl: hello\n===\n# Hi";

    struct Fixture {
        _tmp: TempDir,
        config: ArchiveConfig,
        renderer: Arc<CountingRenderer>,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let storage_dir = tmp.path().join("pages");
            fs::create_dir(&storage_dir).unwrap();
            Self {
                config: ArchiveConfig::for_storage(storage_dir),
                _tmp: tmp,
                renderer: Arc::new(CountingRenderer::default()),
            }
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.config.storage_dir.join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn renderer(&self) -> Arc<dyn Render> {
            let renderer: Arc<CountingRenderer> = Arc::clone(&self.renderer);
            renderer
        }

        fn open(&self) -> Archive {
            Archive::new(&self.config, self.renderer()).unwrap()
        }

        fn renders(&self) -> usize {
            self.renderer.count()
        }

        fn artifact_path(&self, source: &Path) -> PathBuf {
            let key = artifact_key(&fs::canonicalize(source).unwrap());
            self.config.cache_dir.join(format!(".{key}.json"))
        }

        fn snapshot_path(&self) -> PathBuf {
            self.config.cache_dir.join(".index.json")
        }
    }

    fn backdate(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_get_by_url_returns_page() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        let mut archive = fx.open();

        let mut page = archive.get_by_url("hello").unwrap();

        assert_eq!(page.url(), "hello");
        assert_eq!(page.title(), "Hello");
        assert_eq!(page.raw_body().unwrap(), "# Hi");
        assert_eq!(page.html(fx.renderer.as_ref()).unwrap(), "<p># Hi</p>");
    }

    #[test]
    fn test_markdown_renderer_end_to_end() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        let renderer: Arc<dyn Render> = Arc::new(folio_render::MarkdownRenderer::new());
        let mut archive = Archive::new(&fx.config, Arc::clone(&renderer)).unwrap();

        let mut page = archive.get_by_url("hello").unwrap();

        assert_eq!(page.title(), "Hello");
        assert!(page.html(renderer.as_ref()).unwrap().contains("<h1>Hi</h1>"));
    }

    #[test]
    fn test_get_by_url_unknown() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        let mut archive = fx.open();

        let err = archive.get_by_url("missing").unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound(ref url) if url == "missing"));
    }

    #[test]
    fn test_new_creates_cache_dir_and_loads_no_index() {
        let fx = Fixture::new();
        let archive = fx.open();

        assert!(fx.config.cache_dir.is_dir());
        assert!(archive.index().is_none());
    }

    #[test]
    fn test_cache_dir_created_when_disabled() {
        let mut fx = Fixture::new();
        fx.config.cache_enabled = false;
        fx.write("hello.md", HELLO);
        let mut archive = fx.open();
        archive.list_pages().unwrap();

        assert!(fx.config.cache_dir.is_dir());
        assert!(!fx.snapshot_path().exists());
    }

    #[test]
    fn test_list_pages_writes_snapshot() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fx.write("world.md", "title: World\nurl: world\n===\nBody");
        let mut archive = fx.open();

        let urls: Vec<String> = archive
            .list_pages()
            .unwrap()
            .urls()
            .map(str::to_owned)
            .collect();

        assert_eq!(urls, vec!["hello", "world"]);
        assert!(fx.snapshot_path().exists());
        assert_eq!(archive.files_list().unwrap().len(), 2);
    }

    #[test]
    fn test_snapshot_reused_by_next_archive() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fx.open().list_pages().unwrap();
        fx.write("late.md", "title: Late\nurl: late\n===\nBody");

        let archive = fx.open();

        let index = archive.index().unwrap();
        assert_eq!(index.urls().collect::<Vec<_>>(), vec!["hello"]);
    }

    #[test]
    fn test_expired_snapshot_triggers_scan() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fx.open().list_pages().unwrap();
        fx.write("late.md", "title: Late\nurl: late\n===\nBody");
        backdate(&fx.snapshot_path(), fx.config.cache_ttl * 2);

        let mut archive = fx.open();

        assert!(archive.index().is_none());
        assert_eq!(archive.list_pages().unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_snapshot_is_ignored() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fs::create_dir_all(&fx.config.cache_dir).unwrap();
        fs::write(fx.snapshot_path(), "{not json").unwrap();

        let mut archive = fx.open();

        assert!(archive.index().is_none());
        assert_eq!(archive.list_pages().unwrap().len(), 1);
    }

    #[test]
    fn test_html_once_per_page() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        let mut archive = fx.open();
        let mut page = archive.get_by_url("hello").unwrap();

        page.html(fx.renderer.as_ref()).unwrap();
        page.html(fx.renderer.as_ref()).unwrap();

        assert_eq!(fx.renders(), 1);
    }

    #[test]
    fn test_same_session_lookups_render_once() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        let mut archive = fx.open();

        let first = archive.get_by_url("hello").unwrap();
        let second = archive.get_by_url("hello").unwrap();

        assert_eq!(fx.renders(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_same_session_lookups_with_snapshot_render_once() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fx.open().list_pages().unwrap();
        let mut archive = fx.open();

        archive.get_by_url("hello").unwrap();
        archive.get_by_url("hello").unwrap();

        assert_eq!(fx.renders(), 1);
    }

    #[test]
    fn test_artifact_reused_across_sessions() {
        let fx = Fixture::new();
        let source = fx.write("hello.md", HELLO);
        fx.open().get_by_url("hello").unwrap();
        assert!(fx.artifact_path(&source).exists());

        let mut page = fx.open().get_by_url("hello").unwrap();

        assert_eq!(fx.renders(), 1);
        assert_eq!(page.raw_body().unwrap(), "# Hi");
        assert_eq!(page.html(fx.renderer.as_ref()).unwrap(), "<p># Hi</p>");
        assert_eq!(fx.renders(), 1);
    }

    #[test]
    fn test_artifact_round_trip_preserves_page() {
        let fx = Fixture::new();
        fx.write(
            "hello.md",
            "title: Hello\nurl: hello\nauthor: Jane\ntag: rust\n===\n# Hi",
        );
        let fresh = fx.open().get_by_url("hello").unwrap();

        let restored = fx.open().get_by_url("hello").unwrap();

        assert_eq!(restored, fresh);
        assert_eq!(restored.author(), Some("Jane"));
        assert_eq!(restored.get("tag").unwrap(), "rust");
        assert_eq!(restored.loaded_raw_body(), Some("# Hi"));
        assert!(restored.is_compiled());
    }

    #[test]
    fn test_expired_artifact_is_rebuilt() {
        let fx = Fixture::new();
        let source = fx.write("hello.md", HELLO);
        fx.open().get_by_url("hello").unwrap();
        backdate(&fx.artifact_path(&source), fx.config.cache_ttl * 2);

        fx.open().get_by_url("hello").unwrap();

        assert_eq!(fx.renders(), 2);
    }

    #[test]
    fn test_stale_artifact_version_is_rebuilt() {
        let fx = Fixture::new();
        let source = fx.write("hello.md", HELLO);
        fx.open().get_by_url("hello").unwrap();
        let artifact = fx.artifact_path(&source);
        let mut json: serde_json::Value =
            serde_json::from_slice(&fs::read(&artifact).unwrap()).unwrap();
        json["version"] = serde_json::json!(0);
        fs::write(&artifact, serde_json::to_vec(&json).unwrap()).unwrap();

        fx.open().get_by_url("hello").unwrap();

        assert_eq!(fx.renders(), 2);
    }

    #[test]
    fn test_size_change_rebuilds_page_and_patches_index() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fx.open().get_by_url("hello").unwrap();
        let updated = "title: Hello\nurl: hello\n===\n# Hello again";
        fx.write("hello.md", updated);

        let mut archive = fx.open();
        let mut page = archive.get_by_url("hello").unwrap();

        assert_eq!(page.raw_body().unwrap(), "# Hello again");
        assert_eq!(page.filesize(), updated.len() as u64);
        assert_eq!(fx.renders(), 2);
        assert!(archive.is_dirty());
        assert_eq!(
            archive.index().unwrap().get("hello").unwrap().filesize,
            updated.len() as u64
        );

        archive.close().unwrap();

        let archive = fx.open();
        assert_eq!(
            archive.index().unwrap().get("hello").unwrap().filesize,
            updated.len() as u64
        );
    }

    #[test]
    fn test_drop_flushes_patched_index() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        {
            let mut archive = fx.open();
            archive.list_pages().unwrap();
            archive.patch_index("hello", &EntryPatch::filesize(1)).unwrap();
        }

        let archive = fx.open();
        assert_eq!(archive.index().unwrap().get("hello").unwrap().filesize, 1);
    }

    #[test]
    fn test_patch_index() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fx.write("world.md", "title: World\nurl: world\n===\nBody");
        let mut archive = fx.open();
        let before = archive.list_pages().unwrap().get("world").unwrap().clone();

        let mut patch = EntryPatch::default();
        patch.extra.insert("views".to_owned(), "3".to_owned());
        archive.patch_index("hello", &patch).unwrap();

        let index = archive.index().unwrap();
        assert_eq!(index.get("hello").unwrap().meta.extra["views"], "3");
        assert_eq!(index.get("hello").unwrap().meta.title, "Hello");
        assert_eq!(index.get("world").unwrap(), &before);
        assert!(archive.is_dirty());

        archive.flush().unwrap();
        assert!(!archive.is_dirty());
    }

    #[test]
    fn test_patch_index_unknown_url() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        let mut archive = fx.open();

        let err = archive
            .patch_index("missing", &EntryPatch::filesize(1))
            .unwrap_err();

        assert!(matches!(err, ArchiveError::NotFound(_)));
        assert!(!archive.is_dirty());
    }

    #[test]
    fn test_scan_failure_names_file() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fx.write("nourl.md", "title: No url\n===\nbody");
        let mut archive = fx.open();

        let err = archive.list_pages().unwrap_err();

        match err {
            ArchiveError::IncompleteMetadata { path, field } => {
                assert!(path.ends_with("nourl.md"));
                assert_eq!(field, "url");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skip_invalid_config() {
        let mut fx = Fixture::new();
        fx.config.skip_invalid = true;
        fx.write("hello.md", HELLO);
        fx.write("nourl.md", "title: No url\n===\nbody");
        let mut archive = fx.open();

        assert_eq!(archive.list_pages().unwrap().len(), 1);
    }

    #[test]
    fn test_cache_disabled_renders_every_session() {
        let mut fx = Fixture::new();
        fx.config.cache_enabled = false;
        let source = fx.write("hello.md", HELLO);

        fx.open().get_by_url("hello").unwrap();
        fx.open().get_by_url("hello").unwrap();

        assert_eq!(fx.renders(), 2);
        assert!(!fx.artifact_path(&source).exists());
    }

    #[test]
    fn test_scanned_body_refreshes_cached_page() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fx.open().get_by_url("hello").unwrap();
        // Same size, different content: the artifact still looks valid.
        fx.write("hello.md", "title: Hello\nurl: hello\n===\n# Yo");

        let mut archive = fx.open();
        archive.generate_index().unwrap();
        let mut page = archive.get_by_url("hello").unwrap();

        assert_eq!(page.raw_body().unwrap(), "# Yo");
        assert_eq!(page.html(fx.renderer.as_ref()).unwrap(), "<p># Yo</p>");
        archive.close().unwrap();

        // The rebuilt artifact serves the next session without a scan.
        let mut page = fx.open().get_by_url("hello").unwrap();
        assert_eq!(page.raw_body().unwrap(), "# Yo");
        assert_eq!(fx.renders(), 2);
    }

    #[test]
    fn test_size_change_after_rescan_rewrites_artifact() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        fx.open().get_by_url("hello").unwrap();
        let updated = "title: Hello\nurl: hello\n===\n# Hello again, longer";
        fx.write("hello.md", updated);
        backdate(&fx.snapshot_path(), fx.config.cache_ttl * 2);

        // Rescan records the new size while the old artifact is still fresh.
        let mut archive = fx.open();
        let page = archive.get_by_url("hello").unwrap();
        assert_eq!(page.filesize(), updated.len() as u64);
        archive.close().unwrap();

        let mut page = fx.open().get_by_url("hello").unwrap();

        assert_eq!(page.raw_body().unwrap(), "# Hello again, longer");
        assert_eq!(page.filesize(), updated.len() as u64);
        assert_eq!(page.get("filesize").unwrap(), updated.len().to_string());
        assert_eq!(fx.renders(), 2);
    }

    #[test]
    fn test_artifact_with_stale_size_is_rebuilt() {
        let fx = Fixture::new();
        let source = fx.write("hello.md", HELLO);
        fx.open().get_by_url("hello").unwrap();
        let artifact = fx.artifact_path(&source);
        let mut json: serde_json::Value =
            serde_json::from_slice(&fs::read(&artifact).unwrap()).unwrap();
        json["page"]["entry"]["filesize"] = serde_json::json!(1);
        fs::write(&artifact, serde_json::to_vec(&json).unwrap()).unwrap();

        let page = fx.open().get_by_url("hello").unwrap();

        assert_eq!(page.filesize(), HELLO.len() as u64);
        assert_eq!(fx.renders(), 2);
    }

    #[test]
    fn test_missing_source_file() {
        let fx = Fixture::new();
        let source = fx.write("hello.md", HELLO);
        let mut archive = fx.open();
        archive.list_pages().unwrap();
        fs::remove_file(source).unwrap();

        let err = archive.get_by_url("hello").unwrap_err();
        assert!(matches!(err, ArchiveError::Io { .. }));
    }

    #[test]
    fn test_session_closes_on_success_and_error() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);

        let title = Archive::session(&fx.config, fx.renderer(), |archive| {
            archive.patch_index("hello", &EntryPatch::filesize(5))?;
            Ok(archive.get_by_url("hello")?.title().to_owned())
        })
        .unwrap();
        assert_eq!(title, "Hello");

        let err = Archive::session(&fx.config, fx.renderer(), |archive| {
            let mut patch = EntryPatch::default();
            patch.extra.insert("seen".to_owned(), "yes".to_owned());
            archive.patch_index("hello", &patch)?;
            archive.get_by_url("missing")
        })
        .unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound(_)));

        let archive = fx.open();
        let entry = archive.index().unwrap().get("hello").unwrap();
        assert_eq!(entry.meta.extra["seen"], "yes");
        assert_eq!(entry.filesize, HELLO.len() as u64);
    }

    #[test]
    fn test_from_config() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        let mut config = Config::default();
        config.archive_resolved = fx.config.clone();

        let mut archive = Archive::from_config(&config, fx.renderer()).unwrap();

        assert_eq!(archive.storage_dir(), fx.config.storage_dir.as_path());
        assert_eq!(archive.get_by_url("hello").unwrap().title(), "Hello");
    }

    /// Store that accepts writes until `failing` is set, then rejects them.
    #[derive(Default)]
    struct FlakyStore {
        failing: Arc<AtomicBool>,
        rejected: Arc<AtomicUsize>,
    }

    impl CacheStore for FlakyStore {
        fn get(&self, _key: &str) -> Option<Vec<u8>> {
            None
        }

        fn set(&self, key: &str, _value: &[u8]) -> Result<(), CacheError> {
            if !self.failing.load(Ordering::SeqCst) {
                return Ok(());
            }
            self.rejected.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Io {
                path: PathBuf::from(key),
                source: std::io::Error::other("read-only cache"),
            })
        }

        fn is_enabled(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_failed_close_is_not_retried_on_drop() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        let store = FlakyStore::default();
        let failing = Arc::clone(&store.failing);
        let rejected = Arc::clone(&store.rejected);
        let mut archive = Archive::with_store(&fx.config, Box::new(store), fx.renderer());
        archive.patch_index("hello", &EntryPatch::filesize(1)).unwrap();
        failing.store(true, Ordering::SeqCst);

        let err = archive.close().unwrap_err();

        assert!(matches!(err, ArchiveError::Cache(_)));
        assert_eq!(rejected.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_flush_failure_is_logged_not_raised() {
        let fx = Fixture::new();
        fx.write("hello.md", HELLO);
        let store = FlakyStore::default();
        let failing = Arc::clone(&store.failing);
        let rejected = Arc::clone(&store.rejected);
        {
            let mut archive = Archive::with_store(&fx.config, Box::new(store), fx.renderer());
            archive.patch_index("hello", &EntryPatch::filesize(1)).unwrap();
            failing.store(true, Ordering::SeqCst);
        }

        assert_eq!(rejected.load(Ordering::SeqCst), 1);
    }
}
