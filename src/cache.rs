//! # Content-Addressed Download Cache
//!
//! Fetched trees are stored on disk under a directory named by the SHA-256 of
//! the source with its protocol prefix stripped. Two spellings of the same
//! logical source (`git::github.com/x/y` and `github.com/x/y`) share an entry.
//!
//! ## Key Components
//!
//! - **`CacheKey`**: the hex digest identifying an entry.
//! - **`DownloadCache`**: the on-disk store. Entries are published by copying
//!   into a hidden staging directory inside the cache root and renaming it to
//!   the final key name, so an entry is either absent or complete.
//! - **`CachingFetcher`**: a [`Fetcher`] decorator consulting the cache before
//!   delegating to the wrapped fetcher, and writing successful fetches through.
//!
//! Entries are never evicted automatically; see [`DownloadCache::remove`] and
//! [`DownloadCache::clear`].

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::filesystem;
use crate::source::Source;

/// Suffix of the sidecar file recording which source populated an entry.
const SOURCE_SUFFIX: &str = "source";

/// Hash key of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Computes the key of `src`, ignoring any protocol prefix.
    pub fn for_source(src: &str) -> Self {
        let source = Source::new(src);
        CacheKey(format!("{:x}", Sha256::digest(source.normalized().as_bytes())))
    }

    /// Accepts a user-supplied key, as printed by `cache list`.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == 64 && raw.chars().all(|c| c.is_ascii_hexdigit());
        valid.then(|| CacheKey(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Summary of one cache entry.
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub key: CacheKey,
    pub path: PathBuf,
    pub size: u64,
    pub file_count: usize,
    pub modified: Option<SystemTime>,
    /// The source that populated the entry, when recorded.
    pub source: Option<String>,
}

fn cache_error(action: &str, key: &CacheKey, e: impl fmt::Display) -> Error {
    Error::Cache {
        message: format!("cannot {} entry {}: {}", action, key, e),
    }
}

/// On-disk store of fetched trees.
#[derive(Debug)]
pub struct DownloadCache {
    root: PathBuf,
    locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl DownloadCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry for `key`, whether or not it exists.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    fn source_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}.{}", key, SOURCE_SUFFIX))
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entry_path(key).is_dir()
    }

    /// The mutex serialising access to `key` within this process.
    pub fn key_lock(&self, key: &CacheKey) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| Error::LockPoisoned {
            context: "download cache key table".to_string(),
        })?;
        Ok(locks.entry(key.clone()).or_default().clone())
    }

    /// Copies the entry for `key` onto `dst`.
    ///
    /// The copy is staged next to `dst` and renamed into place, so `dst` is
    /// never left half-populated.
    pub fn restore(&self, key: &CacheKey, dst: &Path) -> Result<()> {
        let staging = filesystem::staging_dir_for(dst, ".furyctl-restore-")
            .map_err(|e| cache_error("stage restore of", key, e))?;
        let content = staging.path().join("content");
        filesystem::copy_tree(&self.entry_path(key), &content)
            .map_err(|e| cache_error("read", key, e))?;
        filesystem::replace_dir(&content, dst).map_err(|e| cache_error("restore", key, e))
    }

    /// Publishes a copy of `from` as the entry for `key`.
    pub fn store(&self, key: &CacheKey, src: &str, from: &Path) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| cache_error("create root for", key, e))?;
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}-", key))
            .tempdir_in(&self.root)
            .map_err(|e| cache_error("stage", key, e))?;
        let content = staging.path().join("content");
        filesystem::copy_tree(from, &content).map_err(|e| cache_error("populate", key, e))?;
        filesystem::replace_dir(&content, &self.entry_path(key))
            .map_err(|e| cache_error("publish", key, e))?;
        fs::write(self.source_path(key), src).map_err(|e| cache_error("annotate", key, e))?;
        Ok(())
    }

    /// Lists complete entries, sorted by key. Staging directories are skipped.
    pub fn entries(&self) -> Result<Vec<CacheEntryInfo>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(key) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(CacheKey::parse)
            else {
                continue;
            };

            let (size, file_count) = filesystem::tree_stats(&path);
            let modified = entry.metadata().and_then(|m| m.modified()).ok();
            let source = fs::read_to_string(self.source_path(&key)).ok();
            entries.push(CacheEntryInfo {
                key,
                path,
                size,
                file_count,
                modified,
                source,
            });
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Deletes one entry. Returns whether it existed.
    pub fn remove(&self, key: &CacheKey) -> Result<bool> {
        let lock = self.key_lock(key)?;
        let _guard = lock.lock().map_err(|_| Error::LockPoisoned {
            context: format!("cache entry {}", key),
        })?;

        let existed = self.contains(key);
        filesystem::remove_if_exists(&self.entry_path(key))
            .map_err(|e| cache_error("remove", key, e))?;
        filesystem::remove_if_exists(&self.source_path(key))
            .map_err(|e| cache_error("remove", key, e))?;
        Ok(existed)
    }

    /// Deletes every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.entries()?;
        let mut removed = 0;
        for entry in &entries {
            if self.remove(&entry.key)? {
                removed += 1;
            }
        }
        info!("Removed {} cache entries from {}", removed, self.root.display());
        Ok(removed)
    }
}

/// A [`Fetcher`] that serves repeated sources from a [`DownloadCache`].
pub struct CachingFetcher<F> {
    inner: F,
    cache: Arc<DownloadCache>,
}

impl<F: Fetcher> CachingFetcher<F> {
    pub fn new(inner: F, cache: Arc<DownloadCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &DownloadCache {
        &self.cache
    }
}

impl<F: Fetcher> Fetcher for CachingFetcher<F> {
    fn download(&self, src: &str, dst: &Path) -> Result<()> {
        let key = CacheKey::for_source(src);
        let lock = self.cache.key_lock(&key)?;
        let _guard = lock.lock().map_err(|_| Error::LockPoisoned {
            context: format!("cache entry {}", key),
        })?;

        if self.cache.contains(&key) {
            if dst.exists() {
                debug!("{} already present at {}", src, dst.display());
                return Ok(());
            }
            debug!("Cache hit for {} ({})", src, key);
            return self.cache.restore(&key, dst);
        }

        debug!("Cache miss for {} ({})", src, key);
        self.inner
            .download(src, dst)
            .map_err(|e| Error::CannotCacheDownload {
                src: src.to_string(),
                source: Box::new(e),
            })?;
        self.cache.store(&key, src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Writes a small tree into `dst`, or fails when `fail` is set.
    struct MockFetcher {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl MockFetcher {
        fn new() -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                fail: true,
            }
        }
    }

    impl Fetcher for MockFetcher {
        fn download(&self, src: &str, dst: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Download {
                    src: src.to_string(),
                    message: "network unreachable".to_string(),
                });
            }
            fs::create_dir_all(dst.join("schemas/public"))?;
            fs::write(dst.join("kfd.yaml"), "version: v1.24.7\n")?;
            fs::write(dst.join("schemas/public/ekscluster-kfd-v1alpha2.json"), "{}")?;
            Ok(())
        }
    }

    fn setup() -> (TempDir, Arc<DownloadCache>) {
        let temp = TempDir::new().unwrap();
        let cache = Arc::new(DownloadCache::new(temp.path().join("cache")));
        (temp, cache)
    }

    #[test]
    fn test_cache_key_ignores_protocol_prefix() {
        let plain = CacheKey::for_source("github.com/sighupio/fury-distribution?ref=v1.24.7");
        let forced = CacheKey::for_source("git::github.com/sighupio/fury-distribution?ref=v1.24.7");
        assert_eq!(plain, forced);
        assert_eq!(plain.as_str().len(), 64);

        let other = CacheKey::for_source("github.com/sighupio/fury-distribution?ref=v1.25.0");
        assert_ne!(plain, other);
    }

    #[test]
    fn test_cache_key_parse() {
        let key = CacheKey::for_source("file::/tmp/bundle");
        assert_eq!(CacheKey::parse(key.as_str()), Some(key));
        assert_eq!(CacheKey::parse("not-a-key"), None);
        assert_eq!(CacheKey::parse(&"g".repeat(64)), None);
    }

    #[test]
    fn test_miss_fetches_and_writes_through() {
        let (temp, cache) = setup();
        let inner = MockFetcher::new();
        let calls = inner.calls.clone();
        let fetcher = CachingFetcher::new(inner, cache.clone());
        let dst = temp.path().join("distribution");

        fetcher.download("file::/srv/bundle", &dst).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(dst.join("kfd.yaml").is_file());
        let key = CacheKey::for_source("/srv/bundle");
        assert!(cache.contains(&key));
        assert!(cache.entry_path(&key).join("schemas/public").is_dir());
    }

    #[test]
    fn test_warm_cache_serves_without_inner_fetcher() {
        let (temp, cache) = setup();
        CachingFetcher::new(MockFetcher::new(), cache.clone())
            .download("git::github.com/sighupio/fury-distribution", &temp.path().join("first"))
            .unwrap();

        let failing = MockFetcher::failing();
        let calls = failing.calls.clone();
        let fetcher = CachingFetcher::new(failing, cache);
        let dst = temp.path().join("second");

        // Different prefix, same logical source.
        fetcher
            .download("github.com/sighupio/fury-distribution", &dst)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(dst.join("kfd.yaml").is_file());
    }

    #[test]
    fn test_existing_destination_is_left_untouched() {
        let (temp, cache) = setup();
        let inner = MockFetcher::new();
        let calls = inner.calls.clone();
        let fetcher = CachingFetcher::new(inner, cache);
        let dst = temp.path().join("distribution");

        fetcher.download("file::/srv/bundle", &dst).unwrap();
        fs::write(dst.join("local-edit.yaml"), "mine").unwrap();
        fetcher.download("file::/srv/bundle", &dst).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs::read_to_string(dst.join("local-edit.yaml")).unwrap(), "mine");
    }

    #[test]
    fn test_failed_fetch_is_not_cached() {
        let (temp, cache) = setup();
        let fetcher = CachingFetcher::new(MockFetcher::failing(), cache.clone());

        let result = fetcher.download("file::/srv/bundle", &temp.path().join("d"));

        match result {
            Err(Error::CannotCacheDownload { source, .. }) => {
                assert!(matches!(*source, Error::Download { .. }));
            }
            other => panic!("expected CannotCacheDownload, got {:?}", other),
        }
        assert!(!cache.contains(&CacheKey::for_source("/srv/bundle")));
        assert!(cache.entries().unwrap().is_empty());
    }

    #[test]
    fn test_entries_skip_staging_and_record_source() {
        let (temp, cache) = setup();
        CachingFetcher::new(MockFetcher::new(), cache.clone())
            .download("file::/srv/bundle", &temp.path().join("d"))
            .unwrap();
        fs::create_dir_all(cache.root().join(".deadbeef-stage")).unwrap();

        let entries = cache.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_count, 2);
        assert_eq!(entries[0].source.as_deref(), Some("file::/srv/bundle"));
    }

    #[test]
    fn test_remove_and_clear() {
        let (temp, cache) = setup();
        let fetcher = CachingFetcher::new(MockFetcher::new(), cache.clone());
        fetcher.download("file::/srv/a", &temp.path().join("a")).unwrap();
        fetcher.download("file::/srv/b", &temp.path().join("b")).unwrap();

        let key = CacheKey::for_source("/srv/a");
        assert!(cache.remove(&key).unwrap());
        assert!(!cache.remove(&key).unwrap());
        assert_eq!(cache.entries().unwrap().len(), 1);

        assert_eq!(cache.clear().unwrap(), 1);
        assert!(cache.entries().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_downloads_of_one_key_fetch_once() {
        let (temp, cache) = setup();
        let inner = MockFetcher::new();
        let calls = inner.calls.clone();
        let fetcher = Arc::new(CachingFetcher::new(inner, cache));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let fetcher = fetcher.clone();
                let dst = temp.path().join(format!("dst-{}", i));
                std::thread::spawn(move || fetcher.download("git::example.com/bundle", &dst))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
