//! Session facade
//!
//! Control flow per request: resolve the virtual path, consult the stat
//! cache, fall through to the object store (optionally through the archive
//! layer), normalize the result into a stat record or listing.

use crate::archive::ArchiveReader;
use crate::cache::StatCache;
use crate::handle::FileHandle;
use crate::listing::{assemble, RawEntry};
use crate::path::VirtualPath;
use ovfs_common::{DirEntry, ObjectStore, SessionConfig, StatRecord, VfsError};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

pub struct VfsSession {
    config: SessionConfig,
    store: Arc<dyn ObjectStore>,
    cache: StatCache,
    archives: Mutex<HashMap<String, ArchiveReader>>,
}

/// Cache key for a directory record. A file `x` and a directory prefix `x/`
/// can both exist; the trailing slash keeps their records distinct.
fn dir_key(canonical: &str) -> String {
    format!("{}/", canonical)
}

impl VfsSession {
    /// Create a session against a real S3-compatible backend.
    ///
    /// Credential resolution happens here; a missing access key or secret
    /// is a construction failure, not a per-request fault.
    #[cfg(feature = "s3")]
    pub fn new(config: SessionConfig) -> Result<Self, VfsError> {
        let store = Arc::new(crate::store::S3Store::new(&config)?);
        Ok(Self::with_store(config, store))
    }

    /// Create a session over an explicit store backend.
    pub fn with_store(config: SessionConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            config,
            store,
            cache: StatCache::new(),
            archives: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of stat records currently cached
    pub fn cached_records(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached stat records and parsed containers.
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.locked_archives().clear();
    }

    /// Stat a virtual path.
    ///
    /// A well-formed path with no backing object is `Ok(None)`; errors are
    /// reserved for transport failures and unsupported paths. Paths covered
    /// by a prior recursive listing are answered from the cache.
    pub fn stat(&self, path: &str) -> Result<Option<StatRecord>, VfsError> {
        let vpath = VirtualPath::parse(path)?;
        let canonical = vpath.canonical();

        // File records live under the canonical path, directory records under
        // the slash-suffixed key. A trailing-slash query only consults the
        // latter; a bare query prefers the file, as the backend HEAD would.
        let cached = if vpath.is_dir_query() {
            self.cache.get(&dir_key(&canonical))
        } else {
            self.cache
                .get(&canonical)
                .or_else(|| self.cache.get(&dir_key(&canonical)))
        };
        if let Some(record) = cached {
            debug!("stat {}: cache hit", canonical);
            return Ok(Some(record));
        }

        match &vpath {
            VirtualPath::Plain { bucket, key } => {
                self.stat_plain(&canonical, bucket, key, vpath.is_dir_query())
            }
            VirtualPath::Archive { container, inner } => {
                self.stat_archive(&canonical, container, inner)
            }
        }
    }

    /// Recursively list a directory, returning files as `name` and
    /// directories as `name/`, relative to the root. Every entry's stat
    /// record is cached as a side effect.
    pub fn list_recursive(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let vpath = VirtualPath::parse(path)?;
        let canonical = vpath.canonical();

        let entries = match &vpath {
            VirtualPath::Plain { bucket, key } => {
                let trimmed = key.trim_end_matches('/');
                let prefix = if trimmed.is_empty() {
                    String::new()
                } else {
                    format!("{}/", trimmed)
                };

                let summaries = self.store.list(bucket, &prefix)?;
                if summaries.is_empty() && !trimmed.is_empty() {
                    return Err(VfsError::NotADirectory(canonical));
                }

                let raw: Vec<RawEntry> = summaries
                    .into_iter()
                    .filter_map(|s| {
                        let rel = s.key.strip_prefix(&prefix)?;
                        if rel.is_empty() {
                            return None;
                        }
                        Some(RawEntry {
                            name: rel.to_string(),
                            size: s.size,
                            modified: s.modified,
                            is_dir: s.key.ends_with('/'),
                        })
                    })
                    .collect();

                assemble(raw)
            }
            VirtualPath::Archive { container, inner } => self
                .with_archive(container, |reader| reader.list_recursive(inner))?
                .ok_or_else(|| {
                    VfsError::NotFound(format!("container absent for {}", canonical))
                })?,
        };

        for entry in &entries {
            // Directory names keep their trailing slash, so a file and a
            // directory sharing a stem cache under different keys.
            let full = format!("{}/{}", canonical, entry.name);
            self.cache.put(full, entry.record);
        }
        debug!(
            "list_recursive {}: {} entries cached",
            canonical,
            entries.len()
        );

        Ok(entries)
    }

    /// Open a virtual file for reading.
    ///
    /// Unlike `stat`, absence here is an error: the caller asked for
    /// content that does not exist.
    pub fn open(&self, path: &str) -> Result<FileHandle, VfsError> {
        let vpath = VirtualPath::parse(path)?;
        let canonical = vpath.canonical();

        match &vpath {
            VirtualPath::Plain { bucket, key } => {
                let trimmed = key.trim_end_matches('/');
                if trimmed.is_empty() || vpath.is_dir_query() {
                    return Err(VfsError::NotFound(canonical));
                }
                let data = self.store.get(bucket, trimmed, None)?;
                Ok(FileHandle::new(canonical, data))
            }
            VirtualPath::Archive { container, inner } => {
                let data = self
                    .with_archive(container, |reader| reader.read(inner))?
                    .ok_or_else(|| VfsError::NotFound(canonical.clone()))?;
                Ok(FileHandle::new(canonical, data))
            }
        }
    }

    /// Convenience wrapper: open and return the full content.
    pub fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let mut handle = self.open(path)?;
        let size = handle.size() as usize;
        handle.read_bytes(size)
    }

    fn stat_plain(
        &self,
        canonical: &str,
        bucket: &str,
        key: &str,
        dir_query: bool,
    ) -> Result<Option<StatRecord>, VfsError> {
        let trimmed = key.trim_end_matches('/');

        if !trimmed.is_empty() && !dir_query {
            if let Some(meta) = self.store.head(bucket, trimmed)? {
                let record = StatRecord::file(meta.size, meta.modified);
                self.cache.put(canonical.to_string(), record);
                return Ok(Some(record));
            }
        }

        // No object at this key; probe for keys below it.
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}/", trimmed)
        };

        if self.store.list(bucket, &prefix)?.is_empty() {
            debug!("stat {}: absent", canonical);
            Ok(None)
        } else {
            let record = StatRecord::directory();
            self.cache.put(dir_key(canonical), record);
            Ok(Some(record))
        }
    }

    fn stat_archive(
        &self,
        canonical: &str,
        container: &VirtualPath,
        inner: &str,
    ) -> Result<Option<StatRecord>, VfsError> {
        let stat = self.with_archive(container, |reader| Ok(reader.stat(inner)))?;
        match stat {
            Some(Some(record)) => {
                let key = if record.is_dir() {
                    dir_key(canonical)
                } else {
                    canonical.to_string()
                };
                self.cache.put(key, record);
                Ok(Some(record))
            }
            _ => Ok(None),
        }
    }

    fn locked_archives(&self) -> MutexGuard<'_, HashMap<String, ArchiveReader>> {
        match self.archives.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run `f` against the parsed reader for a container, opening and caching
    /// it on first use. `Ok(None)` means the container object is absent.
    fn with_archive<T>(
        &self,
        container: &VirtualPath,
        f: impl FnOnce(&mut ArchiveReader) -> Result<T, VfsError>,
    ) -> Result<Option<T>, VfsError> {
        let Some((bucket, key, size)) = self.container_of(container)? else {
            return Ok(None);
        };

        let canonical = container.canonical();
        let mut archives = self.locked_archives();
        let reader = match archives.entry(canonical) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(ArchiveReader::open(self.store.clone(), &bucket, &key, size)?)
            }
        };

        Ok(Some(f(reader)?))
    }

    /// Resolve a container path to (bucket, key, size), cache-aware.
    fn container_of(
        &self,
        container: &VirtualPath,
    ) -> Result<Option<(String, String, u64)>, VfsError> {
        let VirtualPath::Plain { bucket, key } = container else {
            return Err(VfsError::UnsupportedPath(format!(
                "{}: archive container must be a plain object",
                container
            )));
        };

        let trimmed = key.trim_end_matches('/');
        let canonical = container.canonical();

        let record = match self.cache.get(&canonical) {
            Some(record) => Some(record),
            None => self.stat_plain(&canonical, bucket, trimmed, false)?,
        };

        match record {
            Some(record) if !record.is_dir() => {
                Ok(Some((bucket.clone(), trimmed.to_string(), record.size)))
            }
            _ => Ok(None),
        }
    }
}
