//! Zip containers hosted in the object store
//!
//! `StoreReader` adapts ranged GETs into a `Read + Seek` source, so the zip
//! reader pulls the central directory and the requested entries without ever
//! downloading the whole container.

use crate::listing::{assemble, RawEntry};
use ovfs_common::{DirEntry, ObjectStore, StatRecord, VfsError};
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Fetch granularity for ranged reads. The zip central directory and local
/// headers are small; one chunk usually covers a whole cluster of seeks.
const CHUNK_SIZE: u64 = 64 * 1024;

/// `Read + Seek` over an object in the store, fetching on demand.
pub struct StoreReader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key: String,
    len: u64,
    pos: u64,
    buffer: Vec<u8>,
    buffer_start: u64,
}

impl StoreReader {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, key: &str, len: u64) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            key: key.to_string(),
            len,
            pos: 0,
            buffer: Vec::new(),
            buffer_start: 0,
        }
    }

    fn buffered(&self) -> Option<&[u8]> {
        let end = self.buffer_start + self.buffer.len() as u64;
        if self.pos >= self.buffer_start && self.pos < end {
            let offset = (self.pos - self.buffer_start) as usize;
            Some(&self.buffer[offset..])
        } else {
            None
        }
    }

    fn fill(&mut self, wanted: usize) -> std::io::Result<()> {
        let end = (self.pos + (wanted as u64).max(CHUNK_SIZE)).min(self.len);
        debug!(
            "range GET {}/{} bytes {}..{}",
            self.bucket, self.key, self.pos, end
        );
        let data = self
            .store
            .get(&self.bucket, &self.key, Some(self.pos..end))
            .map_err(std::io::Error::other)?;
        self.buffer_start = self.pos;
        self.buffer = data;
        Ok(())
    }
}

impl Read for StoreReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pos >= self.len || buf.is_empty() {
            return Ok(0);
        }

        if self.buffered().is_none() {
            self.fill(buf.len())?;
        }

        let available = self.buffered().unwrap_or(&[]);
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for StoreReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => self.len as i64 + offset,
            SeekFrom::Current(offset) => self.pos as i64 + offset,
        };

        if target < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start of object",
            ));
        }

        self.pos = target as u64;
        Ok(self.pos)
    }
}

struct ArchiveEntry {
    name: String,
    size: u64,
    modified: Option<SystemTime>,
    is_dir: bool,
}

/// A zip container resolved through the store.
pub struct ArchiveReader {
    container: String,
    archive: ZipArchive<StoreReader>,
    entries: Vec<ArchiveEntry>,
}

impl ArchiveReader {
    /// Open a container of known size. Only the central directory is read
    /// here.
    pub fn open(
        store: Arc<dyn ObjectStore>,
        bucket: &str,
        key: &str,
        size: u64,
    ) -> Result<Self, VfsError> {
        let container = format!("{}/{}", bucket, key);
        let reader = StoreReader::new(store, bucket, key, size);
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| VfsError::Archive(format!("{}: {}", container, e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive
                .by_index_raw(i)
                .map_err(|e| VfsError::Archive(format!("{}: {}", container, e)))?;
            entries.push(ArchiveEntry {
                name: file.name().to_string(),
                size: file.size(),
                modified: file.last_modified().to_time().ok().map(|dt| {
                    let timestamp = dt.unix_timestamp();
                    SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(timestamp as u64)
                }),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self {
            container,
            archive,
            entries,
        })
    }

    /// Stat an inner path. Exact name match only; names written with
    /// combining diacritics that do not byte-match the query resolve as
    /// absent.
    pub fn stat(&self, inner: &str) -> Option<StatRecord> {
        let trimmed = inner.trim_end_matches('/');
        let dir_query = inner.ends_with('/') && !trimmed.is_empty();

        if trimmed.is_empty() {
            return Some(StatRecord::directory());
        }

        if !dir_query {
            if let Some(entry) = self
                .entries
                .iter()
                .find(|e| !e.is_dir && e.name == trimmed)
            {
                return Some(StatRecord::file(entry.size, entry.modified));
            }
        }

        let child_prefix = format!("{}/", trimmed);
        let is_dir = self.entries.iter().any(|e| {
            (e.is_dir && e.name.trim_end_matches('/') == trimmed)
                || e.name.starts_with(&child_prefix)
        });

        if is_dir {
            Some(StatRecord::directory())
        } else {
            None
        }
    }

    /// Recursive listing of an inner directory, with ancestor markers.
    pub fn list_recursive(&self, inner: &str) -> Result<Vec<DirEntry>, VfsError> {
        let root = inner.trim_end_matches('/');
        let prefix = if root.is_empty() {
            String::new()
        } else {
            format!("{}/", root)
        };

        if !root.is_empty() && self.stat(&prefix).is_none() {
            return Err(VfsError::NotADirectory(format!(
                "{}/{}",
                self.container, root
            )));
        }

        let raw = self.entries.iter().filter_map(|e| {
            let rel = e.name.strip_prefix(&prefix)?;
            if rel.is_empty() {
                return None;
            }
            Some(RawEntry {
                name: rel.to_string(),
                size: e.size,
                modified: e.modified,
                is_dir: e.is_dir,
            })
        });

        Ok(assemble(raw.collect::<Vec<_>>()))
    }

    /// Read the full content of an inner file.
    pub fn read(&mut self, inner: &str) -> Result<Vec<u8>, VfsError> {
        let trimmed = inner.trim_end_matches('/');
        let mut file = self.archive.by_name(trimmed).map_err(|e| match e {
            ZipError::FileNotFound => {
                VfsError::NotFound(format!("{}/{}", self.container, trimmed))
            }
            e => VfsError::Archive(format!("{}: {}", self.container, e)),
        })?;

        if file.is_dir() {
            return Err(VfsError::NotFound(format!(
                "{}/{} is a directory",
                self.container, trimmed
            )));
        }

        let mut contents = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }
}
