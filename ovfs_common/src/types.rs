use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File or directory distinction for a stat record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// Metadata for a virtual path.
///
/// `modified` is `None` until the backend has actually reported a
/// modification time; entries taken from a real listing always carry one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub kind: EntryKind,
}

impl StatRecord {
    pub fn file(size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            size,
            modified,
            kind: EntryKind::File,
        }
    }

    pub fn directory() -> Self {
        Self {
            size: 0,
            modified: None,
            kind: EntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// One entry of a recursive listing.
///
/// `name` is relative to the listing root; directories carry a trailing `/`.
/// Listing order carries no guarantee, callers sort before comparing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub record: StatRecord,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.record.is_dir()
    }
}
