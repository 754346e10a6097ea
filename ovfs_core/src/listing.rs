//! Flattening object enumerations into recursive directory listings
//!
//! Object stores have no real directories; a recursive listing derives a
//! `name/` marker for every ancestor of every key, each emitted exactly once.

use ovfs_common::{DirEntry, StatRecord};
use std::collections::HashSet;
use std::time::SystemTime;

/// One raw entry feeding a listing: a key relative to the listing root.
pub(crate) struct RawEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub is_dir: bool,
}

/// Build a recursive listing from raw relative entries, inserting ancestor
/// directory markers. Output order follows the backend; callers sort.
pub(crate) fn assemble(raw: impl IntoIterator<Item = RawEntry>) -> Vec<DirEntry> {
    let mut seen_dirs: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for entry in raw {
        if entry.name.is_empty() {
            continue;
        }

        // Ancestor markers first, so "a/" precedes "a/a.txt" in insertion
        // order too.
        let stem = entry.name.trim_end_matches('/');
        let mut offset = 0;
        while let Some(idx) = stem[offset..].find('/') {
            let marker = format!("{}/", &stem[..offset + idx]);
            offset += idx + 1;
            if seen_dirs.insert(marker.clone()) {
                out.push(DirEntry {
                    name: marker,
                    record: StatRecord::directory(),
                });
            }
        }

        if entry.is_dir || entry.name.ends_with('/') {
            let marker = format!("{}/", stem);
            if seen_dirs.insert(marker.clone()) {
                out.push(DirEntry {
                    name: marker,
                    record: StatRecord::directory(),
                });
            }
        } else {
            out.push(DirEntry {
                name: entry.name,
                record: StatRecord::file(entry.size, entry.modified),
            });
        }
    }

    out
}
