use ovfs_common::StatRecord;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// In-memory stat cache populated by recursive listings
///
/// Keys are canonical full logical paths; lookups are path-exact, never by
/// prefix. Invalidation is explicit only (`clear`), there is no TTL.
#[derive(Clone, Default)]
pub struct StatCache {
    entries: Arc<RwLock<HashMap<String, StatRecord>>>,
}

impl StatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached record for a canonical path
    pub fn get(&self, path: &str) -> Option<StatRecord> {
        self.entries.read().ok()?.get(path).copied()
    }

    /// Store a record under a canonical path
    pub fn put(&self, path: String, record: StatRecord) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(path, record);
        }
    }

    /// Drop every cached record; the next stat for any path goes back to
    /// the backend.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            let dropped = entries.len();
            entries.clear();
            debug!("Cleared {} cached stat records", dropped);
        }
    }

    /// Number of cached records
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
