use ovfs_common::{ObjectMeta, ObjectStore, ObjectSummary, StoreError};
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

/// In-process object store used by the test suite in place of a live
/// S3-compatible endpoint.
///
/// Keys within a bucket enumerate in lexicographic byte order, range reads
/// clamp to object length, and a missing object heads as `Ok(None)` --
/// matching the wire behavior the real backend exhibits.
pub struct MemoryStore {
    instance_id: String,
    objects: RwLock<BTreeMap<(String, String), StoredObject>>,
}

struct StoredObject {
    data: Vec<u8>,
    modified: SystemTime,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            instance_id: "memory".to_string(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert an object with a synthetic modification time.
    pub fn put(&self, bucket: &str, key: &str, data: &[u8]) {
        // Deterministic non-epoch mtime so tests can assert it is resolved.
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        self.put_with_mtime(bucket, key, data, modified);
    }

    pub fn put_with_mtime(&self, bucket: &str, key: &str, data: &[u8], modified: SystemTime) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(
                (bucket.to_string(), key.to_string()),
                StoredObject {
                    data: data.to_vec(),
                    modified,
                },
            );
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, StoreError> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StoreError::Transport("store lock poisoned".to_string()))?;

        Ok(objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|obj| ObjectMeta {
                size: obj.data.len() as u64,
                modified: Some(obj.modified),
            }))
    }

    fn get(
        &self,
        bucket: &str,
        key: &str,
        range: Option<Range<u64>>,
    ) -> Result<Vec<u8>, StoreError> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StoreError::Transport("store lock poisoned".to_string()))?;

        let obj = objects
            .get(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", bucket, key)))?;

        match range {
            None => Ok(obj.data.clone()),
            Some(range) => {
                let len = obj.data.len() as u64;
                if range.start >= len || range.start > range.end {
                    return Err(StoreError::InvalidRange(format!("{}/{}", bucket, key)));
                }
                let end = range.end.min(len);
                Ok(obj.data[range.start as usize..end as usize].to_vec())
            }
        }
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StoreError::Transport("store lock poisoned".to_string()))?;

        // BTreeMap iteration gives the lexicographic order S3 guarantees.
        Ok(objects
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .map(|((_, k), obj)| ObjectSummary {
                key: k.clone(),
                size: obj.data.len() as u64,
                modified: Some(obj.modified),
            })
            .collect())
    }
}
