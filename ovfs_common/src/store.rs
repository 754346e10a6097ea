use crate::StoreError;
use std::ops::Range;
use std::time::SystemTime;

/// Metadata reported by a HEAD request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectMeta {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// One object as reported by a bulk listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Object store backend trait
///
/// This trait allows OVFS to treat a real S3-compatible endpoint and an
/// in-process test store uniformly. Keys are raw UTF-8 strings; no path
/// interpretation happens at this layer.
pub trait ObjectStore: Send + Sync {
    /// Uniquely identifies the store instance (e.g., "s3:ap-southeast-2")
    fn instance_id(&self) -> &str;

    /// Metadata request for a single key.
    ///
    /// A missing object is `Ok(None)`; only transport or auth failures are
    /// errors.
    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, StoreError>;

    /// Read object content, optionally restricted to a byte range.
    fn get(
        &self,
        bucket: &str,
        key: &str,
        range: Option<Range<u64>>,
    ) -> Result<Vec<u8>, StoreError>;

    /// Enumerate every key under a prefix, in lexicographic key order.
    ///
    /// Implementations must follow pagination to completion.
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError>;
}
