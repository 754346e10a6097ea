use crate::session::VfsSession;
use crate::store::MemoryStore;
use ovfs_common::{
    ObjectMeta, ObjectStore, ObjectSummary, SessionConfig, StoreError, VfsError,
};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const BUCKET: &str = "public-bucket-vfs-tests";
const HELLO: &[u8] = b"Hello world!\n";
const SHRUG: &[u8] = "\u{af}\\_(\u{30c4})_/\u{af}\n".as_bytes();

fn fixture_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.put(BUCKET, "a/a.txt", HELLO);
    store.put(BUCKET, "b/+.txt", HELLO);
    store.put(BUCKET, "b/_.txt", HELLO);
    store.put(BUCKET, "b/\u{fc}.txt", HELLO);
    store.put(BUCKET, "c/shrug.txt", SHRUG);
    store
}

fn fixture_session() -> VfsSession {
    VfsSession::with_store(SessionConfig::default(), fixture_store())
}

fn root(path: &str) -> String {
    if path.is_empty() {
        format!("/s3/{}", BUCKET)
    } else {
        format!("/s3/{}/{}", BUCKET, path)
    }
}

/// Counts backend calls so tests can assert cache hits issue none.
pub(crate) struct CountingStore {
    inner: Arc<MemoryStore>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ObjectStore for CountingStore {
    fn instance_id(&self) -> &str {
        "counting"
    }

    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.head(bucket, key)
    }

    fn get(
        &self,
        bucket: &str,
        key: &str,
        range: Option<Range<u64>>,
    ) -> Result<Vec<u8>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(bucket, key, range)
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list(bucket, prefix)
    }
}

/// A backend where every request fails in transit.
struct FailingStore;

impl ObjectStore for FailingStore {
    fn instance_id(&self) -> &str {
        "failing"
    }

    fn head(&self, _bucket: &str, _key: &str) -> Result<Option<ObjectMeta>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    fn get(
        &self,
        _bucket: &str,
        _key: &str,
        _range: Option<Range<u64>>,
    ) -> Result<Vec<u8>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    fn list(&self, _bucket: &str, _prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }
}

#[test]
fn test_uncached_stat() {
    let session = fixture_session();

    for path in ["a/a.txt", "b/_.txt", "b/\u{fc}.txt"] {
        let record = session.stat(&root(path)).unwrap().unwrap();
        assert_eq!(record.size, 13, "size mismatch for {}", path);
        assert!(!record.is_dir(), "{} should be a file", path);
    }
}

#[test]
fn test_stat_percent_encoded_spelling_matches_decoded() {
    let session = fixture_session();

    let decoded = session.stat(&root("b/\u{fc}.txt")).unwrap().unwrap();
    let encoded = session.stat(&root("b/%C3%BC.txt")).unwrap().unwrap();
    assert_eq!(decoded, encoded);
}

#[test]
fn test_cached_stat_matches_listing_pass() {
    let store = Arc::new(CountingStore::new(fixture_store()));
    let session = VfsSession::with_store(SessionConfig::default(), store.clone());

    let listing = session.list_recursive(&root("")).unwrap();
    let from_listing = listing
        .iter()
        .find(|e| e.name == "b/\u{fc}.txt")
        .unwrap()
        .record;

    let calls_after_listing = store.calls();
    let record = session.stat(&root("b/\u{fc}.txt")).unwrap().unwrap();

    // Served from cache: same record, no further backend traffic.
    assert_eq!(record, from_listing);
    assert_eq!(store.calls(), calls_after_listing);
    assert!(record.modified.is_some(), "listing entries carry an mtime");
}

#[test]
fn test_cache_no_cache_equivalence() {
    let uncached = fixture_session();
    let cached = fixture_session();
    cached.list_recursive(&root("")).unwrap();

    for path in ["a/a.txt", "b/+.txt", "b/_.txt", "b/\u{fc}.txt"] {
        let direct = uncached.stat(&root(path)).unwrap().unwrap();
        let via_listing = cached.stat(&root(path)).unwrap().unwrap();
        assert_eq!(direct.size, via_listing.size, "size differs for {}", path);
        assert_eq!(direct.kind, via_listing.kind, "kind differs for {}", path);
        assert_eq!(
            direct.modified, via_listing.modified,
            "mtime differs for {}",
            path
        );
    }
}

#[test]
fn test_file_and_directory_prefix_share_a_stem() {
    // Both "x" the object and "x/..." the prefix exist at once; a listing
    // pass must not collapse their records onto one cache key.
    let store = Arc::new(MemoryStore::new());
    store.put(BUCKET, "x", HELLO);
    store.put(BUCKET, "x/y.txt", HELLO);
    let session = VfsSession::with_store(SessionConfig::default(), store);

    let direct = session.stat(&root("x")).unwrap().unwrap();
    assert!(!direct.is_dir());

    session.list_recursive(&root("")).unwrap();

    let cached = session.stat(&root("x")).unwrap().unwrap();
    assert_eq!(direct.kind, cached.kind);
    assert_eq!(direct.size, cached.size);

    let dir = session.stat(&root("x/")).unwrap().unwrap();
    assert!(dir.is_dir());
}

#[test]
fn test_stat_directory_via_trailing_slash() {
    let session = fixture_session();

    let record = session.stat(&root("a/")).unwrap().unwrap();
    assert!(record.is_dir());
    assert_eq!(record.size, 0);
}

#[test]
fn test_stat_directory_without_trailing_slash() {
    let session = fixture_session();

    let record = session.stat(&root("a")).unwrap().unwrap();
    assert!(record.is_dir());
}

#[test]
fn test_stat_absent_path_is_none_not_error() {
    let session = fixture_session();

    assert!(session.stat(&root("a/missing.txt")).unwrap().is_none());
    assert!(session.stat(&root("nosuchdir/")).unwrap().is_none());
}

#[test]
fn test_transport_failure_is_distinguishable_from_absence() {
    let session = VfsSession::with_store(SessionConfig::default(), Arc::new(FailingStore));

    let err = session.stat(&root("a/a.txt")).unwrap_err();
    assert!(matches!(err, VfsError::Transport(_)));

    let err = session.open(&root("a/a.txt")).unwrap_err();
    assert!(matches!(err, VfsError::Transport(_)));
}

#[test]
fn test_list_recursive_root() {
    let session = fixture_session();

    let mut names: Vec<String> = session
        .list_recursive(&root(""))
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();

    assert_eq!(
        names,
        vec![
            "a/",
            "a/a.txt",
            "b/",
            "b/+.txt",
            "b/_.txt",
            "b/\u{fc}.txt",
            "c/",
            "c/shrug.txt",
        ]
    );
}

#[test]
fn test_list_recursive_subdirectory() {
    let session = fixture_session();

    let mut names: Vec<String> = session
        .list_recursive(&root("a"))
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.txt"]);
}

#[test]
fn test_list_recursive_missing_directory() {
    let session = fixture_session();

    assert!(matches!(
        session.list_recursive(&root("nosuchdir")),
        Err(VfsError::NotADirectory(_))
    ));
}

#[test]
fn test_clear_cache_then_stat_still_correct() {
    let store = Arc::new(CountingStore::new(fixture_store()));
    let session = VfsSession::with_store(SessionConfig::default(), store.clone());

    session.list_recursive(&root("")).unwrap();
    assert!(session.cached_records() > 0);

    session.clear_cache();
    assert_eq!(session.cached_records(), 0);

    let calls_before = store.calls();
    let record = session.stat(&root("a/a.txt")).unwrap().unwrap();
    assert_eq!(record.size, 13);
    assert!(store.calls() > calls_before, "expected a fresh backend lookup");
}

#[test]
fn test_open_read_close_round_trip_ascii() {
    let session = fixture_session();

    let size = session.stat(&root("a/a.txt")).unwrap().unwrap().size;
    let mut handle = session.open(&root("a/a.txt")).unwrap();
    assert_eq!(handle.size(), size);

    let bytes = handle.read_bytes(size as usize).unwrap();
    assert_eq!(bytes, HELLO);
    handle.close().unwrap();
}

#[test]
fn test_open_read_close_round_trip_multibyte() {
    let session = fixture_session();

    let size = session.stat(&root("c/shrug.txt")).unwrap().unwrap().size;
    assert_eq!(size, 14, "multi-byte content is counted in bytes");

    let mut handle = session.open(&root("c/shrug.txt")).unwrap();
    let bytes = handle.read_bytes(size as usize).unwrap();
    assert_eq!(bytes, SHRUG);
    handle.close().unwrap();
}

#[test]
fn test_open_absent_path_reports_not_found() {
    let session = fixture_session();

    let err = session.open(&root("a/missing.txt")).unwrap_err();
    assert!(matches!(err, VfsError::NotFound(_)));
    let msg = err.to_string();
    assert!(msg.contains("missing.txt"), "error names the path: {}", msg);
}

#[test]
fn test_handle_debug_output_elides_content() {
    let session = fixture_session();

    let handle = session.open(&root("a/a.txt")).unwrap();
    let rendered = format!("{:?}", handle);
    assert!(rendered.contains("a/a.txt"));
    assert!(!rendered.contains("Hello"), "debug output: {}", rendered);
}

#[test]
fn test_read_convenience_matches_handle_reads() {
    let session = fixture_session();

    let direct = session.read(&root("b/+.txt")).unwrap();
    assert_eq!(direct, HELLO);
}
