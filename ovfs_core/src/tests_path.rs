use crate::path::VirtualPath;
use ovfs_common::VfsError;

#[test]
fn test_parse_plain_path() {
    let path = VirtualPath::parse("/s3/bucket/a/a.txt").unwrap();
    assert_eq!(
        path,
        VirtualPath::Plain {
            bucket: "bucket".to_string(),
            key: "a/a.txt".to_string(),
        }
    );
    assert!(!path.is_dir_query());
}

#[test]
fn test_parse_bucket_root() {
    for spelling in ["/s3/bucket", "/s3/bucket/"] {
        let path = VirtualPath::parse(spelling).unwrap();
        let VirtualPath::Plain { bucket, key } = &path else {
            panic!("expected plain path for {}", spelling);
        };
        assert_eq!(bucket, "bucket");
        assert_eq!(key.trim_end_matches('/'), "");
        assert_eq!(path.canonical(), "/s3/bucket");
    }
}

#[test]
fn test_trailing_slash_is_directory_query() {
    let path = VirtualPath::parse("/s3/bucket/a/").unwrap();
    assert!(path.is_dir_query());
    // The canonical spelling drops the slash.
    assert_eq!(path.canonical(), "/s3/bucket/a");
}

#[test]
fn test_percent_escapes_decode_to_one_canonical_key() {
    let decoded = VirtualPath::parse("/s3/bucket/b/\u{fc}.txt").unwrap();
    let encoded = VirtualPath::parse("/s3/bucket/b/%C3%BC.txt").unwrap();
    assert_eq!(decoded, encoded);
    assert_eq!(decoded.canonical(), encoded.canonical());
}

#[test]
fn test_special_characters_survive_parsing() {
    for name in ["b/+.txt", "b/=.txt", "b/$.txt", "b/(1).txt", "b/a b.txt"] {
        let path = VirtualPath::parse(&format!("/s3/bucket/{}", name)).unwrap();
        let VirtualPath::Plain { key, .. } = &path else {
            panic!("expected plain path");
        };
        assert_eq!(key, name);
    }
}

#[test]
fn test_invalid_percent_escape_kept_verbatim() {
    // %FF is not valid UTF-8 on its own; the raw spelling is preserved.
    let path = VirtualPath::parse("/s3/bucket/b/%FF.txt").unwrap();
    let VirtualPath::Plain { key, .. } = &path else {
        panic!("expected plain path");
    };
    assert_eq!(key, "b/%FF.txt");
}

#[test]
fn test_parse_archive_both_spellings() {
    let with_separator = VirtualPath::parse("/zip//s3/bucket/d/z.zip/name/one.txt").unwrap();
    let without_separator = VirtualPath::parse("/zip/s3/bucket/d/z.zip/name/one.txt").unwrap();
    assert_eq!(with_separator, without_separator);

    let VirtualPath::Archive { container, inner } = &with_separator else {
        panic!("expected archive path");
    };
    assert_eq!(
        **container,
        VirtualPath::Plain {
            bucket: "bucket".to_string(),
            key: "d/z.zip".to_string(),
        }
    );
    assert_eq!(inner, "name/one.txt");
}

#[test]
fn test_archive_root_has_empty_inner() {
    let path = VirtualPath::parse("/zip//s3/bucket/d/z.zip").unwrap();
    let VirtualPath::Archive { inner, .. } = &path else {
        panic!("expected archive path");
    };
    assert!(inner.is_empty());
}

#[test]
fn test_archive_canonical_is_stable() {
    let a = VirtualPath::parse("/zip//s3/bucket/d/z.zip/name/one.txt").unwrap();
    let b = VirtualPath::parse("/zip/s3/bucket/d/z.zip/name/one.txt").unwrap();
    assert_eq!(a.canonical(), b.canonical());
    assert_eq!(a.canonical(), "/zip//s3/bucket/d/z.zip/name/one.txt");
}

#[test]
fn test_unknown_scheme_is_unsupported() {
    for bad in ["/ftp/bucket/key", "bucket/key", "/zip/webdav/bucket/z.zip/x"] {
        assert!(matches!(
            VirtualPath::parse(bad),
            Err(VfsError::UnsupportedPath(_))
        ));
    }
}

#[test]
fn test_missing_bucket_is_unsupported() {
    for bad in ["/s3", "/s3/", "/s3//key"] {
        assert!(matches!(
            VirtualPath::parse(bad),
            Err(VfsError::UnsupportedPath(_))
        ));
    }
}

#[test]
fn test_archive_without_zip_component_is_unsupported() {
    assert!(matches!(
        VirtualPath::parse("/zip//s3/bucket/d/plain.txt"),
        Err(VfsError::UnsupportedPath(_))
    ));
}

#[test]
fn test_nested_archives_are_unsupported() {
    assert!(matches!(
        VirtualPath::parse("/zip//zip//s3/bucket/a.zip/b.zip/c.txt"),
        Err(VfsError::UnsupportedPath(_))
    ));
}
