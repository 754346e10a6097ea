//! Virtual path parsing
//!
//! A virtual path addresses a resource through one or more stacked scheme
//! layers: `/s3/<bucket>/<key...>` for a plain object, and
//! `/zip//s3/<bucket>/<key-to-zip>/<inner...>` for an entry inside a zip
//! container hosted in the store. The separator between the archive scheme
//! and the nested scheme is optional; both spellings resolve identically.

use ovfs_common::VfsError;
use percent_encoding::percent_decode_str;
use std::fmt;

pub const STORE_SCHEME: &str = "s3";
pub const ARCHIVE_SCHEME: &str = "zip";

/// A parsed virtual path.
///
/// Trailing slashes are preserved on `key`/`inner` so that directory queries
/// stay distinguishable; `canonical()` strips them when building cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualPath {
    Plain {
        bucket: String,
        key: String,
    },
    Archive {
        container: Box<VirtualPath>,
        inner: String,
    },
}

impl VirtualPath {
    pub fn parse(path: &str) -> Result<Self, VfsError> {
        let rest = path.strip_prefix('/').unwrap_or(path);

        if let Some(rest) = strip_scheme(rest, STORE_SCHEME) {
            let (bucket, key) = Self::parse_plain(path, rest)?;
            return Ok(VirtualPath::Plain { bucket, key });
        }

        if let Some(rest) = strip_scheme(rest, ARCHIVE_SCHEME) {
            return Self::parse_archive(path, rest);
        }

        Err(VfsError::UnsupportedPath(path.to_string()))
    }

    fn parse_plain(original: &str, rest: &str) -> Result<(String, String), VfsError> {
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Err(VfsError::UnsupportedPath(format!(
                "{}: missing bucket",
                original
            )));
        }

        let (bucket, key) = match rest.split_once('/') {
            Some((bucket, key)) => (bucket, key),
            None => (rest, ""),
        };

        if bucket.is_empty() {
            return Err(VfsError::UnsupportedPath(format!(
                "{}: missing bucket",
                original
            )));
        }

        Ok((decode(bucket), decode(key)))
    }

    fn parse_archive(original: &str, rest: &str) -> Result<Self, VfsError> {
        // Tolerate "/zip//s3/..." and "/zip/s3/..." alike.
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let rest = rest.strip_prefix('/').unwrap_or(rest);

        if strip_scheme(rest, ARCHIVE_SCHEME).is_some() {
            return Err(VfsError::UnsupportedPath(format!(
                "{}: nested archive containers are not supported",
                original
            )));
        }

        let Some(nested) = strip_scheme(rest, STORE_SCHEME) else {
            return Err(VfsError::UnsupportedPath(format!(
                "{}: archive scheme requires a nested store path",
                original
            )));
        };

        let (bucket, key) = Self::parse_plain(original, nested)?;

        // The container boundary is the first component that names a zip.
        let mut container_key = String::new();
        let mut components = key.split('/');
        let mut found = false;
        for component in components.by_ref() {
            if !container_key.is_empty() {
                container_key.push('/');
            }
            container_key.push_str(component);
            if component.to_lowercase().ends_with(".zip") {
                found = true;
                break;
            }
        }

        if !found {
            return Err(VfsError::UnsupportedPath(format!(
                "{}: no zip container in archive path",
                original
            )));
        }

        let inner = components.collect::<Vec<_>>().join("/");

        Ok(VirtualPath::Archive {
            container: Box::new(VirtualPath::Plain {
                bucket,
                key: container_key,
            }),
            inner,
        })
    }

    /// True when the path spelled out a directory query (trailing slash).
    pub fn is_dir_query(&self) -> bool {
        match self {
            VirtualPath::Plain { key, .. } => key.ends_with('/'),
            VirtualPath::Archive { inner, .. } => inner.ends_with('/'),
        }
    }

    /// Canonical cache key: one spelling per logical path, decoded, without
    /// trailing slashes.
    pub fn canonical(&self) -> String {
        match self {
            VirtualPath::Plain { bucket, key } => {
                let key = key.trim_end_matches('/');
                if key.is_empty() {
                    format!("/{}/{}", STORE_SCHEME, bucket)
                } else {
                    format!("/{}/{}/{}", STORE_SCHEME, bucket, key)
                }
            }
            VirtualPath::Archive { container, inner } => {
                let inner = inner.trim_end_matches('/');
                if inner.is_empty() {
                    format!("/{}/{}", ARCHIVE_SCHEME, container.canonical())
                } else {
                    format!("/{}/{}/{}", ARCHIVE_SCHEME, container.canonical(), inner)
                }
            }
        }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

fn strip_scheme<'a>(rest: &'a str, scheme: &str) -> Option<&'a str> {
    let stripped = rest.strip_prefix(scheme)?;
    if stripped.is_empty() || stripped.starts_with('/') {
        Some(stripped)
    } else {
        None
    }
}

/// Decode percent-escapes, keeping the raw spelling when the decoded bytes
/// are not valid UTF-8.
fn decode(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}
