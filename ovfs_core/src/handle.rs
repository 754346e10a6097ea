use ovfs_common::VfsError;
use std::fmt;
use std::io::Read;

/// An open virtual file
///
/// The content is materialized at open time; reads then consume it
/// sequentially. Dropping the handle releases it, `close` exists for callers
/// that want an explicit success signal.
pub struct FileHandle {
    path: String,
    data: Vec<u8>,
    pos: usize,
}

impl FileHandle {
    pub(crate) fn new(path: String, data: Vec<u8>) -> Self {
        Self { path, data, pos: 0 }
    }

    /// The canonical path this handle was opened from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Total size of the file in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Read up to `size` bytes from the current position.
    ///
    /// Returns an empty vector at end of file.
    pub fn read_bytes(&mut self, size: usize) -> Result<Vec<u8>, VfsError> {
        let end = (self.pos + size).min(self.data.len());
        let chunk = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(chunk)
    }

    /// Close the handle.
    pub fn close(self) -> Result<(), VfsError> {
        Ok(())
    }
}

// Manual impl so the content buffer never lands in log or assertion output.
impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("size", &self.data.len())
            .field("pos", &self.pos)
            .finish()
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let end = (self.pos + buf.len()).min(self.data.len());
        let n = end - self.pos;
        buf[..n].copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(n)
    }
}
