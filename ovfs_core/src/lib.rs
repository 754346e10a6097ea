pub mod archive;
pub mod cache;
pub mod handle;
mod listing;
pub mod path;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests_path;

#[cfg(test)]
mod tests_session;


pub use archive::{ArchiveReader, StoreReader};
pub use cache::StatCache;
pub use handle::FileHandle;
pub use path::VirtualPath;
pub use session::VfsSession;
pub use store::MemoryStore;
#[cfg(feature = "s3")]
pub use store::S3Store;
