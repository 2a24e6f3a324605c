//! # farread
//!
//! Random read access over high-latency object storage that only serves
//! *sequential* range downloads.
//!
//! Remote object stores are fast once a connection streams, but every new
//! connection costs a round-trip, and an open connection cannot seek
//! backwards. This crate turns that into a usable `read_at` by combining a
//! bounded pool of warm connections (reused for reads at or shortly after a
//! connection's cursor, skipping forward when needed), a shared sector
//! cache, and virtual concatenation of fragment files.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use farread::{FileReader, RamBackend, ReadAt, SectorCache};
//!
//! fn main() -> farread::Result<()> {
//!     // the RAM backend stands in for a remote object store
//!     let backend = Arc::new(RamBackend::new());
//!     let file = backend.save("hello.dat", b"hello world".to_vec())?;
//!     backend.update()?;
//!
//!     // one shared cache per process
//!     let cache = Arc::new(SectorCache::new(32));
//!     let reader = FileReader::new(file, backend, Some(cache));
//!
//!     let mut buf = [0u8; 5];
//!     let n = reader.read_at(&mut buf, 6)?;
//!     assert_eq!((n, &buf[..]), (5, &b"world"[..]));
//!     Ok(())
//! }
//! ```
//!
//! A short count from `read_at` (including 0) means the data ended; errors
//! are real failures. See [`ReadAt`] for the full contract.

pub mod backend;
pub mod cache;
pub mod error;
pub mod file;
pub mod files;
pub mod pool;
pub mod reader;
pub mod sector;

pub use backend::{Backend, RamBackend};
pub use cache::{Cache, SectorCache};
pub use error::{Result, StorageError};
pub use file::File;
pub use files::FileSet;
pub use pool::BufferPool;
pub use reader::{FileReader, MultiReader, RamReader, ReadAt, SubReader, ZeroReader};
pub use sector::{
    decompose, CACHE_EXPIRE, MAX_FILE_SIZE, MAX_READERS_PER_FILE, MAX_SECTOR_JUMP, SECTOR_SIZE,
};
