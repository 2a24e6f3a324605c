//! Storage backends
//!
//! A backend hands out *sequential* connections into file content; it is the
//! only outward boundary the readers call. Real deployments back this with
//! range requests against a remote object store; tests use [`RamBackend`].

mod ram;

pub mod demo;

pub use ram::RamBackend;

use crate::error::Result;
use crate::file::File;
use std::io::Read;

/// Sequential read access into stored files.
///
/// The returned reader obeys the std [`Read`] contract and only moves
/// forward; dropping it closes the connection. Implementations must be
/// thread-safe: readers open connections concurrently.
pub trait Backend: Send + Sync {
    /// Opens a connection that reads `file` starting at byte `off`.
    fn open_sequential(&self, file: &File, off: i64) -> Result<Box<dyn Read + Send>>;

    /// Like [`Backend::open_sequential`], but the connection ends after `n`
    /// bytes. `n <= 0` means no limit.
    fn open_limited(&self, file: &File, off: i64, n: i64) -> Result<Box<dyn Read + Send>> {
        let conn = self.open_sequential(file, off)?;
        if n > 0 {
            Ok(Box::new(conn.take(n as u64)))
        } else {
            Ok(conn)
        }
    }
}
