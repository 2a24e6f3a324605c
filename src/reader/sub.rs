//! Windowed view over a file

use crate::backend::Backend;
use crate::cache::Cache;
use crate::error::Result;
use crate::file::File;
use crate::reader::{FileReader, ReadAt};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Restricts a [`FileReader`] to the byte window `[off, off + n)`.
///
/// Offsets are relative to the window start and the window end behaves
/// exactly like end-of-file: reads are clamped and report a short count at
/// the boundary.
pub struct SubReader {
    inner: FileReader,
    off: i64,
    n: i64,
}

impl SubReader {
    /// Creates a reader for the window `[off, off + n)` of `file`. No
    /// connection is opened before the first `read_at`.
    pub fn new(
        file: File,
        backend: Arc<dyn Backend>,
        cache: Option<Arc<dyn Cache>>,
        off: i64,
        n: i64,
    ) -> Self {
        SubReader {
            inner: FileReader::new(file, backend, cache),
            off,
            n,
        }
    }
}

impl ReadAt for SubReader {
    fn read_at(&self, buf: &mut [u8], off: i64) -> Result<usize> {
        let n = self.inner.read_at(buf, self.off + off)?;

        // clamp to the window end
        let start = self.off + off;
        let end = start + n as i64;
        let window_end = self.off + self.n;
        if end > window_end {
            return Ok((window_end - start).max(0) as usize);
        }
        Ok(n)
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }

    fn stat(&self) -> BTreeMap<String, u64> {
        self.inner.stat()
    }
}
