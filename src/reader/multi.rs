//! Virtual concatenation of fragment files
//!
//! Large uploads are commonly split into equal-sized fragments. A
//! [`MultiReader`] makes a series of such fragments readable as one file:
//! offsets map to a fragment by division, and a fragment that ends mid-read
//! hands over to the next one.

use crate::backend::Backend;
use crate::cache::Cache;
use crate::error::{Result, StorageError};
use crate::file::File;
use crate::reader::stats::ReaderStats;
use crate::reader::{FileReader, ReadAt};
use md5::{Digest, Md5};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Random read access over two or more fragment files of one logical file.
///
/// Every fragment except the last must have the common fragment size, and no
/// fragment may be empty. Behaves like a [`FileReader`] over the
/// concatenated content.
pub struct MultiReader {
    readers: Vec<FileReader>,
    fragment_size: i64,
    stats: ReaderStats,
    // stable synthetic id over all fragment ids, for logs and stats
    multi_id: String,
    // read side for read_at/stat, write side for close
    lock: RwLock<()>,
}

impl MultiReader {
    /// Combines `files` into one virtual file. Fails with `InvalidArgument`
    /// for fewer than two files and with `SizeMismatch` when the fragment
    /// size rule is violated.
    pub fn new(
        files: Vec<File>,
        backend: Arc<dyn Backend>,
        cache: Option<Arc<dyn Cache>>,
    ) -> Result<Self> {
        if files.len() < 2 {
            return Err(StorageError::InvalidArgument(
                "a multi reader needs at least two files",
            ));
        }
        let fragment_size = files[0].size();
        for (i, f) in files.iter().enumerate() {
            if f.size() == 0 || (f.size() != fragment_size && i != files.len() - 1) {
                return Err(StorageError::SizeMismatch {
                    index: i,
                    size: f.size(),
                    expected: fragment_size,
                });
            }
        }

        let mut hasher = Md5::new();
        for f in &files {
            hasher.update(f.id().as_bytes());
        }
        let multi_id = hex::encode(hasher.finalize());

        let readers = files
            .into_iter()
            .map(|f| FileReader::new(f, Arc::clone(&backend), cache.clone()))
            .collect();

        let stats = ReaderStats::new();
        stats.on_new(&multi_id, cache.is_some());
        Ok(MultiReader {
            readers,
            fragment_size,
            stats,
            multi_id,
            lock: RwLock::new(()),
        })
    }

    /// Synthetic id of the concatenation (hex md5 over the fragment ids).
    pub fn id(&self) -> &str {
        &self.multi_id
    }
}

impl ReadAt for MultiReader {
    fn read_at(&self, buf: &mut [u8], off: i64) -> Result<usize> {
        let _guard = self.lock.read();
        if buf.is_empty() {
            return Ok(0);
        }

        let mut frag_off = off % self.fragment_size;
        let mut frag_no = ((off - frag_off) / self.fragment_size) as usize;
        self.stats.on_request(
            &self.multi_id,
            off,
            buf.len(),
            frag_no as u64,
            frag_off.max(0) as usize,
        );

        let mut read = 0;
        loop {
            let n = if frag_no < self.readers.len() {
                self.readers[frag_no].read_at(&mut buf[read..], frag_off)?
            } else {
                0 // past the last fragment
            };

            // a fragment that came up short ended; continue in the next one
            frag_no += 1;
            frag_off = 0;
            read += n;

            if n == 0 || read == buf.len() {
                return Ok(read);
            }
        }
    }

    fn close(&self) -> Result<()> {
        let _guard = self.lock.write();
        self.stats.on_closing(&self.multi_id);
        for reader in &self.readers {
            let _ = reader.close();
        }
        Ok(())
    }

    fn stat(&self) -> BTreeMap<String, u64> {
        let _guard = self.lock.read();
        let mut merged = BTreeMap::new();
        for (key, value) in self.stats.stat() {
            merged.insert(format!("[multi] {key}"), value);
        }
        for (i, reader) in self.readers.iter().enumerate() {
            for (key, value) in reader.stat() {
                merged.insert(format!("[{i}] {key}"), value);
            }
        }
        merged
    }
}
