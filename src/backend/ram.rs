//! In-memory backend
//!
//! Keeps all content in RAM. This is the reference implementation of the
//! backend contract and the workhorse of the test suite; it is not meant for
//! production data.

use crate::backend::Backend;
use crate::error::{Result, StorageError};
use crate::file::File;
use crate::files::FileSet;
use md5::{Digest, Md5};
use parking_lot::RwLock;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::io::Read;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

struct State {
    // staged index, made visible through `files()` by `update()`
    staged: FxHashMap<String, File>,
    published: FileSet,
    data: FxHashMap<String, Arc<Vec<u8>>>,
}

/// Backend implementation that stores everything in memory.
///
/// The file index is double-buffered like a real store's: `save` and `trash`
/// work on a staged set, and `update` publishes a fresh [`FileSet`] snapshot
/// for `files()`. Connections read the staged content, so a freshly saved
/// file is readable before it appears in the published index.
pub struct RamBackend {
    state: RwLock<State>,
}

impl RamBackend {
    pub fn new() -> Self {
        RamBackend {
            state: RwLock::new(State {
                staged: FxHashMap::default(),
                published: FileSet::default(),
                data: FxHashMap::default(),
            }),
        }
    }

    /// Stores `data` under `name` and returns the new file's metadata. Names
    /// may repeat; every save creates a distinct file with a fresh id.
    pub fn save(&self, name: &str, data: Vec<u8>) -> Result<File> {
        self.save_shared(name, Arc::new(data))
    }

    /// Like [`RamBackend::save`] but shares the given buffer instead of
    /// copying it. Useful for large test fixtures stored once per process.
    pub fn save_shared(&self, name: &str, data: Arc<Vec<u8>>) -> Result<File> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::InvalidArgument("empty file name"));
        }

        let md5 = hex::encode(Md5::digest(data.as_slice()));
        let file = File::new(gen_id(), name, unix_now(), data.len() as i64, md5);

        let mut state = self.state.write();
        state.data.insert(file.id().to_owned(), data);
        state.staged.insert(file.id().to_owned(), file.clone());
        Ok(file)
    }

    /// Removes a file from the staged index.
    pub fn trash(&self, file: &File) -> Result<()> {
        let mut state = self.state.write();
        if state.staged.remove(file.id()).is_none() {
            return Err(StorageError::NotFound);
        }
        state.data.remove(file.id());
        Ok(())
    }

    /// Publishes the staged index as the snapshot returned by `files()`.
    pub fn update(&self) -> Result<()> {
        let mut state = self.state.write();
        let staged: Vec<File> = state.staged.values().cloned().collect();
        state.published = FileSet::new(staged);
        Ok(())
    }

    /// The published index snapshot.
    pub fn files(&self) -> FileSet {
        self.state.read().published.clone()
    }
}

impl Default for RamBackend {
    fn default() -> Self {
        RamBackend::new()
    }
}

impl Backend for RamBackend {
    fn open_sequential(&self, file: &File, off: i64) -> Result<Box<dyn Read + Send>> {
        let state = self.state.read();
        let data = state
            .data
            .get(file.id())
            .cloned()
            .ok_or(StorageError::NotFound)?;
        let pos = off.max(0).min(data.len() as i64) as usize;
        Ok(Box::new(RamCursor { data, pos }))
    }
}

/// Sequential cursor over shared file content. Offsets at or past the end
/// yield an empty stream.
struct RamCursor {
    data: Arc<Vec<u8>>,
    pos: usize,
}

impl Read for RamCursor {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Generates a random file id for new files.
fn gen_id() -> String {
    let tail: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(28)
        .map(char::from)
        .collect();
    format!("ram-{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_rejects_blank_names() {
        let backend = RamBackend::new();
        assert!(matches!(
            backend.save("", b"x".to_vec()),
            Err(StorageError::InvalidArgument(_))
        ));
        assert!(matches!(
            backend.save("   ", b"x".to_vec()),
            Err(StorageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn save_fills_metadata() {
        let backend = RamBackend::new();
        let file = backend.save("  test.dat  ", b"test".to_vec()).unwrap();
        assert_eq!(file.name(), "test.dat");
        assert_eq!(file.size(), 4);
        assert_eq!(file.md5(), "098f6bcd4621d373cade4e832627b4f6");
        assert!(file.id().starts_with("ram-"));
        assert!(file.mod_time() > 0);
    }

    #[test]
    fn update_publishes_the_staged_index() {
        let backend = RamBackend::new();
        let file = backend.save("a.dat", b"a".to_vec()).unwrap();
        assert!(backend.files().is_empty());

        backend.update().unwrap();
        assert_eq!(backend.files().by_id(file.id()), Some(&file));

        backend.trash(&file).unwrap();
        assert_eq!(backend.files().len(), 1); // still published
        backend.update().unwrap();
        assert!(backend.files().is_empty());
    }

    #[test]
    fn trash_unknown_file_is_not_found() {
        let backend = RamBackend::new();
        let ghost = File::new("ghost", "ghost.dat", 0, 0, "");
        assert!(matches!(backend.trash(&ghost), Err(StorageError::NotFound)));
    }

    #[test]
    fn sequential_reads_walk_the_content() {
        let backend = RamBackend::new();
        let file = backend.save("seq.dat", b"0123456789".to_vec()).unwrap();

        let mut conn = backend.open_sequential(&file, 3).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(conn.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"3456");
        assert_eq!(conn.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"789");
        assert_eq!(conn.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn open_at_or_past_the_end_yields_an_empty_stream() {
        let backend = RamBackend::new();
        let file = backend.save("short.dat", b"abc".to_vec()).unwrap();
        for off in [3, 4, 1000] {
            let mut conn = backend.open_sequential(&file, off).unwrap();
            let mut buf = [0u8; 8];
            assert_eq!(conn.read(&mut buf).unwrap(), 0);
        }
    }

    #[test]
    fn open_unknown_file_is_not_found() {
        let backend = RamBackend::new();
        let ghost = File::new("ghost", "ghost.dat", 0, 3, "");
        assert!(matches!(
            backend.open_sequential(&ghost, 0),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn limited_connections_stop_after_n_bytes() {
        let backend = RamBackend::new();
        let file = backend.save("lim.dat", b"0123456789".to_vec()).unwrap();

        let mut conn = backend.open_limited(&file, 2, 5).unwrap();
        let mut out = Vec::new();
        conn.read_to_end(&mut out).unwrap();
        assert_eq!(&out, b"23456");

        // n <= 0 means unlimited
        let mut conn = backend.open_limited(&file, 8, 0).unwrap();
        out.clear();
        conn.read_to_end(&mut out).unwrap();
        assert_eq!(&out, b"89");
    }
}
