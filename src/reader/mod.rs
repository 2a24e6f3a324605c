//! Random read access
//!
//! [`FileReader`] turns the backend's forward-only sequential connections
//! into efficient random reads. Three mechanisms cooperate:
//!
//! - a bounded pool of warm connections that can be reused when a request
//!   lands at or shortly after an open connection's cursor,
//! - forward-skip reading: a near-forward request is served by reading (and
//!   caching) the sectors in between instead of opening a new connection,
//! - the shared sector cache, which also catches backward reads that would
//!   otherwise force a reopen.
//!
//! [`MultiReader`] stitches equal-sized fragment files into one virtual
//! file and [`SubReader`] restricts a reader to a window; both behave like a
//! plain [`FileReader`].

mod multi;
mod ram;
mod stats;
mod sub;

pub use multi::MultiReader;
pub use ram::{RamReader, ZeroReader};
pub use sub::SubReader;

use crate::backend::Backend;
use crate::cache::Cache;
use crate::error::{Result, StorageError};
use crate::file::File;
use crate::pool::BufferPool;
use crate::sector::{decompose, MAX_READERS_PER_FILE, MAX_SECTOR_JUMP, SECTOR_SIZE};
use parking_lot::Mutex;
use stats::ReaderStats;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::Instant;

/// Buffers in the private pool of a reader that runs without a cache.
const PRIVATE_POOL_BUFFERS: usize = 25;

/// Random read access to stored data.
///
/// `read_at` reads into `buf` starting at byte `off` and returns the number
/// of bytes read. It fills the buffer completely unless the data ends: a
/// short count (including 0) means end of data, never "try again". Errors
/// are real failures; any partially copied bytes are invalid then. Reading a
/// full buffer that happens to end exactly at the last byte reports a full
/// count, not end-of-data — the next call observes the end instead.
///
/// Implementations are thread-safe; concurrent `read_at` calls on one reader
/// are allowed.
pub trait ReadAt: Send + Sync {
    fn read_at(&self, buf: &mut [u8], off: i64) -> Result<usize>;

    /// Closes open connections. Not a final disposal: a later `read_at` may
    /// open new connections.
    fn close(&self) -> Result<()>;

    /// Monotonic counters of internal processes since construction, for
    /// testing and debugging. Zero-valued counters are omitted.
    fn stat(&self) -> BTreeMap<String, u64>;
}

/// One entry of the connection pool: a sequential connection, the sector its
/// cursor sits on, and when it was last used.
struct Slot {
    conn: Option<Box<dyn Read + Send>>,
    // next sector this connection will yield; only meaningful while open
    sector: u64,
    age: Instant,
}

impl Slot {
    fn empty() -> Self {
        Slot {
            conn: None,
            sector: 0,
            age: Instant::now(),
        }
    }

    fn open(conn: Box<dyn Read + Send>, sector: u64) -> Self {
        Slot {
            conn: Some(conn),
            sector,
            age: Instant::now(),
        }
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Drops the connection. Idempotent.
    fn clear(&mut self) {
        self.conn = None;
    }

    /// Reads the next sector into `buf`, which must be exactly
    /// [`SECTOR_SIZE`] long. Reads until the buffer is full or the stream
    /// ends; a short count means the stream ended. Any read that yielded
    /// bytes advances the cursor — a partial last sector still counts as one
    /// sector.
    fn read_sector(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() != SECTOR_SIZE {
            return Err(StorageError::WrongBufferSize(buf.len()));
        }
        let conn = self.conn.as_mut().ok_or(StorageError::ConnectionClosed)?;

        let mut n = 0;
        while n < SECTOR_SIZE {
            match conn.read(&mut buf[n..]) {
                Ok(0) => break,
                Ok(read) => n += read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(StorageError::Backend(e)),
            }
        }
        if n > 0 {
            self.age = Instant::now();
            self.sector += 1;
        }
        Ok(n)
    }
}

/// Random read access to one file, backed by a bounded pool of sequential
/// connections and an optional shared sector cache.
///
/// No connection is opened before the first `read_at`. All slot work runs
/// under one mutex, so per-file throughput is serialized; the bottleneck is
/// the network, and files are independent of each other.
pub struct FileReader {
    slots: Mutex<Vec<Slot>>,
    stats: ReaderStats,
    file: File,
    backend: Arc<dyn Backend>,
    cache: Option<Arc<dyn Cache>>,
    // used when no shared cache (and thus no shared pool) is attached
    private_pool: BufferPool,
}

impl FileReader {
    /// Creates a reader for `file`. With `cache == None` sector caching is
    /// disabled and every read goes to the backend.
    pub fn new(file: File, backend: Arc<dyn Backend>, cache: Option<Arc<dyn Cache>>) -> Self {
        let stats = ReaderStats::new();
        stats.on_new(file.id(), cache.is_some());
        FileReader {
            slots: Mutex::new((0..MAX_READERS_PER_FILE).map(|_| Slot::empty()).collect()),
            stats,
            file,
            backend,
            cache,
            private_pool: BufferPool::new(PRIVATE_POOL_BUFFERS),
        }
    }

    /// The file this reader serves.
    pub fn file(&self) -> &File {
        &self.file
    }

    fn pool(&self) -> &BufferPool {
        match &self.cache {
            Some(cache) => cache.pool(),
            None => &self.private_pool,
        }
    }

    fn fill(&self, p: &mut [u8], off: i64, scratch: &mut Vec<u8>) -> Result<usize> {
        let (mut sector, mut inner_off) = decompose(off);
        let mut read = 0;

        self.stats
            .on_request(self.file.id(), off, p.len(), sector, inner_off);
        loop {
            let n_sec = self.get_sector(scratch, sector)?;

            // cut the inner offset; an offset beyond the sector's data means
            // nothing of this sector is requested
            let chunk: &[u8] = if n_sec < inner_off {
                &[]
            } else {
                &scratch[inner_off..n_sec]
            };

            let n = chunk.len().min(p.len() - read);
            p[read..read + n].copy_from_slice(&chunk[..n]);
            read += n;
            sector += 1;
            inner_off = 0;

            // done when the caller is satisfied or the file ended
            if n == 0 || read == p.len() || n_sec < SECTOR_SIZE {
                return Ok(read);
            }
        }
    }

    /// Produces the requested sector in `scratch` and returns its length.
    /// A short length means the file ends inside (or before) this sector.
    fn get_sector(&self, scratch: &mut Vec<u8>, sector: u64) -> Result<usize> {
        let mut slots = self.slots.lock();

        if let Some(cache) = &self.cache {
            if let Some(n) = cache.get(self.file.id(), sector, scratch) {
                self.stats.on_cache_get(self.file.id(), sector, true);
                return Ok(n);
            }
            self.stats.on_cache_get(self.file.id(), sector, false);
        }

        let idx = match self.best_slot(&slots, sector) {
            Some(idx) => idx,
            None => self.add_slot(&mut slots, sector)?,
        };

        scratch.resize(SECTOR_SIZE, 0);

        // forward skip: read the connection up to the requested sector,
        // keeping the bytes we already paid for
        while slots[idx].sector < sector {
            let skipped = slots[idx].sector;
            let n = match slots[idx].read_sector(scratch) {
                Ok(n) => n,
                Err(e) => {
                    slots[idx].clear();
                    return Err(e);
                }
            };
            self.stats.on_sector_skip(self.file.id(), skipped, n);
            if n > 0 {
                // the cursor already advanced past the sector just read
                self.cache_store(slots[idx].sector - 1, &scratch[..n]);
            }
            if n < SECTOR_SIZE {
                // the file ended before the requested sector
                slots[idx].clear();
                return Ok(0);
            }
        }

        let n = match slots[idx].read_sector(scratch) {
            Ok(n) => n,
            Err(e) => {
                slots[idx].clear();
                self.stats.on_sector_read(self.file.id(), sector, 0);
                return Err(e);
            }
        };
        self.stats.on_sector_read(self.file.id(), sector, n);
        if n > 0 {
            self.cache_store(slots[idx].sector - 1, &scratch[..n]);
        }
        Ok(n)
    }

    /// The open slot whose cursor is closest to, but not past, the requested
    /// sector, within the forward-jump budget. Ties go to the first slot
    /// seen.
    fn best_slot(&self, slots: &[Slot], sector: u64) -> Option<usize> {
        let mut best: Option<(usize, u64)> = None;
        for (i, slot) in slots.iter().enumerate() {
            if !slot.is_open() {
                continue;
            }
            // cannot read backwards, and too far forward is cheaper to reopen
            if sector < slot.sector || sector - slot.sector > MAX_SECTOR_JUMP {
                continue;
            }
            let dist = sector - slot.sector;
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
                if dist == 0 {
                    break;
                }
            }
        }
        if let Some((i, _)) = best {
            self.stats.on_conn_reuse(self.file.id(), i, slots[i].sector);
        }
        best.map(|(i, _)| i)
    }

    /// Opens a new connection at `sector`, evicting the oldest slot. The new
    /// connection lands at index 0; on failure that slot stays empty.
    fn add_slot(&self, slots: &mut [Slot], sector: u64) -> Result<usize> {
        // youngest connections first, cleared slots last; the array is tiny,
        // a full sort is cheaper than bookkeeping
        slots.sort_by_key(|s| Reverse((s.is_open(), s.age)));
        if let Some(last) = slots.last_mut() {
            last.clear();
        }
        slots.rotate_right(1);

        let off = sector as i64 * SECTOR_SIZE as i64;
        match self.backend.open_sequential(&self.file, off) {
            Ok(conn) => {
                self.stats.on_conn_open(self.file.id(), sector, true);
                slots[0] = Slot::open(conn, sector);
                Ok(0)
            }
            Err(e) => {
                self.stats.on_conn_open(self.file.id(), sector, false);
                Err(e)
            }
        }
    }

    fn cache_store(&self, sector: u64, data: &[u8]) {
        if let Some(cache) = &self.cache {
            cache.set(self.file.id(), sector, data);
            self.stats.on_cache_set(self.file.id(), sector, data.len());
        }
    }
}

impl ReadAt for FileReader {
    fn read_at(&self, buf: &mut [u8], off: i64) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut scratch = self.pool().acquire();
        let result = self.fill(buf, off, &mut scratch);
        self.pool().release(scratch);

        if result.is_err() {
            self.stats.on_read_error(self.file.id());
        }
        result
    }

    fn close(&self) -> Result<()> {
        self.stats.on_closing(self.file.id());
        let mut slots = self.slots.lock();
        for (i, slot) in slots.iter_mut().enumerate() {
            if slot.is_open() {
                self.stats.on_conn_close(self.file.id(), i);
                slot.clear();
            }
        }
        Ok(())
    }

    fn stat(&self) -> BTreeMap<String, u64> {
        self.stats.stat()
    }
}
