//! Shared sector cache
//!
//! Stores sectors (data blocks of a file) so that random read access does
//! not hit the remote storage for every request. The cache is always at
//! least `1024 * SECTOR_SIZE` (~17 MB) big. There should be one common large
//! cache per process, shared by all readers via `Arc`.

use crate::pool::BufferPool;
use crate::sector::{CACHE_EXPIRE, SECTOR_SIZE};
use log::trace;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::time::Instant;

/// Buffers kept by the pool that travels with the shared cache (~5 MB).
const SHARED_POOL_BUFFERS: usize = 300;

/// Capability set a reader needs from a sector cache.
pub trait Cache: Send + Sync {
    /// Looks up a sector and copies it into `buf`, reusing its capacity so
    /// the hot path does not allocate. Returns the byte count on a hit.
    fn get(&self, file_id: &str, sector: u64, buf: &mut Vec<u8>) -> Option<usize>;

    /// Stores a private copy of `data`. Old entries may be evicted when the
    /// cache is full; the value expires after [`CACHE_EXPIRE`].
    fn set(&self, file_id: &str, sector: u64, data: &[u8]);

    /// The byte-buffer pool that travels with this cache.
    ///
    /// ```ignore
    /// let buf = cache.pool().acquire();
    /// // ... read into buf ...
    /// cache.pool().release(buf);
    /// ```
    fn pool(&self) -> &BufferPool;

    /// Configured maximum capacity in bytes.
    fn size_bytes(&self) -> i64;
}

/// Cache key: `u64` little-endian sector number followed by the file id
/// bytes. The encoding is fixed so caches can be shared across
/// implementations.
fn cache_key(file_id: &str, sector: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + file_id.len());
    key.extend_from_slice(&sector.to_le_bytes());
    key.extend_from_slice(file_id.as_bytes());
    key
}

struct Entry {
    data: Vec<u8>,
    expires_at: Instant,
    last_used: u64,
}

struct Inner {
    map: FxHashMap<Vec<u8>, Entry>,
    used_bytes: usize,
    // access stamp source for LRU eviction
    tick: u64,
}

/// Default [`Cache`] implementation: a bounded map from `(sector, file id)`
/// to sector bytes with least-recently-used eviction and a two-day TTL.
pub struct SectorCache {
    inner: Mutex<Inner>,
    pool: BufferPool,
    max_bytes: usize,
}

impl SectorCache {
    /// Creates a cache of roughly `size_mb` megabytes. Requests below the
    /// minimum of `1024 * SECTOR_SIZE` (~17 MB) are silently raised.
    pub fn new(size_mb: usize) -> Self {
        let min_mb = (1024 * SECTOR_SIZE) / (1024 * 1024) + 1;
        let size_mb = size_mb.max(min_mb);
        SectorCache {
            inner: Mutex::new(Inner {
                map: FxHashMap::default(),
                used_bytes: 0,
                tick: 0,
            }),
            pool: BufferPool::new(SHARED_POOL_BUFFERS),
            max_bytes: size_mb * 1024 * 1024,
        }
    }
}

impl Inner {
    fn remove(&mut self, key: &[u8]) -> Option<Entry> {
        let entry = self.map.remove(key)?;
        self.used_bytes -= key.len() + entry.data.len();
        Some(entry)
    }

    /// Drops least-recently-used entries until `extra` more bytes fit. The
    /// map is scanned per eviction; at sector granularity the entry count
    /// stays small enough that a scan beats maintaining a separate queue.
    fn make_room(&mut self, extra: usize, max_bytes: usize) {
        while self.used_bytes + extra > max_bytes {
            let victim = self
                .map
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match victim {
                Some(key) => {
                    self.remove(&key);
                    trace!("cache evict: used={} bytes", self.used_bytes);
                }
                None => break,
            }
        }
    }
}

impl Cache for SectorCache {
    fn get(&self, file_id: &str, sector: u64, buf: &mut Vec<u8>) -> Option<usize> {
        let key = cache_key(file_id, sector);
        let now = Instant::now();

        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        if let Some(entry) = inner.map.get_mut(&key) {
            if now < entry.expires_at {
                entry.last_used = tick;
                buf.clear();
                buf.extend_from_slice(&entry.data);
                return Some(buf.len());
            }
        }
        // expired entries count as misses and are dropped right away
        inner.remove(&key);
        None
    }

    fn set(&self, file_id: &str, sector: u64, data: &[u8]) {
        debug_assert!(data.len() <= SECTOR_SIZE);
        let key = cache_key(file_id, sector);
        let now = Instant::now();

        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        inner.remove(&key);
        inner.make_room(key.len() + data.len(), self.max_bytes);
        inner.used_bytes += key.len() + data.len();
        inner.map.insert(
            key,
            Entry {
                data: data.to_vec(),
                expires_at: now + CACHE_EXPIRE,
                last_used: tick,
            },
        );
    }

    fn pool(&self) -> &BufferPool {
        &self.pool
    }

    fn size_bytes(&self) -> i64 {
        self.max_bytes as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn small_requests_are_raised_to_the_minimum() {
        for size_mb in [0, 1, 16] {
            let cache = SectorCache::new(size_mb);
            assert_eq!(cache.size_bytes(), 17 * 1024 * 1024);
        }
        assert_eq!(SectorCache::new(50).size_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn round_trip_is_byte_exact() {
        let cache = SectorCache::new(0);
        for data in [&b""[..], b"x", &[7u8; SECTOR_SIZE]] {
            cache.set("file", 13, data);
            let mut buf = cache.pool().acquire();
            assert_eq!(cache.get("file", 13, &mut buf), Some(data.len()));
            assert_eq!(&buf[..], data);
        }
    }

    #[test]
    fn keys_separate_files_and_sectors() {
        let cache = SectorCache::new(0);
        cache.set("a", 1, b"a1");
        cache.set("b", 1, b"b1");
        cache.set("a", 2, b"a2");
        let mut buf = Vec::new();
        assert_eq!(cache.get("a", 1, &mut buf), Some(2));
        assert_eq!(&buf[..], b"a1");
        assert_eq!(cache.get("b", 1, &mut buf), Some(2));
        assert_eq!(&buf[..], b"b1");
        assert!(cache.get("b", 2, &mut buf).is_none());
    }

    #[test]
    fn caller_mutation_does_not_leak_into_the_cache() {
        let cache = SectorCache::new(0);
        let mut data = vec![10u8, 11, 12];
        cache.set("file", 99, &data);

        // mutating the source after set changes nothing
        data[0] = 20;
        let mut buf = Vec::new();
        assert_eq!(cache.get("file", 99, &mut buf), Some(3));
        assert_eq!(&buf[..], &[10, 11, 12]);

        // mutating the returned buffer changes nothing either
        buf[0] = 30;
        let mut buf2 = Vec::new();
        assert_eq!(cache.get("file", 99, &mut buf2), Some(3));
        assert_eq!(&buf2[..], &[10, 11, 12]);
    }

    #[test]
    fn expired_entries_read_as_misses() {
        let cache = SectorCache::new(0);
        cache.set("file", 5, b"stale");
        {
            let mut inner = cache.inner.lock();
            let key = cache_key("file", 5);
            inner.map.get_mut(&key).unwrap().expires_at = Instant::now() - Duration::from_secs(1);
        }
        let mut buf = Vec::new();
        assert!(cache.get("file", 5, &mut buf).is_none());
        // and the entry is gone, not just hidden
        assert!(cache.inner.lock().map.is_empty());
        assert_eq!(cache.inner.lock().used_bytes, 0);
    }

    #[test]
    fn eviction_keeps_memory_bounded_and_drops_the_coldest() {
        let cache = SectorCache::new(0); // 17 MB => fits ~1088 full sectors
        let data = vec![0u8; SECTOR_SIZE];
        for sector in 0..1500u64 {
            cache.set("file", sector, &data);
        }
        {
            let inner = cache.inner.lock();
            assert!(inner.used_bytes <= cache.max_bytes);
            assert!(inner.map.len() < 1500);
        }
        let mut buf = Vec::new();
        // oldest entries were evicted, newest survived
        assert!(cache.get("file", 0, &mut buf).is_none());
        assert!(cache.get("file", 1499, &mut buf).is_some());
    }

    #[test]
    fn get_refreshes_lru_position() {
        let cache = SectorCache::new(0);
        let data = vec![0u8; SECTOR_SIZE];
        cache.set("file", 0, &data);
        let mut buf = Vec::new();
        for sector in 1..1200u64 {
            cache.set("file", sector, &data);
            // keep sector 0 hot while the cache fills up
            assert!(cache.get("file", 0, &mut buf).is_some());
        }
        assert!(cache.get("file", 0, &mut buf).is_some());
    }
}
