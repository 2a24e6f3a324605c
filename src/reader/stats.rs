//! Reader counters
//!
//! Every reader keeps monotonic counters of its internal activity. They are
//! the observability surface of the engine: tests assert exact counter
//! deltas, and operators read them to judge cache efficiency and connection
//! churn. All log output of the read path is concentrated here so the
//! algorithm code stays free of logging noise.

use log::{debug, trace};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

#[derive(Default)]
pub(crate) struct ReaderStats {
    cache_hit: AtomicU64,
    cache_miss: AtomicU64,
    cache_set: AtomicU64,
    conn_close: AtomicU64,
    conn_open: AtomicU64,
    conn_open_err: AtomicU64,
    conn_reuse: AtomicU64,
    read_err: AtomicU64,
    read_req: AtomicU64,
    reader_close: AtomicU64,
    reader_new: AtomicU64,
    sector_read: AtomicU64,
    sector_skip: AtomicU64,
}

impl ReaderStats {
    pub fn new() -> Self {
        ReaderStats::default()
    }

    /// Counter snapshot. Counters that never fired are omitted.
    pub fn stat(&self) -> BTreeMap<String, u64> {
        let counters = [
            ("cache_hit", &self.cache_hit),
            ("cache_miss", &self.cache_miss),
            ("cache_set", &self.cache_set),
            ("conn_close", &self.conn_close),
            ("conn_open", &self.conn_open),
            ("conn_open_err", &self.conn_open_err),
            ("conn_reuse", &self.conn_reuse),
            ("read_err", &self.read_err),
            ("read_req", &self.read_req),
            ("reader_close", &self.reader_close),
            ("reader_new", &self.reader_new),
            ("sector_read", &self.sector_read),
            ("sector_skip", &self.sector_skip),
        ];
        counters
            .into_iter()
            .map(|(name, counter)| (name.to_owned(), counter.load(Relaxed)))
            .filter(|&(_, v)| v > 0)
            .collect()
    }

    pub fn on_new(&self, file_id: &str, cached: bool) {
        self.reader_new.fetch_add(1, Relaxed);
        debug!("reader new: id={file_id}, cache={cached}");
    }

    pub fn on_closing(&self, file_id: &str) {
        self.reader_close.fetch_add(1, Relaxed);
        debug!("reader closing: id={file_id}");
    }

    pub fn on_conn_close(&self, file_id: &str, slot: usize) {
        self.conn_close.fetch_add(1, Relaxed);
        debug!("conn close: id={file_id}, slot={slot}");
    }

    pub fn on_request(&self, file_id: &str, off: i64, len: usize, sector: u64, inner_off: usize) {
        self.read_req.fetch_add(1, Relaxed);
        trace!("read request: id={file_id}, off={off}, len={len}, sector={sector}, inner={inner_off}");
    }

    pub fn on_read_error(&self, file_id: &str) {
        self.read_err.fetch_add(1, Relaxed);
        debug!("read failed: id={file_id}");
    }

    pub fn on_cache_get(&self, file_id: &str, sector: u64, hit: bool) {
        if hit {
            self.cache_hit.fetch_add(1, Relaxed);
        } else {
            self.cache_miss.fetch_add(1, Relaxed);
        }
        trace!("cache get: id={file_id}, sector={sector}, hit={hit}");
    }

    pub fn on_cache_set(&self, file_id: &str, sector: u64, len: usize) {
        self.cache_set.fetch_add(1, Relaxed);
        trace!("cache set: id={file_id}, sector={sector}, len={len}");
    }

    pub fn on_conn_reuse(&self, file_id: &str, slot: usize, cursor: u64) {
        self.conn_reuse.fetch_add(1, Relaxed);
        trace!("conn reuse: id={file_id}, slot={slot}, cursor={cursor}");
    }

    pub fn on_conn_open(&self, file_id: &str, sector: u64, ok: bool) {
        self.conn_open.fetch_add(1, Relaxed);
        if !ok {
            self.conn_open_err.fetch_add(1, Relaxed);
        }
        debug!("conn open: id={file_id}, sector={sector}, ok={ok}");
    }

    pub fn on_sector_skip(&self, file_id: &str, sector: u64, n: usize) {
        self.sector_skip.fetch_add(1, Relaxed);
        trace!("sector skip: id={file_id}, sector={sector}, n={n}");
    }

    pub fn on_sector_read(&self, file_id: &str, sector: u64, n: usize) {
        self.sector_read.fetch_add(1, Relaxed);
        trace!("sector read: id={file_id}, sector={sector}, n={n}");
    }
}
