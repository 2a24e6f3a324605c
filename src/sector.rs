//! Sector addressing
//!
//! A file is divided into fixed-size sectors, comparable to the sectors of a
//! block device. Sectors are the unit of caching and of connection reads: a
//! warm connection always sits on a sector boundary, and the shared cache
//! stores whole sectors.

use std::time::Duration;

/// Size of one sector in bytes. This is also the download buffer size.
pub const SECTOR_SIZE: usize = 16 * 1024;

/// How far ahead of an open connection a requested sector may lie before a
/// fresh connection is cheaper than reading up to it. Sequential connections
/// cannot seek backwards, and on a high-bandwidth link reading ~50 MiB of
/// unwanted data beats paying another connection round-trip.
pub const MAX_SECTOR_JUMP: u64 = (50 * 1024 * 1024 / SECTOR_SIZE) as u64;

/// How many open connections a reader keeps per file for later reuse.
pub const MAX_READERS_PER_FILE: usize = 6;

/// Cached sectors expire after this duration.
pub const CACHE_EXPIRE: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Maximum supported file size in bytes.
pub const MAX_FILE_SIZE: i64 = 100 * 1024 * 1024 * 1024;

/// Splits a byte offset into the sector that contains it and the offset
/// within that sector. The first sector is 0. Negative offsets map to the
/// start of the file.
pub fn decompose(offset: i64) -> (u64, usize) {
    if offset < 0 {
        return (0, 0);
    }
    let inner_off = (offset % SECTOR_SIZE as i64) as usize;
    let sector = (offset / SECTOR_SIZE as i64) as u64;
    (sector, inner_off)
}
