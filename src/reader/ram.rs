//! Trivial readers
//!
//! Reference implementations of the [`ReadAt`] capability without any
//! backend behind them. `RamReader` serves a byte buffer, `ZeroReader`
//! serves nothing; both are handy as stand-ins in tests and as the smallest
//! possible examples of the read contract.

use crate::error::{Result, StorageError};
use crate::reader::ReadAt;
use std::collections::BTreeMap;

/// Serves a byte buffer held in memory.
pub struct RamReader {
    data: Vec<u8>,
}

impl RamReader {
    pub fn new(data: Vec<u8>) -> Self {
        RamReader { data }
    }
}

impl ReadAt for RamReader {
    fn read_at(&self, buf: &mut [u8], off: i64) -> Result<usize> {
        if off < 0 {
            return Err(StorageError::InvalidArgument("negative offset"));
        }
        let off = off as usize;
        if off >= self.data.len() {
            return Ok(0);
        }
        let chunk = &self.data[off..];
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn stat(&self) -> BTreeMap<String, u64> {
        BTreeMap::new()
    }
}

/// A reader with no data; every read reports end-of-data.
pub struct ZeroReader;

impl ReadAt for ZeroReader {
    fn read_at(&self, _buf: &mut [u8], _off: i64) -> Result<usize> {
        Ok(0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn stat(&self) -> BTreeMap<String, u64> {
        BTreeMap::new()
    }
}
