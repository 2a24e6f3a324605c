//! Deterministic demo corpus
//!
//! Seeds a [`RamBackend`] with the fixture files used by the test suite and
//! the benchmarks:
//!
//! - `small-test-file-{1..20}.dat` — tiny files whose content equals their
//!   own name.
//! - `big-test-file-150.dat` — 150 MiB + 1 byte of seeded random data, one
//!   byte past a sector boundary.
//! - `special-file-16777215.dat` — 16 MiB - 1 bytes, one byte short of a
//!   sector boundary; regression fixture for reads near the end.
//!
//! The two large payloads are generated once per process and shared between
//! backends, so repeated seeding stays cheap.

use crate::backend::RamBackend;
use crate::error::Result;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::{Arc, OnceLock};

pub const BIG_FILE: &str = "big-test-file-150.dat";
pub const BIG_FILE_SIZE: usize = 150 * 1024 * 1024 + 1;

pub const EDGE_FILE: &str = "special-file-16777215.dat";
pub const EDGE_FILE_SIZE: usize = 16 * 1024 * 1024 - 1;

pub const SMALL_FILES: usize = 20;

/// Name of the i-th small demo file (1-based). Its content is the name
/// itself.
pub fn small_file_name(i: usize) -> String {
    format!("small-test-file-{i}.dat")
}

/// Content of `big-test-file-150.dat`, shared process-wide.
pub fn big_content() -> Arc<Vec<u8>> {
    static CONTENT: OnceLock<Arc<Vec<u8>>> = OnceLock::new();
    CONTENT
        .get_or_init(|| Arc::new(random_bytes(BIG_FILE_SIZE, 1337)))
        .clone()
}

/// Content of `special-file-16777215.dat`, shared process-wide.
pub fn edge_content() -> Arc<Vec<u8>> {
    static CONTENT: OnceLock<Arc<Vec<u8>>> = OnceLock::new();
    CONTENT
        .get_or_init(|| Arc::new(random_bytes(EDGE_FILE_SIZE, 7331)))
        .clone()
}

/// Saves any missing demo files and publishes the index.
pub fn init_demo(backend: &RamBackend) -> Result<()> {
    backend.update()?;

    for i in 1..=SMALL_FILES {
        let name = small_file_name(i);
        if backend.files().by_name(&name).is_none() {
            backend.save(&name, name.clone().into_bytes())?;
        }
    }
    if backend.files().by_name(BIG_FILE).is_none() {
        backend.save_shared(BIG_FILE, big_content())?;
    }
    if backend.files().by_name(EDGE_FILE).is_none() {
        backend.save_shared(EDGE_FILE, edge_content())?;
    }

    backend.update()
}

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}
