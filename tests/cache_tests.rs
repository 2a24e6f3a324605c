use farread::backend::demo::{self, BIG_FILE};
use farread::{Cache, FileReader, RamBackend, ReadAt, SectorCache, SECTOR_SIZE};
use std::sync::Arc;

#[test]
fn capacity_requests_are_floored_at_17_mb() {
    for size_mb in [0, 1, 16, 17] {
        assert_eq!(SectorCache::new(size_mb).size_bytes(), 17 * 1024 * 1024);
    }
    assert_eq!(SectorCache::new(64).size_bytes(), 64 * 1024 * 1024);
}

#[test]
fn round_trip_through_the_trait_object() {
    let cache: Arc<dyn Cache> = Arc::new(SectorCache::new(0));

    let mut data = cache.pool().acquire();
    data[0] = 0xFF;
    cache.set("fileId", 13, &data);

    let mut buf = cache.pool().acquire();
    assert_eq!(cache.get("fileId", 13, &mut buf), Some(SECTOR_SIZE));
    assert_eq!(buf[0], 0xFF);
    assert_eq!(&buf[1..], &data[1..]);

    // unknown keys miss
    assert_eq!(cache.get("fileId", 14, &mut buf), None);
    assert_eq!(cache.get("otherId", 13, &mut buf), None);

    cache.pool().release(data);
    cache.pool().release(buf);
}

#[test]
fn mutations_never_reach_stored_sectors() {
    let cache: Arc<dyn Cache> = Arc::new(SectorCache::new(0));

    let mut data = vec![10u8, 11, 12];
    cache.set("fileId", 99, &data);
    data.fill(0);

    let mut buf = Vec::new();
    assert_eq!(cache.get("fileId", 99, &mut buf), Some(3));
    assert_eq!(&buf[..], &[10, 11, 12]);

    buf.fill(0);
    let mut buf2 = Vec::new();
    assert_eq!(cache.get("fileId", 99, &mut buf2), Some(3));
    assert_eq!(&buf2[..], &[10, 11, 12]);
}

#[test]
fn pool_hands_out_sector_sized_buffers_indefinitely() {
    let cache = SectorCache::new(0);
    let mut held = Vec::new();
    for _ in 0..1000 {
        let buf = cache.pool().acquire();
        assert_eq!(buf.len(), SECTOR_SIZE);
        held.push(buf);
    }
    for buf in held {
        cache.pool().release(buf);
    }
}

#[test]
fn one_cache_serves_many_readers_of_one_file() {
    let backend = Arc::new(RamBackend::new());
    demo::init_demo(&backend).unwrap();
    let file = backend.files().by_name(BIG_FILE).unwrap().clone();
    let cache: Arc<dyn Cache> = Arc::new(SectorCache::new(1));

    let first = FileReader::new(file.clone(), backend.clone(), Some(cache.clone()));
    let second = FileReader::new(file, backend.clone(), Some(cache));

    let mut buf = [0u8; 1];
    first.read_at(&mut buf, 1).unwrap();
    second.read_at(&mut buf, 1).unwrap();

    // the second reader never touched the backend
    let stat = second.stat();
    assert_eq!(stat.get("cache_hit"), Some(&1));
    assert_eq!(stat.get("conn_open"), None);
    assert_eq!(stat.get("sector_read"), None);
}

#[test]
fn concurrent_set_get_pairs_lose_nothing() {
    let cache: Arc<dyn Cache> = Arc::new(SectorCache::new(0));

    std::thread::scope(|s| {
        for t in 0..5u64 {
            let cache = Arc::clone(&cache);
            s.spawn(move || {
                let mut buf = Vec::new();
                for i in 0..1000u64 {
                    let sector = t * 1000 + i;
                    cache.set("fileId", sector, &[0xFF]);
                    let n = cache.get("fileId", sector, &mut buf);
                    assert_eq!(n, Some(1));
                    assert_eq!(buf[0], 0xFF);
                }
            });
        }
    });
}
