use crate::*;
use anyhow::Result;
use config::SegmentConfig;
use std::fs;
use std::thread;
use tempfile::tempdir;

fn cfg(max_index_bytes: u64) -> SegmentConfig {
    SegmentConfig {
        max_index_bytes,
        sync_writes: false,
    }
}

#[test]
fn concurrent_writers_all_land() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("0.index");
    let shared = SharedIndex::new(Index::open(&path, &cfg(4096))?);

    let handles: Vec<_> = (0..4u32)
        .map(|t| {
            let idx = shared.clone();
            thread::spawn(move || {
                for i in 0..50u32 {
                    let off = t * 50 + i;
                    idx.write(off, u64::from(off) * 100).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(shared.len(), 200);
    let mut offsets: Vec<u32> = (0..200)
        .map(|n| shared.read(Selector::Nth(n)).unwrap())
        .inspect(|e| assert_eq!(e.position, u64::from(e.offset) * 100))
        .map(|e| e.offset)
        .collect();
    offsets.sort_unstable();
    assert_eq!(offsets, (0..200).collect::<Vec<_>>());

    shared.close()?;
    assert_eq!(fs::metadata(&path)?.len(), 200 * ENTRY_WIDTH);
    Ok(())
}

#[test]
fn append_returns_entry_number() -> Result<()> {
    let dir = tempdir()?;
    let shared = SharedIndex::new(Index::open(dir.path().join("0.index"), &cfg(1024))?);

    assert_eq!(shared.append(10, 0)?, 0);
    assert_eq!(shared.append(11, 12)?, 1);
    assert_eq!(shared.read(Selector::Nth(1))?, Entry::new(11, 12));
    Ok(())
}

#[test]
fn append_into_full_index_is_eof() -> Result<()> {
    let dir = tempdir()?;
    let shared = SharedIndex::new(Index::open(dir.path().join("0.index"), &cfg(12))?);

    shared.append(0, 0)?;
    assert!(shared.append(1, 12).unwrap_err().is_eof());
    assert_eq!(shared.len(), 1);
    Ok(())
}

#[test]
fn only_last_handle_closes() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("0.index");
    let a = SharedIndex::from(Index::open(&path, &cfg(1024))?);
    let b = a.clone();

    a.write(0, 0)?;
    b.close()?;

    // still open and still reserved
    assert_eq!(fs::metadata(&path)?.len(), 1024);
    a.write(1, 12)?;
    assert_eq!(a.read(Selector::Last)?, Entry::new(1, 12));

    a.close()?;
    assert_eq!(fs::metadata(&path)?.len(), 24);
    Ok(())
}

#[test]
fn name_matches_index_path() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("16.index");
    let shared = SharedIndex::new(Index::open(&path, &cfg(1024))?);
    assert_eq!(shared.name(), path.as_path());
    assert!(shared.is_empty());
    Ok(())
}
