//! End-to-end round-trip and gap-filling checks against a real swap file
//! on disk (spec §8 R1, R2, scenarios 1 and 2).

use std::sync::atomic::{AtomicU32, Ordering};

use memfile::{MemFile, OpenFlags, SyncFlags};

fn temp_path(name: &str) -> std::path::PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("memfile-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(format!("{name}-{n}.swap"))
}

/// R1: new -> write -> put(dirty) -> sync -> close -> open -> get yields
/// exactly the original bytes, for a multi-page block.
#[test]
fn roundtrip_multi_page_block_survives_close_and_reopen() {
    let path = temp_path("r1-multipage");
    let page_size;
    let pattern: Vec<u8> = (0u32..(4096 * 3)).map(|i| (i % 251) as u8).collect();

    {
        let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();
        page_size = mf.page_size() as usize;
        let page_count = (pattern.len() / 4096) as u32; // mirrors page_size below if it differs
        let mut h = mf.new_block(false, page_count.max(1));
        let dst = h.data_mut();
        let n = pattern.len().min(dst.len());
        dst[..n].copy_from_slice(&pattern[..n]);
        let bnum = h.bnum();
        drop(h);
        mf.put(bnum, true, false).unwrap();
        mf.sync(SyncFlags::ALL | SyncFlags::FLUSH).unwrap();
        mf.close(false).unwrap();
    }
    {
        let mf = MemFile::open(Some(&path), OpenFlags::empty()).unwrap();
        let page_count = ((pattern.len() + page_size - 1) / page_size) as u32;
        let h = mf
            .get_block(0, page_count.max(1))
            .unwrap()
            .expect("block 0 present after reopen");
        assert_eq!(&h.data()[..pattern.len()], pattern.as_slice());
    }

    let _ = std::fs::remove_file(&path);
}

/// R2: trans_add (implicit via put(..., infile=true)) then trans_del for a
/// freshly-created negative block returns a positive number, and get(p)
/// returns the same contents that were written before translation.
#[test]
fn translated_block_is_reachable_under_its_new_number() {
    let path = temp_path("r2-translate");
    let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();

    let mut h = mf.new_block(true, 1);
    h.data_mut().fill(0x5A);
    let old = h.bnum();
    drop(h);

    let new_bnum = mf.put(old, true, true).unwrap();
    assert!(new_bnum >= 0);
    assert_eq!(mf.trans_del(old), new_bnum);
    assert_eq!(mf.trans_del(old), old);

    let h = mf
        .get_block(new_bnum, 1)
        .unwrap()
        .expect("translated block reachable under its new number");
    assert!(h.data().iter().all(|&b| b == 0x5A));

    let _ = std::fs::remove_file(&path);
}

/// Scenario 2: freeing a block before it was ever synced leaves a gap that
/// `sync` must fill so the file has no holes.
#[test]
fn gap_between_freed_and_dirty_blocks_is_filled_on_sync() {
    let path = temp_path("scenario2-gapfill");
    let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();

    let b0 = mf.new_block(false, 1).bnum();
    let b1 = mf.new_block(false, 1).bnum();
    let b2 = mf.new_block(false, 1).bnum();
    assert_eq!((b0, b1, b2), (0, 1, 2));

    mf.put(b0, true, false).unwrap();
    mf.put(b1, true, false).unwrap();
    mf.free(b1).unwrap();

    let mut h2 = mf.get_block(b2, 1).unwrap().expect("block 2 still live");
    h2.data_mut().fill(0x42);
    drop(h2);
    mf.put(b2, true, false).unwrap();

    mf.sync(SyncFlags::ALL).unwrap();
    assert_eq!(mf.infile_count(), 3);

    let _ = std::fs::remove_file(&path);
}

/// Scenario 1: a device/filesystem block size within the legal range is
/// adopted as the MemFile's page size at open time.
#[test]
fn page_size_is_clamped_to_legal_range() {
    let path = temp_path("scenario1-pagesize");
    let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();
    assert!(mf.page_size() >= memfile::MIN_SWAP_PAGE_SIZE);
    assert!(mf.page_size() <= memfile::MAX_SWAP_PAGE_SIZE);
    let _ = std::fs::remove_file(&path);
}
