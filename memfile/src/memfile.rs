//! The `MemFile` allocator (component G), sync engine (component H),
//! pressure release (component I) and file-name handling (component J).
//!
//! This module owns [`MemFileInner`], the single-threaded state machine
//! spec §3.6 describes, and [`MemFile`], the `Rc<RefCell<_>>` handle
//! callers hold. The handle shape (rather than a bare `&mut` struct) is
//! what lets [`crate::release_all`] reach every open `MemFile` from a
//! process-wide registry (component O) without the allocator needing to
//! know about that registry itself.
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use bitflags::bitflags;
use log::{debug, info};

use crate::block::{Block, BlockFlags, BlockNr};
use crate::error::{MemFileError, Result};
use crate::free_list::{FreeList, Taken};
use crate::index::BlockIndex;
use crate::registry;
use crate::swapfile::SwapFile;
use crate::trans::TransTable;

/// Lower bound of the legal page-size range (spec §6.1).
pub const MIN_SWAP_PAGE_SIZE: u32 = 512;
/// Upper bound of the legal page-size range (spec §6.1).
pub const MAX_SWAP_PAGE_SIZE: u32 = 65536;

const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Tri-state dirty flag for the whole `MemFile` (spec §3.6, §9).
///
/// `DirtyNoSync` is distinct from a plain boolean: it lets a caller (e.g.
/// recovery replay) push data through `put` without that `put` promoting
/// the file back to `Dirty`, so a subsequent `sync` does not re-flush
/// blocks the caller knows are already consistent on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    Clean,
    Dirty,
    DirtyNoSync,
}

bitflags! {
    /// Flags for [`MemFile::open`] (spec §6.2 `open_flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u8 {
        /// The swap file is expected not to exist yet; refuse if it does
        /// (symlink-attack protection, spec §4.F.1).
        const CREATE_NEW = 0b01;
    }
}

bitflags! {
    /// Flags for [`MemFile::sync`] (spec §4.H).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SyncFlags: u8 {
        /// Write blocks regardless of sign (default: only `bnum >= 0`).
        const ALL = 0b0001;
        /// Yield between blocks if external input is pending.
        const STOP = 0b0010;
        /// Issue `fsync` after the walk.
        const FLUSH = 0b0100;
        /// Only ever write the block with `bnum == 0`.
        const ZERO = 0b1000;
    }
}

/// The paged memory-file state machine (spec §3.6).
pub(crate) struct MemFileInner {
    fname: Option<PathBuf>,
    full_fname: Option<PathBuf>,
    swap: Option<SwapFile>,
    page_size: u32,
    blocknr_max: BlockNr,
    blocknr_min: BlockNr,
    neg_count: u64,
    infile_count: BlockNr,
    dirty: DirtyState,
    free_list: FreeList,
    index: BlockIndex,
    trans: TransTable,
    /// Set by [`MemFile::request_interrupt`] to simulate a user interrupt
    /// arriving mid-sync (spec §4.H, testable property scenario 4). There
    /// is no real asynchronous input source in this subsystem (§5), so
    /// this single flag stands in for both "interrupt pending" and, when
    /// `SyncFlags::STOP` is set, "external input is available" — the two
    /// conditions spec §4.H treats as a single `got_int`-style check in
    /// the original implementation.
    interrupt_pending: bool,
    /// Set by [`MemFile::request_interrupt_after`]: the number of blocks
    /// `sync` should attempt before `interrupt_pending` flips to `true` on
    /// its own, partway through the walk. A test/CLI-only hook standing in
    /// for the asynchronous signal that sets `got_int` mid-call in the
    /// original implementation (see `interrupt_pending` above).
    interrupt_after: Option<u32>,
}

impl MemFileInner {
    fn new_empty() -> Self {
        Self {
            fname: None,
            full_fname: None,
            swap: None,
            page_size: DEFAULT_PAGE_SIZE,
            blocknr_max: 0,
            blocknr_min: -1,
            neg_count: 0,
            infile_count: 0,
            dirty: DirtyState::Clean,
            free_list: FreeList::new(),
            index: BlockIndex::new(),
            trans: TransTable::new(),
            interrupt_pending: false,
            interrupt_after: None,
        }
    }

    fn mark_dirty(&mut self) {
        if self.dirty == DirtyState::Clean {
            self.dirty = DirtyState::Dirty;
        }
    }

    /// `new` (spec §4.G.1).
    fn do_new(&mut self, negative: bool, page_count: u32) -> BlockNr {
        let bnum = if !negative {
            match self.free_list.head_page_count() {
                Some(avail) if avail >= page_count => match self.free_list.take(page_count) {
                    Taken::Exact(bnum) | Taken::Split(bnum) => bnum,
                },
                _ => {
                    let bnum = self.blocknr_max;
                    self.blocknr_max += page_count as BlockNr;
                    bnum
                }
            }
        } else {
            let bnum = self.blocknr_min;
            self.blocknr_min -= 1;
            self.neg_count += 1;
            bnum
        };

        let block = Block::new(
            bnum,
            page_count,
            self.page_size,
            BlockFlags::LOCKED | BlockFlags::DIRTY,
        );
        self.index.insert(block);
        self.dirty = DirtyState::Dirty;
        debug!("memfile: new block {bnum} ({page_count} pages)");
        bnum
    }

    /// `get` (spec §4.G.2).
    fn do_get(&mut self, nr: BlockNr, page_count: u32) -> Result<Option<BlockNr>> {
        if nr >= self.blocknr_max || nr <= self.blocknr_min {
            return Err(MemFileError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "block number out of range",
            )));
        }

        if self.index.contains(nr) {
            let block = self.index.touch(nr).expect("just checked contains");
            block.insert_flags(BlockFlags::LOCKED);
            return Ok(Some(nr));
        }

        if nr < 0 || nr >= self.infile_count {
            return Ok(None);
        }

        let Some(swap) = self.swap.as_ref() else {
            return Ok(None);
        };

        let mut block = Block::new(nr, page_count, self.page_size, BlockFlags::empty());
        match swap.read_block(nr, self.page_size, block.data_mut()) {
            Ok(()) => {
                block.insert_flags(BlockFlags::LOCKED);
                self.index.insert(block);
                Ok(Some(nr))
            }
            Err(_) => Ok(None),
        }
    }

    /// `put` (spec §4.G.3).
    fn do_put(&mut self, bnum: BlockNr, dirty: bool, infile: bool) -> Result<BlockNr> {
        {
            let block = self
                .index
                .get_mut(bnum)
                .ok_or(MemFileError::BlockNotLocked)?;
            if !block.is_locked() {
                return Err(MemFileError::BlockNotLocked);
            }
            block.remove_flags(BlockFlags::LOCKED);
            if dirty && self.dirty != DirtyState::DirtyNoSync {
                block.insert_flags(BlockFlags::DIRTY);
                self.mark_dirty();
            }
        }

        if infile {
            Ok(self.do_trans_add(bnum))
        } else {
            Ok(bnum)
        }
    }

    /// `free` (spec §4.G.4).
    fn do_free(&mut self, bnum: BlockNr) -> Result<()> {
        let block = self
            .index
            .remove(bnum)
            .ok_or(MemFileError::BlockNotLocked)?;
        if bnum < 0 {
            self.neg_count = self.neg_count.saturating_sub(1);
        } else {
            self.free_list.push(bnum, block.page_count());
        }
        debug!("memfile: freed block {bnum}");
        Ok(())
    }

    /// `trans_add` (spec §4.G.5). No-op (returns unchanged) for
    /// already-positive blocks.
    fn do_trans_add(&mut self, bnum: BlockNr) -> BlockNr {
        if bnum >= 0 {
            return bnum;
        }
        let page_count = self
            .index
            .get(bnum)
            .map(Block::page_count)
            .unwrap_or(1);
        let new_bnum = match self.free_list.head_page_count() {
            Some(avail) if avail >= page_count => match self.free_list.take(page_count) {
                Taken::Exact(n) | Taken::Split(n) => n,
            },
            _ => {
                let n = self.blocknr_max;
                self.blocknr_max += page_count as BlockNr;
                n
            }
        };
        self.index.rekey(bnum, new_bnum);
        self.trans.add(bnum, new_bnum);
        debug!("memfile: translated block {bnum} -> {new_bnum}");
        new_bnum
    }

    /// `trans_del` (spec §4.G.6). `neg_count` is decremented here, not in
    /// `trans_add`, so `need_trans` stays true for the whole window between
    /// a translation and the caller actually resolving it.
    fn do_trans_del(&mut self, old_nr: BlockNr) -> BlockNr {
        match self.trans.take(old_nr) {
            Some(new_nr) => {
                self.neg_count = self.neg_count.saturating_sub(1);
                new_nr
            }
            None => old_nr,
        }
    }

    /// Write one block, filling any gap between `infile_count` and the
    /// block's own position (spec §4.F.3). A gap position that still holds
    /// a live header is written with *that block's own data* and its
    /// `DIRTY` cleared (mirrors `mf_write`'s recursive write of the block
    /// actually occupying the gap); a gap position with no live header is
    /// filled with a single page of `H`'s data, since nothing else is known
    /// to belong there.
    fn write_with_gapfill(&mut self, bnum: BlockNr) -> Result<()> {
        let page_size = self.page_size;

        let mut nr = self.infile_count.min(bnum);
        while nr < bnum {
            if let Some(block) = self.index.get(nr) {
                let page_count = block.page_count();
                let data = block.data().to_vec();
                {
                    let swap = self.swap.as_mut().ok_or(MemFileError::NoSwapFile)?;
                    swap.write_block(nr, page_size, &data)?;
                }
                self.index
                    .get_mut(nr)
                    .expect("still present")
                    .remove_flags(BlockFlags::DIRTY);
                self.infile_count = nr + page_count as BlockNr;
            } else {
                let mut filler = vec![0u8; page_size as usize];
                if let Some(target) = self.index.get(bnum) {
                    let src = target.data();
                    let n = filler.len().min(src.len());
                    filler[..n].copy_from_slice(&src[..n]);
                }
                let swap = self.swap.as_mut().ok_or(MemFileError::NoSwapFile)?;
                swap.write_block(nr, page_size, &filler)?;
                self.infile_count = nr + 1;
            }
            nr = self.infile_count.min(bnum);
        }

        let swap = self.swap.as_mut().ok_or(MemFileError::NoSwapFile)?;
        let target = self
            .index
            .get(bnum)
            .expect("write_with_gapfill called on absent block");
        swap.write_block(bnum, page_size, target.data())?;
        let written_through = bnum + target.page_count() as BlockNr;
        if written_through > self.infile_count {
            self.infile_count = written_through;
        }

        let target = self.index.get_mut(bnum).expect("still present");
        target.remove_flags(BlockFlags::DIRTY);
        Ok(())
    }

    /// `sync` (spec §4.H).
    fn do_sync(&mut self, flags: SyncFlags) -> Result<()> {
        if self.swap.is_none() {
            self.dirty = DirtyState::Clean;
            return Err(MemFileError::NoSwapFile);
        }

        let saved_interrupt = self.interrupt_pending;
        self.interrupt_pending = false;

        let mut attempted = 0u32;
        let mut first_failure = false;
        let mut aborted = false;

        let keys: Vec<BlockNr> = self.index.keys().collect();
        for bnum in keys {
            let should_write = match self.index.get(bnum) {
                Some(block) => {
                    let sign_ok = flags.contains(SyncFlags::ALL) || block.bnum() >= 0;
                    let zero_ok = !flags.contains(SyncFlags::ZERO) || block.bnum() == 0;
                    sign_ok && zero_ok && block.is_dirty()
                }
                None => false,
            };
            if !should_write {
                continue;
            }

            if first_failure && bnum >= self.infile_count {
                // A previous write already failed; avoid extending a full disk.
                continue;
            }

            attempted += 1;
            match self.write_with_gapfill(bnum) {
                Ok(()) => {}
                Err(_) if !first_failure => {
                    first_failure = true;
                }
                Err(e) => {
                    aborted = true;
                    self.interrupt_pending |= saved_interrupt;
                    return Err(e);
                }
            }

            if let Some(threshold) = self.interrupt_after {
                if attempted >= threshold {
                    self.interrupt_pending = true;
                    self.interrupt_after = None;
                }
            }

            // At least one block has been attempted by this point (the
            // increment above), satisfying both the STOP branch's "but at
            // least one block must have been attempted" rule and the
            // non-STOP "check for interrupt between blocks" rule (spec
            // §4.H) — the two collapse to the same check since this crate
            // models both conditions with one shared flag (see
            // `interrupt_pending` above).
            if self.interrupt_pending {
                aborted = true;
                break;
            }
        }

        self.interrupt_pending |= saved_interrupt;

        if !first_failure && !aborted {
            self.dirty = DirtyState::Clean;
        }

        if flags.contains(SyncFlags::FLUSH) {
            if let Some(swap) = self.swap.as_ref() {
                swap.sync_all()?;
            }
        }

        if first_failure {
            return Err(MemFileError::WriteError(std::io::Error::other(
                "one or more blocks failed to write",
            )));
        }
        Ok(())
    }

    /// Pressure release for this `MemFile` (spec §4.I step 2).
    pub(crate) fn release_pressure(&mut self) -> bool {
        let mut released = false;
        let keys: Vec<BlockNr> = self.index.keys().collect();
        for bnum in keys {
            let Some(block) = self.index.get(bnum) else {
                continue;
            };
            if block.is_locked() {
                continue;
            }
            let writable = if block.is_dirty() {
                self.write_with_gapfill(bnum).is_ok()
            } else {
                true
            };
            if writable {
                self.index.remove(bnum);
                released = true;
            }
        }
        released
    }

    fn need_trans(&self) -> bool {
        self.swap.is_some() && self.neg_count > 0
    }
}

/// Handle to a live block, borrowed from its owning [`MemFile`].
///
/// Held only long enough to read or write the block's data; `put`/`free`
/// take the block's [`BlockNr`] directly rather than consuming this
/// handle, so drop it (end its scope) before calling them — holding it
/// across a `put`/`free` call would panic the `RefCell` borrow check, the
/// same way holding two mutable borrows of one value would fail to
/// compile in ordinary Rust code.
pub struct BlockHandle<'a> {
    guard: std::cell::RefMut<'a, MemFileInner>,
    bnum: BlockNr,
}

impl<'a> BlockHandle<'a> {
    pub fn bnum(&self) -> BlockNr {
        self.bnum
    }

    pub fn page_count(&self) -> u32 {
        self.block().page_count()
    }

    pub fn flags(&self) -> BlockFlags {
        self.block().flags()
    }

    pub fn data(&self) -> &[u8] {
        self.block().data()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.guard
            .index
            .get_mut(self.bnum)
            .expect("handle outlived its block")
            .data_mut()
    }

    fn block(&self) -> &Block {
        self.guard
            .index
            .get(self.bnum)
            .expect("handle outlived its block")
    }
}

/// A paged memory-file (spec §3.6, §6.2).
///
/// Cloning a `MemFile` clones the handle, not the state: all clones share
/// the same underlying `Rc<RefCell<MemFileInner>>`, matching the single
/// owning-buffer-per-MemFile model the original implementation assumes.
/// `MemFile` is intentionally `!Send`/`!Sync` (spec §5).
#[derive(Clone)]
pub struct MemFile {
    inner: Rc<RefCell<MemFileInner>>,
}

impl MemFile {
    /// `open` (spec §4.E, §6.2).
    pub fn open(fname: Option<&Path>, flags: OpenFlags) -> Result<Self> {
        let mut state = MemFileInner::new_empty();

        if let Some(fname) = fname {
            state.fname = Some(fname.to_path_buf());
            state.full_fname = std::fs::canonicalize(fname).ok();

            let create = flags.contains(OpenFlags::CREATE_NEW);
            let swap = SwapFile::open(fname, create)?;

            if let Some(bs) = swap.probe_page_size() {
                if (MIN_SWAP_PAGE_SIZE..=MAX_SWAP_PAGE_SIZE).contains(&bs) {
                    state.page_size = bs;
                }
            }

            let len = swap.len_bytes()?;
            let pages = len.div_ceil(u64::from(state.page_size));
            state.infile_count = pages as BlockNr;
            state.blocknr_max = state.infile_count;

            state.swap = Some(swap);
            info!(
                "memfile: opened swap file {:?} (page_size={})",
                fname, state.page_size
            );
        }

        let inner = Rc::new(RefCell::new(state));
        registry::register(&inner);
        Ok(Self { inner })
    }

    /// `open_file` (spec §6.2): attach a swap file to a memory-only
    /// `MemFile`.
    pub fn open_file(&self, fname: &Path) -> Result<()> {
        let mut state = self.inner.borrow_mut();
        if state.swap.is_some() {
            return Ok(());
        }
        let swap = SwapFile::open(fname, true)?;
        state.fname = Some(fname.to_path_buf());
        state.full_fname = std::fs::canonicalize(fname).ok();
        if let Some(bs) = swap.probe_page_size() {
            if (MIN_SWAP_PAGE_SIZE..=MAX_SWAP_PAGE_SIZE).contains(&bs) {
                state.page_size = bs;
            }
        }
        state.swap = Some(swap);
        info!("memfile: attached swap file {fname:?}");
        Ok(())
    }

    /// `close` (spec §6.2). Consumes the handle; the swap file is
    /// optionally deleted.
    pub fn close(self, delete_file: bool) -> Result<()> {
        let mut state = self.inner.borrow_mut();
        state.swap = None;
        if delete_file {
            if let Some(path) = state.fname.clone() {
                let _ = std::fs::remove_file(path);
            }
        }
        Ok(())
    }

    /// `close_file` (spec §6.2). `getlines` is the caller's promise that
    /// it has already pre-faulted every buffer line into memory before
    /// this call; this crate has no line storage (out of scope, spec §1)
    /// so it is accepted only to preserve the call shape and otherwise
    /// ignored.
    pub fn close_file(&self, _getlines: bool) -> Result<()> {
        let mut state = self.inner.borrow_mut();
        state.swap = None;
        Ok(())
    }

    /// `new` (spec §4.G.1, §6.2).
    pub fn new_block(&self, negative: bool, page_count: u32) -> BlockHandle<'_> {
        let mut guard = self.inner.borrow_mut();
        let bnum = guard.do_new(negative, page_count);
        BlockHandle { guard, bnum }
    }

    /// `get` (spec §4.G.2, §6.2).
    pub fn get_block(&self, nr: BlockNr, page_count: u32) -> Result<Option<BlockHandle<'_>>> {
        let mut guard = self.inner.borrow_mut();
        match guard.do_get(nr, page_count)? {
            Some(bnum) => Ok(Some(BlockHandle { guard, bnum })),
            None => Ok(None),
        }
    }

    /// `put` (spec §4.G.3, §6.2). Returns the block's current number,
    /// which — when `infile` is set — is the freshly assigned positive
    /// number the caller should persist into its own indirection blocks.
    pub fn put(&self, bnum: BlockNr, dirty: bool, infile: bool) -> Result<BlockNr> {
        self.inner.borrow_mut().do_put(bnum, dirty, infile)
    }

    /// `free` (spec §4.G.4, §6.2).
    pub fn free(&self, bnum: BlockNr) -> Result<()> {
        self.inner.borrow_mut().do_free(bnum)
    }

    /// `trans_del` (spec §4.G.6, §6.2).
    pub fn trans_del(&self, old_nr: BlockNr) -> BlockNr {
        self.inner.borrow_mut().do_trans_del(old_nr)
    }

    /// `sync` (spec §4.H, §6.2).
    pub fn sync(&self, flags: SyncFlags) -> Result<()> {
        self.inner.borrow_mut().do_sync(flags)
    }

    /// `set_dirty` (spec §6.2): force `DIRTY` on every positive-numbered
    /// block.
    pub fn set_dirty(&self) {
        let mut state = self.inner.borrow_mut();
        for (bnum, block) in state.index.iter_mut() {
            if *bnum > 0 {
                block.insert_flags(BlockFlags::DIRTY);
            }
        }
        state.mark_dirty();
    }

    /// `need_trans` (spec §6.2): true iff there is a swap file and any
    /// negative-numbered blocks exist.
    pub fn need_trans(&self) -> bool {
        self.inner.borrow().need_trans()
    }

    /// `fullname` (spec §4.J, §6.2): promote the previously computed
    /// absolute path into the primary slot.
    pub fn fullname(&self) {
        let mut state = self.inner.borrow_mut();
        if let Some(full) = state.full_fname.take() {
            state.fname = Some(full);
        }
    }

    /// `set_fnames` (spec §4.J, §6.2).
    pub fn set_fnames(&self, fname: &Path) {
        let mut state = self.inner.borrow_mut();
        state.fname = Some(fname.to_path_buf());
        state.full_fname = std::fs::canonicalize(fname).ok();
    }

    /// `free_fnames` (spec §4.J, §6.2).
    pub fn free_fnames(&self) {
        let mut state = self.inner.borrow_mut();
        state.fname = None;
        state.full_fname = None;
    }

    /// `set_page_size` (spec §4.E, §6.2). Must be called before any I/O
    /// has happened against this `MemFile` (the recovery-replay use case
    /// spec §4.E describes revises the page size right after `open`,
    /// before reading or writing any further blocks).
    pub fn set_page_size(&self, n: u32) -> Result<()> {
        if !(MIN_SWAP_PAGE_SIZE..=MAX_SWAP_PAGE_SIZE).contains(&n) {
            return Err(MemFileError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "page size out of range",
            )));
        }
        self.inner.borrow_mut().page_size = n;
        Ok(())
    }

    pub fn page_size(&self) -> u32 {
        self.inner.borrow().page_size
    }

    pub fn blocknr_max(&self) -> BlockNr {
        self.inner.borrow().blocknr_max
    }

    pub fn blocknr_min(&self) -> BlockNr {
        self.inner.borrow().blocknr_min
    }

    pub fn infile_count(&self) -> BlockNr {
        self.inner.borrow().infile_count
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty != DirtyState::Clean
    }

    pub fn set_dirty_no_sync(&self) {
        self.inner.borrow_mut().dirty = DirtyState::DirtyNoSync;
    }

    pub fn block_count(&self) -> usize {
        self.inner.borrow().index.len()
    }

    /// Simulate a user interrupt arriving during the next `sync` call
    /// (test/CLI hook only; spec §4.H, §5).
    pub fn request_interrupt(&self) {
        self.inner.borrow_mut().interrupt_pending = true;
    }

    /// Simulate a user interrupt arriving partway through the next `sync`
    /// call, after `n` blocks have been attempted (test/CLI hook only;
    /// spec §4.H, testable property scenario 4). Consumed the first time
    /// it fires.
    pub fn request_interrupt_after(&self, n: u32) {
        self.inner.borrow_mut().interrupt_after = Some(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("memfile-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(format!("{name}-{n}.swap"))
    }

    #[test]
    fn new_negative_blocks_decrement() {
        let mf = MemFile::open(None, OpenFlags::empty()).unwrap();
        let b1 = mf.new_block(true, 1).bnum();
        let b2 = mf.new_block(true, 1).bnum();
        assert_eq!(b1, -1);
        assert_eq!(b2, -2);
    }

    #[test]
    fn new_block_is_locked_and_dirty_p1() {
        let mf = MemFile::open(None, OpenFlags::empty()).unwrap();
        let h = mf.new_block(false, 1);
        assert_eq!(h.flags(), BlockFlags::LOCKED | BlockFlags::DIRTY);
    }

    #[test]
    fn put_clears_locked_p2() {
        let mf = MemFile::open(None, OpenFlags::empty()).unwrap();
        let bnum = mf.new_block(false, 1).bnum();
        mf.put(bnum, false, false).unwrap();
        let h = mf.get_block(bnum, 1).unwrap().unwrap();
        assert!(!h.flags().contains(BlockFlags::LOCKED));
    }

    #[test]
    fn negative_assignment_and_translation() {
        let path = temp_path("trans");
        let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();
        let b1 = mf.new_block(true, 1).bnum();
        let b2 = mf.new_block(true, 1).bnum();
        assert_eq!(b1, -1);
        assert_eq!(b2, -2);

        let new_b1 = mf.put(b1, true, true).unwrap();
        assert!(new_b1 >= 0);
        assert_eq!(mf.trans_del(-1), new_b1);
        assert_eq!(mf.trans_del(-1), -1);
        let _ = b2;
    }

    #[test]
    fn need_trans_stays_true_until_trans_del_resolves_it() {
        let path = temp_path("need-trans");
        let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();
        let bnum = mf.new_block(true, 1).bnum();
        assert!(mf.need_trans());

        let new_bnum = mf.put(bnum, true, true).unwrap();
        assert!(new_bnum >= 0);
        // The block was renumbered, but the caller has not yet resolved
        // its stale negative reference via trans_del: a translation is
        // still pending.
        assert!(mf.need_trans());

        mf.trans_del(bnum);
        assert!(!mf.need_trans());
    }

    #[test]
    fn free_then_get_negative_is_none() {
        let mf = MemFile::open(None, OpenFlags::empty()).unwrap();
        let bnum = mf.new_block(true, 1).bnum();
        mf.put(bnum, false, false).unwrap();
        mf.free(bnum).unwrap();
        assert!(mf.get_block(bnum, 1).unwrap().is_none());
    }

    #[test]
    fn sync_all_clears_dirty_p6() {
        let path = temp_path("sync-all");
        let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();
        let bnum = mf.new_block(false, 1).bnum();
        mf.put(bnum, true, false).unwrap();
        mf.sync(SyncFlags::ALL).unwrap();
        assert!(!mf.is_dirty());
        let h = mf.get_block(bnum, 1).unwrap().unwrap();
        assert!(!h.flags().contains(BlockFlags::DIRTY));
    }

    #[test]
    fn sync_zero_only_writes_block_zero_p8() {
        let path = temp_path("sync-zero");
        let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();
        let b0 = mf.new_block(false, 1).bnum();
        let b1 = mf.new_block(false, 1).bnum();
        mf.put(b0, true, false).unwrap();
        mf.put(b1, true, false).unwrap();
        mf.sync(SyncFlags::ZERO).unwrap();
        let h0 = mf.get_block(b0, 1).unwrap().unwrap();
        let h1 = mf.get_block(b1, 1).unwrap().unwrap();
        assert!(!h0.flags().contains(BlockFlags::DIRTY));
        assert!(h1.flags().contains(BlockFlags::DIRTY));
    }

    #[test]
    fn gap_fill_advances_infile_count() {
        let path = temp_path("gap-fill");
        let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();
        let b0 = mf.new_block(false, 1).bnum();
        let b1 = mf.new_block(false, 1).bnum();
        let b2 = mf.new_block(false, 1).bnum();
        mf.put(b0, true, false).unwrap();
        mf.put(b1, true, false).unwrap();
        mf.put(b2, true, false).unwrap();
        mf.free(b1).unwrap();
        mf.sync(SyncFlags::ALL).unwrap();
        assert_eq!(mf.infile_count(), 3);
        let _ = b0;
    }

    #[test]
    fn sync_interrupted_after_second_block_leaves_rest_dirty_scenario4() {
        let path = temp_path("scenario4-interrupt");
        let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();

        let bnums: Vec<_> = (0..10)
            .map(|_| {
                let bnum = mf.new_block(false, 1).bnum();
                mf.put(bnum, true, false).unwrap();
                bnum
            })
            .collect();

        mf.request_interrupt_after(2);
        mf.sync(SyncFlags::ALL).unwrap();

        assert!(mf.is_dirty());
        let still_dirty = bnums
            .iter()
            .filter(|&&bnum| {
                mf.get_block(bnum, 1)
                    .unwrap()
                    .unwrap()
                    .flags()
                    .contains(BlockFlags::DIRTY)
            })
            .count();
        assert_eq!(still_dirty, 8);
    }

    #[test]
    fn round_trip_through_close_and_reopen() {
        let path = temp_path("roundtrip");
        let pattern = vec![0xABu8; 4096];
        {
            let mf = MemFile::open(Some(&path), OpenFlags::CREATE_NEW).unwrap();
            let mut h = mf.new_block(false, 1);
            h.data_mut().copy_from_slice(&pattern);
            let bnum = h.bnum();
            drop(h);
            mf.put(bnum, true, false).unwrap();
            mf.sync(SyncFlags::ALL).unwrap();
            mf.close(false).unwrap();
        }
        {
            let mf = MemFile::open(Some(&path), OpenFlags::empty()).unwrap();
            let h = mf.get_block(0, 1).unwrap().expect("block present on disk");
            assert_eq!(h.data(), pattern.as_slice());
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn symlink_refusal_falls_back_to_memory_only() {
        #[cfg(unix)]
        {
            let target = temp_path("symlink-target");
            std::fs::write(&target, b"x").unwrap();
            let link = temp_path("symlink-link");
            std::os::unix::fs::symlink(&target, &link).unwrap();

            let err = MemFile::open(Some(&link), OpenFlags::CREATE_NEW).unwrap_err();
            assert!(matches!(err, MemFileError::SwapExists));

            let mf = MemFile::open(None, OpenFlags::empty()).unwrap();
            let bnum = mf.new_block(true, 1).bnum();
            assert_eq!(bnum, -1);

            let _ = std::fs::remove_file(&link);
            let _ = std::fs::remove_file(&target);
        }
    }
}
