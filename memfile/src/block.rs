//! Block header & data record (component A).
//!
//! A [`Block`] is the unit the allocator hands out: an owned, page-aligned
//! byte buffer plus the bookkeeping ([`BlockNr`], page count, [`BlockFlags`])
//! the rest of the subsystem needs to decide when it may be written,
//! evicted, or reused.

use bitflags::bitflags;

/// A block number.
///
/// Non-negative values (`0, 1, 2, ...`) identify a page offset within the
/// swap file. Negative values (`-1, -2, ...`) identify a block that has
/// never been assigned a place on disk.
pub type BlockNr = i64;

bitflags! {
    /// Per-block state (§3.2).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u8 {
        /// Pinned in memory; must not be evicted.
        const LOCKED = 0b01;
        /// Modified relative to its on-disk copy (or never written at all).
        const DIRTY = 0b10;
    }
}

/// One in-memory block: identity, page count, owned data, and flags.
///
/// Invariants (§3.2):
/// 1. `page_count` never changes across the block's lifetime once handed to
///    a caller (the free list may shrink a *free* run in place, but that run
///    is not a live `Block`, see [`crate::free_list::FreeList`]).
/// 2. `bnum < 0 && !flags.contains(DIRTY)` never occurs: a block that has
///    never been written always carries `DIRTY`.
#[derive(Debug)]
pub struct Block {
    bnum: BlockNr,
    page_count: u32,
    data: Vec<u8>,
    flags: BlockFlags,
}

impl Block {
    /// Allocate a fresh, zeroed block of `page_count` pages of `page_size`
    /// bytes each, with `bnum` as its initial identity and the given flags.
    ///
    /// The data region is zeroed so a reused page never leaks a previous
    /// buffer's contents into a newly-created block.
    pub(crate) fn new(bnum: BlockNr, page_count: u32, page_size: u32, flags: BlockFlags) -> Self {
        debug_assert!(page_count >= 1);
        Self {
            bnum,
            page_count,
            data: vec![0u8; page_size as usize * page_count as usize],
            flags,
        }
    }

    /// Current block identity. Negative until assigned a file offset.
    pub fn bnum(&self) -> BlockNr {
        self.bnum
    }

    pub(crate) fn set_bnum(&mut self, bnum: BlockNr) {
        self.bnum = bnum;
    }

    /// Number of pages occupied by this block.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Current flags (`LOCKED`/`DIRTY`).
    pub fn flags(&self) -> BlockFlags {
        self.flags
    }

    pub(crate) fn insert_flags(&mut self, flags: BlockFlags) {
        self.flags.insert(flags);
    }

    pub(crate) fn remove_flags(&mut self, flags: BlockFlags) {
        self.flags.remove(flags);
    }

    /// The block's owned byte region: exactly `page_size * page_count`
    /// bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the block's byte region.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// True if the block is pinned in memory and may not be evicted.
    pub fn is_locked(&self) -> bool {
        self.flags.contains(BlockFlags::LOCKED)
    }

    /// True if the block's in-memory copy differs from (or has never been
    /// written to) the swap file.
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(BlockFlags::DIRTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_is_locked_and_dirty() {
        let b = Block::new(-1, 1, 4096, BlockFlags::LOCKED | BlockFlags::DIRTY);
        assert!(b.flags().contains(BlockFlags::LOCKED));
        assert!(b.flags().contains(BlockFlags::DIRTY));
        assert_eq!(b.data().len(), 4096);
        assert!(b.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn negative_dirty_invariant_holds_on_creation() {
        let b = Block::new(-5, 1, 512, BlockFlags::LOCKED | BlockFlags::DIRTY);
        assert!(b.bnum() < 0);
        assert!(b.flags().contains(BlockFlags::DIRTY));
    }
}
