//! Block index (component C).
//!
//! Maps a live [`BlockNr`] to its in-memory [`Block`]. Both positive and
//! negative numbers are valid keys. The original implementation (`mf_hash`
//! in `memfile.c`) is a `PMap(int64_t)`; Rust's ownership model lets the map
//! own the blocks directly rather than storing pointers into a separate
//! arena, so this is a plain `HashMap<BlockNr, Block>`.
use std::collections::HashMap;

use crate::block::{Block, BlockNr};

/// Mapping from block number to live block.
///
/// `get` performs the remove-and-reinsert "move to front" described in
/// spec §3.4. A `HashMap` has no meaningful front, so this is purely a
/// bookkeeping gesture faithful to the original's intent rather than a
/// mechanism with an observable effect on iteration order (see DESIGN.md
/// Open Questions — sync still walks in native map order).
#[derive(Debug, Default)]
pub(crate) struct BlockIndex {
    blocks: HashMap<BlockNr, Block>,
}

impl BlockIndex {
    pub(crate) fn new() -> Self {
        Self {
            blocks: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, block: Block) {
        self.blocks.insert(block.bnum(), block);
    }

    pub(crate) fn contains(&self, bnum: BlockNr) -> bool {
        self.blocks.contains_key(&bnum)
    }

    /// Reinsert the block under `bnum` to simulate the move-to-front hint
    /// from a `get` hit. Returns a mutable reference to the reinserted
    /// block.
    pub(crate) fn touch(&mut self, bnum: BlockNr) -> Option<&mut Block> {
        let block = self.blocks.remove(&bnum)?;
        self.blocks.insert(bnum, block);
        self.blocks.get_mut(&bnum)
    }

    pub(crate) fn get(&self, bnum: BlockNr) -> Option<&Block> {
        self.blocks.get(&bnum)
    }

    pub(crate) fn get_mut(&mut self, bnum: BlockNr) -> Option<&mut Block> {
        self.blocks.get_mut(&bnum)
    }

    pub(crate) fn remove(&mut self, bnum: BlockNr) -> Option<Block> {
        self.blocks.remove(&bnum)
    }

    /// Re-key a block that has just been assigned a new identity by
    /// `trans_add`. Panics if `old` is not present; the allocator only
    /// calls this right after confirming the block exists.
    pub(crate) fn rekey(&mut self, old: BlockNr, new: BlockNr) {
        let mut block = self
            .blocks
            .remove(&old)
            .expect("rekey called on absent block");
        block.set_bnum(new);
        self.blocks.insert(new, block);
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&BlockNr, &mut Block)> {
        self.blocks.iter_mut()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = BlockNr> + '_ {
        self.blocks.keys().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockFlags;

    #[test]
    fn touch_reinserts_under_same_key() {
        let mut idx = BlockIndex::new();
        idx.insert(Block::new(-1, 1, 512, BlockFlags::LOCKED | BlockFlags::DIRTY));
        assert!(idx.contains(-1));
        let b = idx.touch(-1).expect("block present");
        assert_eq!(b.bnum(), -1);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn rekey_moves_block_to_new_identity() {
        let mut idx = BlockIndex::new();
        idx.insert(Block::new(-1, 1, 512, BlockFlags::LOCKED | BlockFlags::DIRTY));
        idx.rekey(-1, 7);
        assert!(!idx.contains(-1));
        let b = idx.get_mut(7).expect("block present under new key");
        assert_eq!(b.bnum(), 7);
    }
}
