//! Translation table (component D).
//!
//! Records `old_negative_BlockNr -> new_positive_BlockNr` for blocks that
//! were created memory-only and later assigned a file offset. Consulted by
//! higher-level indirection structures through [`crate::MemFile::trans_del`]
//! (spec §4.G.6); entries are removed on first lookup, matching the
//! original's `mf_trans_del`.
use std::collections::HashMap;

use crate::block::BlockNr;

#[derive(Debug, Default)]
pub(crate) struct TransTable {
    map: HashMap<BlockNr, BlockNr>,
}

impl TransTable {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub(crate) fn add(&mut self, old: BlockNr, new: BlockNr) {
        debug_assert!(old < 0);
        debug_assert!(new >= 0);
        self.map.insert(old, new);
    }

    /// Remove and return the new number for `old`, if a translation is
    /// pending. Idempotent: once removed (or if `old` was never
    /// translated), subsequent calls return `None`.
    pub(crate) fn take(&mut self, old: BlockNr) -> Option<BlockNr> {
        self.map.remove(&old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_is_idempotent_after_first_hit() {
        let mut t = TransTable::new();
        t.add(-1, 5);
        assert_eq!(t.take(-1), Some(5));
        assert_eq!(t.take(-1), None);
    }

    #[test]
    fn take_on_never_translated_returns_none() {
        let mut t = TransTable::new();
        assert_eq!(t.take(-9), None);
    }
}
