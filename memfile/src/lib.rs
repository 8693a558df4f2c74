//! Paged memory-file (`MemFile`) subsystem.
//!
//! A user-space virtual-memory layer of uniform page-sized blocks backing
//! a text editor's buffer storage. Blocks live in RAM only (negative block
//! numbers) until assigned a fixed offset in a swap file (non-negative
//! block numbers) and written through. This crate implements the block
//! lifecycle (allocate, load, mark dirty, flush, evict, free), the
//! translation between the two numbering spaces, and the swap-file I/O
//! underneath — nothing above the block layer (line storage, undo,
//! recovery, rendering) is in scope.
//!
//! # Usage
//!
//! This crate is [on crates.io](https://crates.io/crates/memfile) and can
//! be used by adding `memfile` to the dependencies in your project's
//! `Cargo.toml`.
//!
//! ```toml
//! [dependencies]
//! memfile = "0.1"
//! ```
//!
//! ```rust,no_run
//! use memfile::{MemFile, OpenFlags, SyncFlags};
//!
//! let mf = MemFile::open(Some("buffer.swp".as_ref()), OpenFlags::CREATE_NEW)?;
//! let mut block = mf.new_block(false, 1);
//! block.data_mut().copy_from_slice(&[0u8; 4096]);
//! let bnum = block.bnum();
//! drop(block); // end the borrow before calling put()
//! mf.put(bnum, true, false)?;
//! mf.sync(SyncFlags::ALL)?;
//! # Ok::<(), memfile::MemFileError>(())
//! ```
//!
//! # Concurrency
//!
//! `MemFile` is `!Send`/`!Sync` by construction: the subsystem is
//! single-threaded cooperative, mirroring the editor main loop that is its
//! sole mutator. There is no async interface; the only suspension points
//! are file I/O and the in-loop interrupt check inside [`MemFile::sync`].

#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod block;
mod error;
mod free_list;
mod index;
mod memfile;
mod registry;
mod swapfile;
mod trans;

pub use block::{Block, BlockFlags, BlockNr};
pub use error::{MemFileError, Result};
pub use memfile::{
    BlockHandle, DirtyState, MemFile, OpenFlags, SyncFlags, MAX_SWAP_PAGE_SIZE,
    MIN_SWAP_PAGE_SIZE,
};
pub use registry::release_all;

#[cfg(test)]
mod integration_like_tests {
    use super::*;

    #[test]
    fn release_all_evicts_unlocked_clean_blocks() {
        let dir = std::env::temp_dir().join(format!("memfile-release-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path_a = dir.join("a.swp");
        let path_b = dir.join("b.swp");
        let _ = std::fs::remove_file(&path_a);
        let _ = std::fs::remove_file(&path_b);

        let mf_a = MemFile::open(Some(&path_a), OpenFlags::CREATE_NEW).unwrap();
        let mf_b = MemFile::open(Some(&path_b), OpenFlags::CREATE_NEW).unwrap();

        for mf in [&mf_a, &mf_b] {
            for _ in 0..3 {
                let bnum = mf.new_block(false, 1).bnum();
                mf.put(bnum, true, false).unwrap();
            }
        }

        assert_eq!(mf_a.block_count(), 3);
        assert_eq!(mf_b.block_count(), 3);

        let released = release_all();
        assert!(released);
        assert_eq!(mf_a.block_count(), 0);
        assert_eq!(mf_b.block_count(), 0);

        let _ = std::fs::remove_file(&path_a);
        let _ = std::fs::remove_file(&path_b);
    }
}
