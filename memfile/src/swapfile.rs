//! Swap-file I/O (component F).
//!
//! Thin wrapper around [`memfile_platform`] adding the page-offset
//! arithmetic, gap-filling policy (§4.F.3) and write-error throttling
//! (§4.F.4) the allocator and sync engine need. Positioned reads/writes and
//! `EINTR` retry live in `memfile-platform`; this module owns nothing
//! platform-specific.
use std::fs::File;
use std::path::Path;

use log::warn;

use crate::block::BlockNr;
use crate::error::{MemFileError, Result};

/// An open swap file plus the bookkeeping needed to honor the gap-filling
/// and error-throttling rules.
#[derive(Debug)]
pub(crate) struct SwapFile {
    file: File,
    /// Set once a write fails; cleared on the next successful write.
    /// Suppresses repeated user-visible error reporting (§4.F.4).
    write_error_reported: bool,
}

impl SwapFile {
    pub(crate) fn open(path: &Path, create: bool) -> Result<Self> {
        let file = memfile_platform::open_swapfile(path, create).map_err(|e| {
            if create && e.kind() == std::io::ErrorKind::AlreadyExists {
                MemFileError::SwapExists
            } else {
                MemFileError::Io(e)
            }
        })?;
        Ok(Self {
            file,
            write_error_reported: false,
        })
    }

    pub(crate) fn probe_page_size(&self) -> Option<u32> {
        memfile_platform::probe_block_size(&self.file)
            .ok()
            .and_then(|sz| u32::try_from(sz).ok())
    }

    pub(crate) fn len_bytes(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Read `page_count` pages starting at page `bnum` into `buf`.
    ///
    /// `buf` must be exactly `page_size * page_count` bytes. Any failure
    /// (seek or short read) is reported without mutating `buf`'s caller-
    /// visible state beyond what the OS already wrote into it; the caller
    /// discards the block on error (spec §4.F.2).
    pub(crate) fn read_block(&self, bnum: BlockNr, page_size: u32, buf: &mut [u8]) -> Result<()> {
        let offset = page_offset(bnum, page_size);
        memfile_platform::read_at(&self.file, offset, buf).map_err(MemFileError::ReadError)
    }

    /// Write `data` (exactly `page_size * page_count` bytes) at page
    /// `bnum`. Clears the throttle flag on success; sets it (and emits a
    /// throttled `warn!`) on failure.
    pub(crate) fn write_block(&mut self, bnum: BlockNr, page_size: u32, data: &[u8]) -> Result<()> {
        let offset = page_offset(bnum, page_size);
        match memfile_platform::write_at(&self.file, offset, data) {
            Ok(()) => {
                self.write_error_reported = false;
                Ok(())
            }
            Err(e) => {
                if !self.write_error_reported {
                    warn!("memfile: write to swap file failed: {e}");
                    self.write_error_reported = true;
                }
                Err(MemFileError::WriteError(e))
            }
        }
    }

    pub(crate) fn sync_all(&self) -> Result<()> {
        self.file.sync_all().map_err(MemFileError::Io)
    }
}

fn page_offset(bnum: BlockNr, page_size: u32) -> u64 {
    debug_assert!(bnum >= 0);
    bnum as u64 * u64::from(page_size)
}
