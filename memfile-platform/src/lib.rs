//! Platform-specific swap-file primitives for `memfile`.
//!
//! This crate is the thin OS layer `memfile` builds its swap-file I/O on:
//! symlink-safe open, device-block-size probing (for page-size
//! auto-tuning), and positioned, interruption-tolerant read/write. It
//! mirrors the original implementation's `os_open`/`os_fileinfo_blocksize`/
//! `read_eintr`/`write_eintr` helpers, one file per target family.

#![warn(missing_docs)]

use std::fs::File;
use std::io;
use std::path::Path;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

/// Open (optionally creating) the swap file at `path`, refusing to follow
/// or silently recreate through a symlink.
pub fn open_swapfile(path: &Path, create: bool) -> io::Result<File> {
    #[cfg(unix)]
    {
        unix::open_swapfile(path, create)
    }
    #[cfg(windows)]
    {
        windows::open_swapfile(path, create)
    }
}

/// Probe the device/filesystem's preferred I/O block size backing `file`.
pub fn probe_block_size(file: &File) -> io::Result<u64> {
    #[cfg(unix)]
    {
        unix::probe_block_size(file)
    }
    #[cfg(windows)]
    {
        windows::probe_block_size(file)
    }
}

/// Read exactly `buf.len()` bytes from `file` starting at `offset`.
pub fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> io::Result<()> {
    #[cfg(unix)]
    {
        unix::read_at(file, offset, buf)
    }
    #[cfg(windows)]
    {
        windows::read_at(file, offset, buf)
    }
}

/// Write exactly `buf.len()` bytes to `file` starting at `offset`.
pub fn write_at(file: &File, offset: u64, buf: &[u8]) -> io::Result<()> {
    #[cfg(unix)]
    {
        unix::write_at(file, offset, buf)
    }
    #[cfg(windows)]
    {
        windows::write_at(file, offset, buf)
    }
}
