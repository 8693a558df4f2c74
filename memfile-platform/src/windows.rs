//! Windows swap-file open, device-block-size probing, and positioned I/O.

#![cfg(windows)]

use std::fs::{File, OpenOptions};
use std::io;
use std::os::windows::fs::FileExt;
use std::path::Path;
use windows::Win32::Storage::FileSystem::GetDiskFreeSpaceW;

/// Open (optionally creating) the swap file at `path`.
///
/// Windows has no `O_NOFOLLOW`; a reparse point (symlink/junction) at
/// `path` is instead detected up front via `symlink_metadata`, matching the
/// refusal semantics of the Unix open path.
pub fn open_swapfile(path: &Path, create: bool) -> io::Result<File> {
    if let Ok(meta) = std::fs::symlink_metadata(path) {
        if create || meta.file_type().is_symlink() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "refusing to create swap file: path already exists",
            ));
        }
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(create)
        .open(path)
}

/// Probe the underlying volume's sectors-per-cluster * bytes-per-sector.
pub fn probe_block_size(_file: &File) -> io::Result<u64> {
    let mut sectors_per_cluster = 0u32;
    let mut bytes_per_sector = 0u32;
    let mut free_clusters = 0u32;
    let mut total_clusters = 0u32;
    unsafe {
        GetDiskFreeSpaceW(
            windows::core::PCWSTR::null(),
            Some(&mut sectors_per_cluster),
            Some(&mut bytes_per_sector),
            Some(&mut free_clusters),
            Some(&mut total_clusters),
        )
        .map_err(|e| io::Error::other(e.to_string()))?;
    }
    Ok((sectors_per_cluster * bytes_per_sector) as u64)
}

/// Read exactly `buf.len()` bytes starting at `offset`, retrying on
/// `ErrorKind::Interrupted`.
pub fn read_at(file: &File, offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
    let mut pos = offset;
    while !buf.is_empty() {
        match file.seek_read(buf, pos) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"));
            }
            Ok(n) => {
                pos += n as u64;
                buf = &mut buf[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Write exactly `buf.len()` bytes starting at `offset`, retrying on
/// `ErrorKind::Interrupted`.
pub fn write_at(file: &File, offset: u64, mut buf: &[u8]) -> io::Result<()> {
    let mut pos = offset;
    while !buf.is_empty() {
        match file.seek_write(buf, pos) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "short write"));
            }
            Ok(n) => {
                pos += n as u64;
                buf = &buf[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
