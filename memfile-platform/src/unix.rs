//! Unix swap-file open, device-block-size probing, and positioned I/O.
//!
//! Shared between Linux and macOS: neither needs raw block-device access
//! here (the swap file is a regular file on whatever filesystem the caller
//! chose), so there is nothing platform-specific enough to warrant separate
//! `linux.rs`/`macos.rs` modules the way a raw block-device driver would.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::Path;

/// Open (optionally creating) the swap file at `path`.
///
/// `O_NOFOLLOW` refuses to follow a symlink at the final path component.
/// When `create` is set we additionally pre-check with `symlink_metadata`:
/// if anything already exists at `path` — file, directory, or symlink — we
/// refuse rather than risk `O_CREAT` silently truncating through a symlink
/// an attacker placed there (`memfile.c`'s "symlink attack" check).
pub fn open_swapfile(path: &Path, create: bool) -> io::Result<File> {
    if create && std::fs::symlink_metadata(path).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "refusing to create swap file: path already exists",
        ));
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(create)
        .custom_flags(libc::O_NOFOLLOW | libc::O_CLOEXEC)
        .open(path)
}

/// Probe the underlying filesystem's preferred I/O block size.
pub fn probe_block_size(file: &File) -> io::Result<u64> {
    let stat = nix::sys::statvfs::fstatvfs(file).map_err(io::Error::from)?;
    Ok(stat.fragment_size().max(stat.block_size()))
}

/// Read exactly `buf.len()` bytes starting at `offset`, retrying on
/// `EINTR` (mirrors `read_eintr` in the original implementation).
pub fn read_at(file: &File, offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
    let mut pos = offset;
    while !buf.is_empty() {
        match file.read_at(buf, pos) {
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
/// `EINTR` (mirrors `write_eintr`).
pub fn write_at(file: &File, offset: u64, mut buf: &[u8]) -> io::Result<()> {
    let mut pos = offset;
    while !buf.is_empty() {
        match file.write_at(buf, pos) {
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
