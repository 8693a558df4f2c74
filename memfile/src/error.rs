//! Error taxonomy for the memfile subsystem.
//!
//! Mirrors the short list of failure modes the original C implementation
//! surfaces to its caller (`E293`..`E300` in `memfile.c`), minus the
//! user-facing message text, which is out of scope for this crate.

use std::fmt;

/// Errors returned by [`crate::MemFile`] operations.
///
/// Variant names follow the taxonomy from the subsystem's external
/// interface rather than wrapping a single opaque I/O error, so callers can
/// match on the failure class (e.g. retry on [`MemFileError::WriteError`],
/// but never on [`MemFileError::BlockNotLocked`], which indicates a caller
/// bug).
#[derive(Debug)]
#[non_exhaustive]
pub enum MemFileError {
    /// Closing the swap file's underlying descriptor failed.
    SwapClose(std::io::Error),
    /// A swap file was requested to be created but already existed (as a
    /// symlink or otherwise); refused as a possible symlink attack.
    SwapExists,
    /// Seeking the swap file before a read failed.
    SeekRead(std::io::Error),
    /// Reading from the swap file failed or returned a short read.
    ReadError(std::io::Error),
    /// Seeking the swap file before a write failed.
    SeekWrite(std::io::Error),
    /// Writing to the swap file failed or returned a short write.
    WriteError(std::io::Error),
    /// `put` was called on a block that is not currently locked.
    BlockNotLocked,
    /// No swap file is attached to this `MemFile`.
    NoSwapFile,
    /// Any other I/O failure not covered by a more specific variant above.
    Io(std::io::Error),
}

impl fmt::Display for MemFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SwapClose(e) => write!(f, "error closing swap file: {e}"),
            Self::SwapExists => write!(f, "swap file already exists (symlink attack?)"),
            Self::SeekRead(e) => write!(f, "seek error in swap file read: {e}"),
            Self::ReadError(e) => write!(f, "read error in swap file: {e}"),
            Self::SeekWrite(e) => write!(f, "seek error in swap file write: {e}"),
            Self::WriteError(e) => write!(f, "write error in swap file: {e}"),
            Self::BlockNotLocked => write!(f, "block was not locked"),
            Self::NoSwapFile => write!(f, "memfile has no swap file"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for MemFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SwapClose(e)
            | Self::SeekRead(e)
            | Self::ReadError(e)
            | Self::SeekWrite(e)
            | Self::WriteError(e)
            | Self::Io(e) => Some(e),
            Self::SwapExists | Self::BlockNotLocked | Self::NoSwapFile => None,
        }
    }
}

impl From<std::io::Error> for MemFileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MemFileError>;
