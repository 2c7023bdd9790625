//! Error taxonomy shared by every driver entry point.
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | `Unsupported` | Not an HFS+ volume, or a feature this driver does not read (overflow extents). The caller may try another driver. |
//! | `NotFound` | The structure is valid but the entry is absent. Also the end-of-directory signal. |
//! | `VolumeCorrupted` | An on-disk invariant was violated. Traversal of that path stops. |
//! | `Io` | The block device failed or returned fewer bytes than requested. |
//! | `OutOfMemory` | A node or name buffer could not be allocated. |

use deku::DekuError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("not found")]
    NotFound,

    #[error("volume corrupted: {0}")]
    VolumeCorrupted(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("out of memory")]
    OutOfMemory,
}

impl Error {
    pub(crate) fn corrupted(detail: impl Into<String>) -> Self {
        Self::VolumeCorrupted(detail.into())
    }

    pub(crate) fn short_read(expected: usize, actual: usize) -> Self {
        Self::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short read: wanted {expected} bytes, got {actual}"),
        ))
    }

    /// True for the expected "absent entry" outcome, including end of directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<DekuError> for Error {
    fn from(err: DekuError) -> Self {
        Self::VolumeCorrupted(format!("undecodable on-disk structure: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
