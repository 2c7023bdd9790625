//! Hard and symbolic link detection and hard link target synthesis.
//!
//! Both kinds are ordinary catalog file records told apart by their Finder
//! type and creator codes. Described by TN1150 in
//! [Hard Links](https://developer.apple.com/library/archive/technotes/tn/tn1150.html#HardLinks)
//! and [Symbolic Links](https://developer.apple.com/library/archive/technotes/tn/tn1150.html#Symlinks).

use hfs_types_rs::{OsType, WellKnownFileCreatorCode, WellKnownFileTypeCode};

/// Where every hard link's inode lives. The four leading NULs are part of the
/// directory name, so the target must be handled by length, never as a C string.
pub const HARDLINK_PREFIX: &[u8; 28] = b"/\0\0\0\0HFS+ Private Data/iNode";

/// Longest symbolic link target accepted.
pub const PATH_MAX: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Hard,
    Symbolic,
}

impl LinkKind {
    pub fn detect(file_type: OsType, file_creator: OsType) -> Option<Self> {
        match (file_type, file_creator) {
            (t, c)
                if t == WellKnownFileTypeCode::HardLink as u32
                    && c == WellKnownFileCreatorCode::HardLink as u32 =>
            {
                Some(Self::Hard)
            }
            (t, c)
                if t == WellKnownFileTypeCode::SymbolicLink as u32
                    && c == WellKnownFileCreatorCode::SymbolicLink as u32 =>
            {
                Some(Self::Symbolic)
            }
            _ => None,
        }
    }
}

/// Target path of a hard link to `inode_num`: the private data prefix
/// followed by the inode number in decimal ASCII.
pub fn hardlink_target(inode_num: u32) -> Vec<u8> {
    let digits = inode_num.to_string();
    let mut target = Vec::with_capacity(HARDLINK_PREFIX.len() + digits.len());
    target.extend_from_slice(HARDLINK_PREFIX);
    target.extend_from_slice(digits.as_bytes());
    target
}
