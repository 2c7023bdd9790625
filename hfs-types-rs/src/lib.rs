// SPDX-License-Identifier: MIT

//! Constants and identifiers from Apple's [TN1150 - HFS Plus Volume Format](https://developer.apple.com/library/archive/technotes/tn/tn1150.html),
//! adjusted to use Rust-friendly naming.
//!
//! Raw on-disk integers are converted with `TryFrom`, so unknown values surface
//! as an error carrying the offending value instead of being transmuted.

#![forbid(unsafe_code)]

/// Size of the blocks used to probe for the volume header, independent of the
/// allocation block size declared by the header itself.
pub const LEGACY_BLOCK_SIZE: u32 = 512;

/// Probe block holding the volume header (1024 bytes from the start of the volume).
pub const VOLUME_HEADER_BLOCK: u64 = 2;

/// Number of extent descriptors stored inline in a fork.
pub const EXTENT_DENSITY: usize = 8;

/// Longest name that fits in a `HFSUniStr255`.
pub const MAX_NAME_LENGTH: usize = 255;

/// Seconds between the HFS+ epoch (1904-01-01 GMT) and the POSIX epoch.
pub const HFS_TO_POSIX_EPOCH_OFFSET: u32 = 2_082_844_800;

/// Smallest and largest legal B-tree node sizes.
///
/// Described in TN1150 [Header Record](https://developer.apple.com/library/archive/technotes/tn/tn1150.html#HeaderRecord)
pub const MIN_NODE_SIZE: u16 = 512;
pub const MAX_NODE_SIZE: u16 = 32_768;

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeSignature {
    HfsPlus = u16::from_be_bytes(*b"H+"),
    HfsX = u16::from_be_bytes(*b"HX"),
}

impl TryFrom<u16> for VolumeSignature {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            v if v == Self::HfsPlus as u16 => Ok(Self::HfsPlus),
            v if v == Self::HfsX as u16 => Ok(Self::HfsX),
            other => Err(other),
        }
    }
}

/// Represents seconds since 01-01-1904 GMT.
///
/// Described in TN1150 [HFS Plus Dates](https://developer.apple.com/library/archive/technotes/tn/tn1150.html#HFSPlusDates).
pub type DateTime = u32;

/// Catalog Node ID
///
/// Described in TN1150 [Catalog File](https://developer.apple.com/library/archive/technotes/tn/tn1150.html#CatalogFile)
pub type CatalogNodeId = u32;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialFileCatalogNodeId {
    RootParent = 1,
    RootFolder = 2,
    ExtentsFile = 3,
    CatalogFile = 4,
    BadBlockFile = 5,
    AllocationFile = 6,
    StartupFile = 7,
    AttributesFile = 8,
    RepairCatalogFile = 14,
    BogusExtentFile = 15,
    FirstUserCatalogNode = 16,
}

impl From<SpecialFileCatalogNodeId> for CatalogNodeId {
    fn from(value: SpecialFileCatalogNodeId) -> Self {
        value as CatalogNodeId
    }
}

/// Described in TN1150 [B-Trees](https://developer.apple.com/library/archive/technotes/tn/tn1150.html#BTrees)
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BTreeNodeType {
    /// Data Record
    Leaf = -1,
    /// Pointer Record
    Index = 0,
    /// Header Record
    Header = 1,
    /// Map Record
    Map = 2,
}

impl TryFrom<i8> for BTreeNodeType {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Leaf),
            0 => Ok(Self::Index),
            1 => Ok(Self::Header),
            2 => Ok(Self::Map),
            other => Err(other),
        }
    }
}

/// Type of data contained in a catalog leaf record.
///
/// Described by TN1150 in [Catalog File Data](https://developer.apple.com/library/archive/technotes/tn/tn1150.html#CatalogFile)
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogRecordType {
    Folder = 0x0001,
    File = 0x0002,
    FolderThread = 0x0003,
    FileThread = 0x0004,
}

impl TryFrom<u16> for CatalogRecordType {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::Folder),
            0x0002 => Ok(Self::File),
            0x0003 => Ok(Self::FolderThread),
            0x0004 => Ok(Self::FileThread),
            other => Err(other),
        }
    }
}

pub type FourCharCode = u32;
pub type OsType = FourCharCode;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownFileTypeCode {
    /// File type code for Hardlink files
    ///
    /// Described by TN1150 in [Hard Links](https://developer.apple.com/library/archive/technotes/tn/tn1150.html#HardLinks)
    HardLink = u32::from_be_bytes(*b"hlnk"),

    /// File type code for Symlink files
    ///
    /// Described by TN1150 in [Symbolic Links](https://developer.apple.com/library/archive/technotes/tn/tn1150.html#Symlinks)
    SymbolicLink = u32::from_be_bytes(*b"slnk"),
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownFileCreatorCode {
    /// Creator code for Hardlink files
    HardLink = u32::from_be_bytes(*b"hfs+"),

    /// Creator code for Symlink files
    SymbolicLink = u32::from_be_bytes(*b"rhap"),
}

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsdInfoFileModeFlag {
    OwnerRead = 0o00_0400,
    OwnerWrite = 0o00_0200,
    OwnerExecute = 0o00_0100,
}

impl BsdInfoFileModeFlag {
    pub const fn bits(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_match_ascii_tags() {
        assert_eq!(VolumeSignature::try_from(0x482B), Ok(VolumeSignature::HfsPlus));
        assert_eq!(VolumeSignature::try_from(0x4858), Ok(VolumeSignature::HfsX));
        assert_eq!(VolumeSignature::try_from(0x4244), Err(0x4244));
    }

    #[test]
    fn node_kinds_round_trip_from_disk_values() {
        assert_eq!(BTreeNodeType::try_from(-1), Ok(BTreeNodeType::Leaf));
        assert_eq!(BTreeNodeType::try_from(2), Ok(BTreeNodeType::Map));
        assert_eq!(BTreeNodeType::try_from(3), Err(3));
    }

    #[test]
    fn link_codes() {
        assert_eq!(WellKnownFileTypeCode::HardLink as u32, 0x686C_6E6B);
        assert_eq!(WellKnownFileCreatorCode::SymbolicLink as u32, 0x7268_6170);
    }
}
