//! On-disk structures, decoded with deku straight from the big-endian
//! volume bytes.
//!
//! The crate's one-argument `Result` alias is kept out of this module: the
//! `DekuRead` derive expands to a bare two-argument `Result`.

use deku::ctx::Endian;
use deku::prelude::*;
use hfs_types_rs::{CatalogNodeId, DateTime, EXTENT_DENSITY};

/// Extent information. Defined as `struct HfsPlusExtentDescriptor` in
/// TN1150 > Fork Data Structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DekuRead)]
#[deku(endian = "endian", ctx = "endian: Endian", ctx_default = "Endian::Big")]
pub struct ExtentDescriptor {
    pub start_block: u32,
    pub block_count: u32,
}

/// A fork's extent record is 8 Extent Descriptors. A zero `block_count`
/// terminates the in-use prefix.
pub type ExtentRecord = [ExtentDescriptor; EXTENT_DENSITY];

/// Resource and Data Fork contents. Defined as `struct HFSPlusForkData` in
/// TN1150 > Fork Data Structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
#[deku(endian = "endian", ctx = "endian: Endian", ctx_default = "Endian::Big")]
pub struct ForkData {
    pub logical_size: u64,
    pub clump_size: u32,
    pub total_blocks: u32,
    pub extents: ExtentRecord,
}

/// Volume Header, stored at 1024 bytes from start. Defined as
/// `struct HFSPlusVolumeHeader` in TN1150 > Volume Header.
#[derive(Debug, Clone, DekuRead)]
#[deku(endian = "big")]
pub struct VolumeHeader {
    pub signature: u16,
    pub version: u16,
    pub attributes: u32,
    pub last_mounted_version: u32,
    pub journal_info_block: u32,

    pub create_date: DateTime,
    pub modify_date: DateTime,
    pub backup_date: DateTime,
    pub checked_date: DateTime,

    pub file_count: u32,
    pub folder_count: u32,

    pub block_size: u32,
    pub total_blocks: u32,
    pub free_blocks: u32,

    pub next_allocation: u32,
    pub rsrc_clump_size: u32,
    pub data_clump_size: u32,
    pub next_catalog_id: CatalogNodeId,

    pub write_count: u32,
    pub encodings_bitmap: u64,

    pub finder_info: [u32; 8],

    pub allocation_file: ForkData,
    pub extents_file: ForkData,
    pub catalog_file: ForkData,
    pub attributes_file: ForkData,
    pub startup_file: ForkData,
}

impl VolumeHeader {
    pub const SIZE: usize = 512;
}

/// BTree Node Descriptor.
/// Defined as `struct BTNodeDescriptor` in TN1150 > Node Structure.
#[derive(Debug, Clone, Copy, DekuRead)]
#[deku(endian = "big")]
pub struct BTreeNodeDescriptor {
    pub forward_link: u32,
    pub backward_link: u32,
    pub kind: i8,
    pub height: u8,
    pub num_records: u16,
    pub reserved: u16,
}

impl BTreeNodeDescriptor {
    pub const SIZE: usize = 14;
}

/// BTree Header describing upcoming BTree Structure. Defined as
/// `struct BTHeaderRec` in TN1150 > Header Record.
#[derive(Debug, Clone, DekuRead)]
#[deku(endian = "big")]
pub struct BTreeHeaderRecord {
    pub tree_depth: u16,
    pub root_node: u32,
    pub leaf_records: u32,
    pub first_leaf_node: u32,
    pub last_leaf_node: u32,
    pub node_size: u16,
    pub max_key_length: u16,
    pub total_nodes: u32,
    pub free_nodes: u32,
    pub reserved_1: u16,
    pub clump_size: u32,
    pub btree_type: u8,
    pub key_compare_type: u8,
    pub attributes: u32,
    pub reserved_3: [u32; 16],
}

impl BTreeHeaderRecord {
    pub const SIZE: usize = 106;
}

/// File and Folder permissions. Defined as `struct HFSPlusBSDInfo` in
/// TN1150 > HFS Plus Permissions.
#[derive(Debug, Clone, Copy, DekuRead)]
#[deku(endian = "endian", ctx = "endian: Endian", ctx_default = "Endian::Big")]
pub struct BsdInfo {
    pub owner_id: u32,
    pub group_id: u32,
    pub admin_flags: u8,
    pub owner_flags: u8,
    pub file_mode: u16,
    /// Inode number for hard links, link count for indirect nodes, or raw
    /// device number, depending on the record.
    pub special: u32,
}

/// A location on screen, used to store window placement.
/// Defined in TN1150 > Finder Info.
#[derive(Debug, Clone, Copy, DekuRead)]
#[deku(endian = "endian", ctx = "endian: Endian", ctx_default = "Endian::Big")]
pub struct Point {
    pub v: i16,
    pub h: i16,
}

/// Rectangular region used for Directory windows.
#[derive(Debug, Clone, Copy, DekuRead)]
#[deku(endian = "endian", ctx = "endian: Endian", ctx_default = "Endian::Big")]
pub struct Rect {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

/// Presentation info for Finder. Defined as `struct FileInfo` in
/// TN1150 > Finder Info.
#[derive(Debug, Clone, Copy, DekuRead)]
#[deku(endian = "endian", ctx = "endian: Endian", ctx_default = "Endian::Big")]
pub struct FileInfo {
    pub file_type: u32,
    pub file_creator: u32,
    pub finder_flags: u16,
    pub location: Point,
    pub reserved: u16,
}

#[derive(Debug, Clone, Copy, DekuRead)]
#[deku(endian = "endian", ctx = "endian: Endian", ctx_default = "Endian::Big")]
pub struct ExtendedFileInfo {
    pub reserved_1: [i16; 4],
    pub extended_finder_flags: u16,
    pub reserved_2: i16,
    pub put_away_folder_id: i32,
}

#[derive(Debug, Clone, Copy, DekuRead)]
#[deku(endian = "endian", ctx = "endian: Endian", ctx_default = "Endian::Big")]
pub struct FolderInfo {
    pub window_bounds: Rect,
    pub finder_flags: u16,
    pub location: Point,
    pub reserved: u16,
}

#[derive(Debug, Clone, Copy, DekuRead)]
#[deku(endian = "endian", ctx = "endian: Endian", ctx_default = "Endian::Big")]
pub struct ExtendedFolderInfo {
    pub scroll_position: Point,
    pub reserved_1: i32,
    pub extended_finder_flags: u16,
    pub reserved_2: i16,
    pub put_away_folder_id: i32,
}

/// BTree leaf record for Folders. Defined as `struct HFSPlusCatalogFolder`
/// in TN1150 > Catalog Folder Records
#[derive(Debug, Clone, DekuRead)]
#[deku(endian = "big")]
pub struct CatalogFolder {
    pub record_type: u16,
    pub flags: u16,
    pub valence: u32,
    pub folder_id: CatalogNodeId,
    pub create_date: DateTime,
    pub content_mod_date: DateTime,
    pub attribute_mod_date: DateTime,
    pub access_date: DateTime,
    pub backup_date: DateTime,
    pub permissions: BsdInfo,
    pub user_info: FolderInfo,
    pub finder_info: ExtendedFolderInfo,
    pub text_encoding: u32,
    pub reserved: u32,
}

/// BTree leaf record for Files. Defined as `struct HFSPlusCatalogFile` in
/// TN1150 > Catalog File Records
#[derive(Debug, Clone, DekuRead)]
#[deku(endian = "big")]
pub struct CatalogFile {
    pub record_type: u16,
    pub flags: u16,
    pub reserved_1: u32,
    pub file_id: CatalogNodeId,
    pub create_date: DateTime,
    pub content_mod_date: DateTime,
    pub attribute_mod_date: DateTime,
    pub access_date: DateTime,
    pub backup_date: DateTime,
    pub permissions: BsdInfo,
    pub user_info: FileInfo,
    pub finder_info: ExtendedFileInfo,
    pub text_encoding: u32,
    pub reserved_2: u32,

    pub data_fork: ForkData,
    pub resource_fork: ForkData,
}

/// BTree link to CNID. Defined as `struct HFSPlusCatalogThread` in
/// TN1150 > Catalog Thread Records.
#[derive(Debug, Clone, DekuRead)]
#[deku(endian = "big")]
pub struct CatalogThread {
    pub record_type: u16,
    pub reserved: i16,
    pub parent_id: CatalogNodeId,
    pub name_length: u16,
    #[deku(count = "name_length")]
    pub node_name: Vec<u16>,
}
