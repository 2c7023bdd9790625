//! Read-only HFS+ volume driver.
//!
//! Mounts a volume from a [`BlockDevice`], walks the catalog B-tree to look up
//! and enumerate directory entries, maps logical file blocks to physical
//! blocks through the inline extent record, and resolves hard and symbolic
//! links. Nothing is ever written back to the device.

#![forbid(unsafe_code)]

pub mod btree;
pub mod catalog;
pub mod device;
pub mod dnode;
pub mod driver;
pub mod error;
pub mod extent;
pub mod fork;
pub mod link;
pub mod ondisk;
mod raw;
pub mod volume;

pub use btree::{BTreeFile, Node, SearchHit, TrialKey};
pub use catalog::{CatalogKey, CatalogRecord};
pub use device::{Block, BlockDevice, BlockDeviceExt, ImageDevice};
pub use dnode::{Dnode, DnodeKind, DnodeStat};
pub use driver::{VolumeDriver, VolumeStat};
pub use error::{Error, Result};
pub use extent::Extent;
pub use hfs_types_rs::CatalogNodeId;
pub use link::LinkKind;
pub use ondisk::*;
pub use volume::HfsPlusVolume;
