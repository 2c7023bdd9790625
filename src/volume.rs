//! A mounted HFS+ volume.

use crate::btree::{BTreeFile, SearchHit};
use crate::catalog::{self, CatalogKey, CatalogRecord, DiskCatalogKey};
use crate::device::{BlockDevice, BlockDeviceExt};
use crate::dnode::Dnode;
use crate::error::{Error, Result};
use crate::extent::{self, Extent};
use crate::link::{self, LinkKind, PATH_MAX};
use crate::{DnodeKind, VolumeHeader, fork};
use deku::DekuContainerRead;
use hfs_types_rs::{
    LEGACY_BLOCK_SIZE, SpecialFileCatalogNodeId, VOLUME_HEADER_BLOCK, VolumeSignature,
};

/// Volume state kept from mount until [`HfsPlusVolume::unmount`]. Everything
/// here is read-only after mount.
pub struct HfsPlusVolume<D> {
    device: D,
    header: Box<VolumeHeader>,
    catalog: BTreeFile,
    root: Dnode,
}

impl<D: BlockDevice> HfsPlusVolume<D> {
    /// Look for an HFS+ volume header on `device` and open the catalog.
    ///
    /// A volume that is not HFS+ is [`Error::Unsupported`], and no block
    /// beyond the header is read in that case.
    pub fn mount(mut device: D) -> Result<Self> {
        device.set_block_size(LEGACY_BLOCK_SIZE);

        let header = {
            let block = device.block(VOLUME_HEADER_BLOCK)?;
            let (_, header) = VolumeHeader::from_bytes((&block[..], 0))?;
            Box::new(header)
        };

        match VolumeSignature::try_from(header.signature) {
            Ok(VolumeSignature::HfsPlus) => {}
            Ok(VolumeSignature::HfsX) | Err(_) => {
                log::debug!("signature {:#06x} is not HFS+", header.signature);
                return Err(Error::Unsupported("not an HFS+ volume"));
            }
        }

        let block_size = header.block_size;
        if block_size < LEGACY_BLOCK_SIZE || !block_size.is_power_of_two() {
            return Err(Error::corrupted(format!("invalid allocation block size {block_size}")));
        }
        device.set_block_size(block_size);

        let catalog = BTreeFile::setup(
            &device,
            SpecialFileCatalogNodeId::CatalogFile.into(),
            &header.catalog_file,
        )?;

        log::debug!(
            "mounted HFS+ volume: {} blocks of {block_size} bytes, {} free",
            header.total_blocks,
            header.free_blocks
        );

        Ok(Self {
            device,
            header,
            catalog,
            root: Dnode::root(),
        })
    }

    /// Drop the volume state and give the device back.
    pub fn unmount(self) -> D {
        self.device
    }

    pub fn header(&self) -> &VolumeHeader {
        &self.header
    }

    pub fn root(&self) -> &Dnode {
        &self.root
    }

    pub fn catalog(&self) -> &BTreeFile {
        &self.catalog
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Find `name` among the children of `dir`.
    pub fn lookup(&self, dir: &Dnode, name: &[u16]) -> Result<Dnode> {
        let key = CatalogKey::new(dir.id, name.to_vec());
        if !key.is_representable() {
            return Err(Error::NotFound);
        }

        let hit = self.catalog.search(&self.device, &key, catalog::compare, 0)?;
        let dnode = Self::dnode_at(&hit)?;
        log::debug!(
            "lookup {}/{:?}: id {} ({:?})",
            dir.id,
            dnode.name_lossy(),
            dnode.id,
            dnode.kind
        );

        Ok(dnode)
    }

    /// Return the entry of `dir` at `*position` in catalog order and advance
    /// the position. [`Error::NotFound`] marks the end of the directory.
    ///
    /// Position 0 is the directory's own thread record, which comes back as
    /// a [`DnodeKind::Unknown`] entry.
    pub fn iterate(&self, dir: &Dnode, position: &mut u64) -> Result<Dnode> {
        let key = CatalogKey::first_child(dir.id);
        let hit = self.catalog.search(&self.device, &key, catalog::compare, *position)?;

        let trial = hit.trial_key()?;
        let parent_id = DiskCatalogKey::parse(&trial)?.parent_id;
        if parent_id != dir.id {
            log::trace!("iterate {}: end at position {position}", dir.id);
            return Err(Error::NotFound);
        }

        let dnode = Self::dnode_at(&hit)?;
        *position += 1;
        Ok(dnode)
    }

    fn dnode_at(hit: &SearchHit) -> Result<Dnode> {
        let trial = hit.trial_key()?;
        let key = DiskCatalogKey::parse(&trial)?;
        let record = CatalogRecord::parse(trial.data())?;
        if let CatalogRecord::Unknown(raw) = &record {
            log::debug!("catalog record type {raw} in node {}", hit.node().number());
        }

        Ok(Dnode::from_record(
            key.parent_id,
            key.name_units().collect(),
            &record,
        ))
    }

    /// Map a logical block of the dnode's data fork to a physical extent.
    pub fn extent(&self, dnode: &Dnode, logical_block: u32) -> Result<Extent> {
        extent::resolve(&dnode.extents, logical_block)
    }

    /// Read data fork bytes at `pos` into `buf`.
    pub fn read(&self, dnode: &Dnode, pos: u64, buf: &mut [u8]) -> Result<()> {
        if dnode.kind == DnodeKind::Directory {
            return Err(Error::Unsupported("directories have no data fork"));
        }
        fork::read_at(&self.device, &dnode.extents, dnode.size, pos, buf)
    }

    /// Target of a hard or symbolic link. Hard link targets contain NUL
    /// bytes and are only meaningful with their length.
    pub fn readlink(&self, dnode: &Dnode) -> Result<Vec<u8>> {
        match dnode.link_kind() {
            Some(LinkKind::Hard) => Ok(link::hardlink_target(dnode.inode_num)),
            Some(LinkKind::Symbolic) => {
                fork::read_to_vec(&self.device, &dnode.extents, dnode.size, PATH_MAX)
            }
            None => Err(Error::Unsupported("not a link")),
        }
    }

    /// Resolve a `/`-separated path from the root, one component at a time.
    pub fn lookup_path(&self, path: &str) -> Result<Dnode> {
        let mut dnode = self.root.clone();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            if !dnode.is_dir() {
                return Err(Error::NotFound);
            }
            let name: Vec<u16> = component.encode_utf16().collect();
            dnode = self.lookup(&dnode, &name)?;
        }
        Ok(dnode)
    }
}
