//! The entry points a host filesystem core calls, one implementation per
//! on-disk format.

use crate::device::BlockDevice;
use crate::dnode::{Dnode, DnodeStat};
use crate::error::Result;
use crate::extent::Extent;
use crate::volume::HfsPlusVolume;

/// Capacity of a mounted volume in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeStat {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

pub trait VolumeDriver: Sized {
    type Device: BlockDevice;

    /// Short name of the filesystem handled.
    const NAME: &'static str;

    fn mount(device: Self::Device) -> Result<Self>;

    /// Release all volume state and hand the device back.
    fn free(self) -> Self::Device;

    fn stat(&self) -> Result<VolumeStat>;

    /// Complete a dnode's attributes. Drivers that fill dnodes eagerly
    /// have nothing left to do.
    fn dno_fill(&self, _dnode: &mut Dnode) -> Result<()> {
        Ok(())
    }

    fn dno_stat(&self, dnode: &Dnode) -> Result<DnodeStat>;

    fn get_extent(&self, dnode: &Dnode, logical_block: u32) -> Result<Extent>;

    fn dir_lookup(&self, dir: &Dnode, name: &[u16]) -> Result<Dnode>;

    /// Next entry of `dir`; `position` advances only on success.
    fn dir_iterate(&self, dir: &Dnode, position: &mut u64) -> Result<Dnode>;

    fn readlink(&self, dnode: &Dnode) -> Result<Vec<u8>>;
}

impl<D: BlockDevice> VolumeDriver for HfsPlusVolume<D> {
    type Device = D;

    const NAME: &'static str = "hfsplus";

    fn mount(device: D) -> Result<Self> {
        HfsPlusVolume::mount(device)
    }

    fn free(self) -> D {
        self.unmount()
    }

    fn stat(&self) -> Result<VolumeStat> {
        let header = self.header();
        let block_size = u64::from(header.block_size);
        Ok(VolumeStat {
            total_bytes: block_size * u64::from(header.total_blocks),
            free_bytes: block_size * u64::from(header.free_blocks),
        })
    }

    fn dno_stat(&self, dnode: &Dnode) -> Result<DnodeStat> {
        Ok(DnodeStat::from(dnode))
    }

    fn get_extent(&self, dnode: &Dnode, logical_block: u32) -> Result<Extent> {
        self.extent(dnode, logical_block)
    }

    fn dir_lookup(&self, dir: &Dnode, name: &[u16]) -> Result<Dnode> {
        self.lookup(dir, name)
    }

    fn dir_iterate(&self, dir: &Dnode, position: &mut u64) -> Result<Dnode> {
        self.iterate(dir, position)
    }

    fn readlink(&self, dnode: &Dnode) -> Result<Vec<u8>> {
        HfsPlusVolume::readlink(self, dnode)
    }
}
