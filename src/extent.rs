//! Logical to physical block mapping through a fork's inline extent record.
//!
//! Only the eight descriptors stored in the catalog record are consulted.
//! Files fragmented beyond that live partly in the extents overflow B-tree,
//! which this driver does not read: such blocks are reported as
//! [`Error::Unsupported`].

use crate::ExtentRecord;
use crate::error::{Error, Result};

/// A run of physical blocks backing a run of logical blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub log_start: u32,
    pub phys_start: u32,
    pub log_count: u32,
}

/// Find the physical extent holding `logical_block`.
pub fn resolve(extents: &ExtentRecord, logical_block: u32) -> Result<Extent> {
    let mut offset = logical_block;

    for descriptor in extents {
        let count = descriptor.block_count;
        if count == 0 {
            return Err(Error::NotFound);
        }

        if offset < count {
            let phys_start = descriptor
                .start_block
                .checked_add(offset)
                .ok_or_else(|| Error::corrupted("extent runs past the last allocation block"))?;

            return Ok(Extent {
                log_start: logical_block,
                phys_start,
                log_count: count - offset,
            });
        }

        offset -= count;
    }

    log::warn!("logical block {logical_block} lies beyond the inline extent record");
    Err(Error::Unsupported("fork needs the extents overflow file"))
}
