//! Byte-addressed reads from a fork, block by block.

use crate::ExtentRecord;
use crate::device::{BlockDevice, BlockDeviceExt};
use crate::error::{Error, Result};
use crate::extent;

/// Fill `buf` with the fork's bytes starting at `pos`.
///
/// Reading past `logical_size` is a short read.
pub fn read_at<D: BlockDevice + ?Sized>(
    device: &D,
    extents: &ExtentRecord,
    logical_size: u64,
    pos: u64,
    buf: &mut [u8],
) -> Result<()> {
    let available = logical_size.saturating_sub(pos);
    if (buf.len() as u64) > available {
        return Err(Error::short_read(buf.len(), available as usize));
    }

    let block_size = u64::from(device.block_size());
    if block_size == 0 {
        return Err(Error::corrupted("zero block size"));
    }

    let mut done = 0usize;
    while done < buf.len() {
        let at = pos + done as u64;
        let logical_block = u32::try_from(at / block_size).map_err(|_| Error::NotFound)?;
        let mapped = extent::resolve(extents, logical_block)?;

        let block = device.block(u64::from(mapped.phys_start))?;
        let within = (at % block_size) as usize;
        let len = (block_size as usize - within).min(buf.len() - done);
        buf[done..done + len].copy_from_slice(&block[within..within + len]);

        done += len;
    }

    Ok(())
}

/// Read a whole fork of at most `limit` bytes.
pub fn read_to_vec<D: BlockDevice + ?Sized>(
    device: &D,
    extents: &ExtentRecord,
    logical_size: u64,
    limit: usize,
) -> Result<Vec<u8>> {
    let len = usize::try_from(logical_size)
        .ok()
        .filter(|&len| len <= limit)
        .ok_or_else(|| Error::corrupted(format!("fork of {logical_size} bytes exceeds {limit}")))?;

    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    buf.resize(len, 0);
    read_at(device, extents, logical_size, 0, &mut buf)?;

    Ok(buf)
}
