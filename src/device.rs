//! Block-level access to the underlying volume.
//!
//! The driver only ever asks for whole blocks by number. Blocks are released
//! when the [`Block`] guard goes out of scope, including on error paths.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Deref;

/// Source of fixed-size blocks. Logical and physical block sizes are always
/// the same for this driver.
pub trait BlockDevice {
    /// Switch the size of the blocks returned by [`BlockDevice::get`].
    fn set_block_size(&mut self, block_size: u32);

    fn block_size(&self) -> u32;

    /// Fetch one block. The returned buffer is exactly `block_size` bytes.
    fn get(&self, block: u64) -> io::Result<Vec<u8>>;

    /// Hand a block back once the driver is done with it.
    fn release(&self, _block: u64, _buf: Vec<u8>) {}
}

/// A block borrowed from a device, released on drop.
pub struct Block<'d, D: BlockDevice + ?Sized> {
    device: &'d D,
    number: u64,
    data: Option<Vec<u8>>,
}

impl<D: BlockDevice + ?Sized> Block<'_, D> {
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl<D: BlockDevice + ?Sized> Deref for Block<'_, D> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }
}

impl<D: BlockDevice + ?Sized> Drop for Block<'_, D> {
    fn drop(&mut self) {
        if let Some(buf) = self.data.take() {
            self.device.release(self.number, buf);
        }
    }
}

pub trait BlockDeviceExt: BlockDevice {
    /// Fetch a block and check that the device returned a full block.
    fn block(&self, number: u64) -> Result<Block<'_, Self>> {
        let data = self.get(number)?;
        let block = Block {
            device: self,
            number,
            data: Some(data),
        };

        let expected = self.block_size() as usize;
        if block.len() < expected {
            return Err(Error::short_read(expected, block.len()));
        }

        Ok(block)
    }
}

impl<T: BlockDevice + ?Sized> BlockDeviceExt for T {}

/// Block device over a seekable byte stream, such as a disk image file.
pub struct ImageDevice<R> {
    inner: RefCell<R>,
    block_size: u32,
}

impl<R: Read + Seek> ImageDevice<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: RefCell::new(inner),
            block_size: hfs_types_rs::LEGACY_BLOCK_SIZE,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read + Seek> BlockDevice for ImageDevice<R> {
    fn set_block_size(&mut self, block_size: u32) {
        self.block_size = block_size;
    }

    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn get(&self, block: u64) -> io::Result<Vec<u8>> {
        let offset = block
            .checked_mul(u64::from(self.block_size))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "block offset overflow"))?;

        let mut buf = vec![0u8; self.block_size as usize];
        let mut inner = self.inner.borrow_mut();
        inner.seek(SeekFrom::Start(offset))?;
        inner.read_exact(&mut buf)?;

        Ok(buf)
    }
}
