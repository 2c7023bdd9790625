//! Checked big-endian accessors over unvalidated on-disk bytes.
//!
//! Everything read from the volume is untrusted. These helpers never index
//! past the end of a slice; an out-of-range read yields `None` and the caller
//! decides whether that means corruption.

pub(crate) fn be_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn be_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Iterate the big-endian UTF-16 code units in `bytes`, converted to host order.
pub(crate) fn be_u16_units(bytes: &[u8]) -> impl Iterator<Item = u16> + '_ {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
}
