//! Bounds-checked views over caller-owned byte buffers
//!
//! Image and container structures are never reinterpreted in place. A
//! [`ByteView`] carries the buffer and a validated window into it; every
//! read past the end of the window fails with [`Error::InvalidLength`].
//! All multi-byte fields are little-endian.

use crate::error::{Error, Result};

/// A validated window into a byte buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteView<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteView<'a> {
    /// View the whole buffer
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// View `len` bytes starting at `offset` of `bytes`
    pub fn at(bytes: &'a [u8], offset: usize, len: usize) -> Result<Self> {
        Self::new(bytes).sub(offset, len)
    }

    /// View everything from `offset` to the end of the buffer
    pub fn from_offset(bytes: &'a [u8], offset: usize) -> Result<Self> {
        bytes
            .get(offset..)
            .map(Self::new)
            .ok_or(Error::InvalidLength)
    }

    /// Length of the window in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the window is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The bytes covered by the window
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Narrow the window to `len` bytes at `offset`
    pub fn sub(&self, offset: usize, len: usize) -> Result<ByteView<'a>> {
        let end = offset.checked_add(len).ok_or(Error::InvalidLength)?;
        self.bytes
            .get(offset..end)
            .map(ByteView::new)
            .ok_or(Error::InvalidLength)
    }

    /// Borrow `N` bytes at `offset` as a fixed array
    pub fn array_at<const N: usize>(&self, offset: usize) -> Result<&'a [u8; N]> {
        let slice = self.sub(offset, N)?.bytes;
        slice.try_into().map_err(|_| Error::InvalidLength)
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        self.bytes.get(offset).copied().ok_or(Error::InvalidLength)
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        Ok(u16::from_le_bytes(*self.array_at::<2>(offset)?))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        Ok(u32::from_le_bytes(*self.array_at::<4>(offset)?))
    }

    pub fn i32_at(&self, offset: usize) -> Result<i32> {
        Ok(i32::from_le_bytes(*self.array_at::<4>(offset)?))
    }

    pub fn u64_at(&self, offset: usize) -> Result<u64> {
        Ok(u64::from_le_bytes(*self.array_at::<8>(offset)?))
    }

    /// Read the 32-bit word at word index `index`
    pub fn word(&self, index: usize) -> Result<u32> {
        let offset = index.checked_mul(4).ok_or(Error::InvalidLength)?;
        self.u32_at(offset)
    }

    /// Iterate over the whole 32-bit words in the window
    pub fn words(&self) -> impl Iterator<Item = u32> + 'a {
        self.bytes
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
    }
}

/// Text stored in a fixed-width field, cut at the first NUL
///
/// Fixed-width names are not guaranteed to be terminated; the whole field
/// is used in that case. Non UTF-8 content yields the longest valid prefix.
pub fn fixed_str(field: &[u8]) -> &str {
    let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let field = &field[..len];
    match core::str::from_utf8(field) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&field[..e.valid_up_to()]).unwrap_or(""),
    }
}
