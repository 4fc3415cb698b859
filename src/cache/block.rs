//! The unit of caching.

use bytes::Bytes;

/// A contiguous run of source bytes starting at an aligned offset.
///
/// Blocks are immutable. Cloning a block is cheap and shares the
/// underlying buffer, so a block handed out by the cache can be read
/// by any number of callers without further synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    offset: u64,
    data: Bytes,
}

impl Block {
    /// Create a block holding `data` starting at `offset`.
    pub fn new(offset: u64, data: impl Into<Bytes>) -> Self {
        Self { offset, data: data.into() }
    }

    /// Offset of the first byte of this block in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The block payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Length of the payload in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the block carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Offset one past the last byte of this block, saturating at `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.data.len() as u64)
    }

    /// Copy the bytes starting at source position `pos` into `dst`.
    ///
    /// Returns the number of bytes copied, which is bounded by both the
    /// remaining payload and `dst.len()`. Positions outside the block copy
    /// nothing.
    pub fn copy_from(&self, pos: u64, dst: &mut [u8]) -> usize {
        if pos < self.offset || pos >= self.end() {
            return 0;
        }
        let start = (pos - self.offset) as usize;
        let n = dst.len().min(self.data.len() - start);
        dst[..n].copy_from_slice(&self.data[start..start + n]);
        n
    }
}
