//! Bitmap
//!
//! One bit per allocatable entity, 1 = allocated. Bit `i` lives in byte
//! `i / 8` at position `i % 8` (least significant bit first).

use crate::layout::BLOCK_SIZE;

/// Allocation bitmap backed by one block's worth of bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: Vec<u8>,
}

impl Bitmap {
    /// Wrap a bitmap block read from the store
    pub fn from_block(block: Vec<u8>) -> Self {
        Self { bits: block }
    }

    /// An all-free bitmap
    pub fn empty() -> Self {
        Self {
            bits: vec![0u8; BLOCK_SIZE],
        }
    }

    /// Whether bit `index` is set. Bits beyond the block read as unset.
    pub fn test(&self, index: u32) -> bool {
        let byte = (index / 8) as usize;
        match self.bits.get(byte) {
            Some(b) => (b >> (index % 8)) & 1 == 1,
            None => false,
        }
    }

    /// Set bit `index` (idempotent). Returns false if the index is
    /// outside the bitmap.
    pub fn set(&mut self, index: u32) -> bool {
        let byte = (index / 8) as usize;
        match self.bits.get_mut(byte) {
            Some(b) => {
                *b |= 1 << (index % 8);
                true
            }
            None => false,
        }
    }

    /// Lowest unset bit below `limit`
    pub fn find_free(&self, limit: u32) -> Option<u32> {
        (0..limit).find(|&i| !self.test(i))
    }

    /// Number of set bits below `limit`
    pub fn count_set(&self, limit: u32) -> u32 {
        (0..limit).filter(|&i| self.test(i)).count() as u32
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn into_block(self) -> Vec<u8> {
        self.bits
    }
}
