//! Superblock codec and validation

use serde::{Deserialize, Serialize};

use crate::error::{Result, VsfsError};

use super::{Layout, BITS_PER_BLOCK, BLOCK_SIZE, FS_MAGIC, INODES_PER_BLOCK, SUPERBLOCK_SIZE};

/// Encoded size of the superblock fields: nine u32 values
const FIELDS_SIZE: usize = 9 * 4;

/// Block 0 of the image. Written once by the formatter, read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superblock {
    pub magic: u32,
    pub block_size: u32,
    pub total_blocks: u32,
    pub inode_count: u32,

    pub journal_block: u32,
    pub inode_bitmap: u32,
    pub data_bitmap: u32,
    pub inode_start: u32,
    pub data_start: u32,
}

impl Superblock {
    /// Decode from the first bytes of block 0 (trailing padding is ignored)
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FIELDS_SIZE {
            return Err(VsfsError::InvalidSuperblock(format!(
                "expected at least {} bytes, got {}",
                FIELDS_SIZE,
                bytes.len()
            )));
        }
        Ok(bincode::deserialize(&bytes[..FIELDS_SIZE])?)
    }

    /// Encode into `SUPERBLOCK_SIZE` bytes, zero padded
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = bincode::serialize(self)?;
        bytes.resize(SUPERBLOCK_SIZE, 0);
        Ok(bytes)
    }

    /// Validate the superblock and derive the region map
    pub fn layout(&self) -> Result<Layout> {
        if self.magic != FS_MAGIC {
            return Err(VsfsError::InvalidSuperblock(format!(
                "bad magic: expected {:#010x}, got {:#010x}",
                FS_MAGIC, self.magic
            )));
        }
        if self.block_size as usize != BLOCK_SIZE {
            return Err(VsfsError::InvalidSuperblock(format!(
                "unsupported block size {}",
                self.block_size
            )));
        }

        // Regions must appear in order: journal, inode bitmap, data bitmap,
        // inode table, data region
        let ordered = self.journal_block >= 1
            && self.journal_block < self.inode_bitmap
            && self.inode_bitmap < self.data_bitmap
            && self.data_bitmap < self.inode_start
            && self.inode_start < self.data_start
            && self.data_start <= self.total_blocks;
        if !ordered {
            return Err(VsfsError::InvalidSuperblock(format!(
                "regions out of order: journal={} inode_bitmap={} data_bitmap={} inode_start={} data_start={} total={}",
                self.journal_block,
                self.inode_bitmap,
                self.data_bitmap,
                self.inode_start,
                self.data_start,
                self.total_blocks
            )));
        }

        let inode_blocks = self.data_start - self.inode_start;
        let inode_capacity = (inode_blocks as usize * INODES_PER_BLOCK).min(BITS_PER_BLOCK);
        if self.inode_count == 0 || self.inode_count as usize > inode_capacity {
            return Err(VsfsError::InvalidSuperblock(format!(
                "inode count {} outside 1..={}",
                self.inode_count, inode_capacity
            )));
        }

        let data_blocks = self.total_blocks - self.data_start;
        if data_blocks as usize > BITS_PER_BLOCK {
            return Err(VsfsError::InvalidSuperblock(format!(
                "{} data blocks exceed one bitmap block",
                data_blocks
            )));
        }

        Ok(Layout {
            total_blocks: self.total_blocks,
            inode_count: self.inode_count,
            journal_start: self.journal_block,
            journal_blocks: self.inode_bitmap - self.journal_block,
            inode_bitmap: self.inode_bitmap,
            data_bitmap: self.data_bitmap,
            inode_start: self.inode_start,
            inode_blocks,
            data_start: self.data_start,
            data_blocks,
        })
    }
}
