//! Inode codec
//!
//! Inodes are 128-byte slots packed into inode-table blocks:
//! ```text
//! ┌──────────┬───────────┬──────────┬──────────────────┬───────────┬───────────┬─────────┐
//! │ Type (2) │ Links (2) │ Size (4) │ Direct (8 x 4)   │ Ctime (4) │ Mtime (4) │ Padding │
//! └──────────┴───────────┴──────────┴──────────────────┴───────────┴───────────┴─────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, VsfsError};

use super::{BLOCK_SIZE, DIRECT_POINTERS, INODES_PER_BLOCK, INODE_SIZE};

/// Encoded size of the inode fields (the rest of the slot is padding)
const FIELDS_SIZE: usize = 2 + 2 + 4 + DIRECT_POINTERS * 4 + 4 + 4;

/// Inode type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum InodeType {
    Free = 0,
    File = 1,
    Dir = 2,
}

impl InodeType {
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(InodeType::Free),
            1 => Some(InodeType::File),
            2 => Some(InodeType::Dir),
            _ => None,
        }
    }
}

/// A fixed-size file or directory metadata record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    /// Raw type tag, see [`InodeType`]
    pub kind: u16,
    pub links: u16,
    pub size: u32,
    /// Direct block pointers; unused pointers are zero
    pub direct: [u32; DIRECT_POINTERS],
    pub ctime: u32,
    pub mtime: u32,
}

impl Inode {
    /// A freshly created, empty regular file
    pub fn new_file(now: u32) -> Self {
        Self {
            kind: InodeType::File as u16,
            links: 1,
            size: 0,
            direct: [0; DIRECT_POINTERS],
            ctime: now,
            mtime: now,
        }
    }

    pub fn inode_type(&self) -> Option<InodeType> {
        InodeType::from_tag(self.kind)
    }

    /// Decode from an `INODE_SIZE` slot (padding is ignored)
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FIELDS_SIZE {
            return Err(VsfsError::Serialization(format!(
                "inode needs {} bytes, got {}",
                FIELDS_SIZE,
                bytes.len()
            )));
        }
        Ok(bincode::deserialize(&bytes[..FIELDS_SIZE])?)
    }

    /// Encode into `INODE_SIZE` bytes, zero padded
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = bincode::serialize(self)?;
        bytes.resize(INODE_SIZE, 0);
        Ok(bytes)
    }

    /// Read the inode in `slot` of an inode-table block
    pub fn read_slot(block: &[u8], slot: usize) -> Result<Self> {
        let start = slot_offset(block, slot)?;
        Self::decode(&block[start..start + INODE_SIZE])
    }

    /// Overwrite `slot` of an inode-table block with this inode
    pub fn write_slot(&self, block: &mut [u8], slot: usize) -> Result<()> {
        let start = slot_offset(block, slot)?;
        block[start..start + INODE_SIZE].copy_from_slice(&self.encode()?);
        Ok(())
    }
}

fn slot_offset(block: &[u8], slot: usize) -> Result<usize> {
    if block.len() != BLOCK_SIZE || slot >= INODES_PER_BLOCK {
        return Err(VsfsError::Serialization(format!(
            "inode slot {} out of range for a {}-byte block",
            slot,
            block.len()
        )));
    }
    Ok(slot * INODE_SIZE)
}
