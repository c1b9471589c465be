//! On-disk Layout Module
//!
//! Fixed binary formats of the image and the region map derived from the
//! superblock.
//!
//! ## Image Format
//! ```text
//! ┌──────────┬───────────────┬────────┬────────┬─────────────┬──────────────┐
//! │ Block 0  │ Journal       │ Inode  │ Data   │ Inode table │ Data region  │
//! │ Super-   │ (N blocks)    │ bitmap │ bitmap │ (M blocks,  │ (K blocks)   │
//! │ block    │ Header+Records│ (1)    │ (1)    │ 32 inodes/  │              │
//! │          │               │        │        │ block)      │              │
//! └──────────┴───────────────┴────────┴────────┴─────────────┴──────────────┘
//! ```
//!
//! All multi-byte integers are little-endian.

mod dirent;
mod inode;
mod superblock;

pub use dirent::{validate_name, DirEntry};
pub use inode::{Inode, InodeType};
pub use superblock::Superblock;

// =============================================================================
// Shared Constants
// =============================================================================

/// Size of every block in the image
pub const BLOCK_SIZE: usize = 4096;

/// Magic number identifying a formatted image ("VSFS")
pub const FS_MAGIC: u32 = 0x5653_4653;

/// Bytes reserved for the superblock at the start of block 0
pub const SUPERBLOCK_SIZE: usize = 128;

/// Bytes occupied by one inode in the inode table
pub const INODE_SIZE: usize = 128;

/// Inodes packed into one inode-table block
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

/// Direct block pointers per inode
pub const DIRECT_POINTERS: usize = 8;

/// Fixed length of a directory entry name, including the NUL terminator
pub const NAME_LEN: usize = 28;

/// Bytes occupied by one directory entry: inode (4) + name (28)
pub const DIRENT_SIZE: usize = 4 + NAME_LEN;

/// Directory entries packed into one directory block
pub const DIRENTS_PER_BLOCK: usize = BLOCK_SIZE / DIRENT_SIZE;

/// Inode number of the root directory
pub const ROOT_INODE: u32 = 0;

/// Bits available in a single bitmap block
pub const BITS_PER_BLOCK: usize = BLOCK_SIZE * 8;

// =============================================================================
// Layout
// =============================================================================

/// Validated region map of an image, derived from its superblock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub total_blocks: u32,
    pub inode_count: u32,
    pub journal_start: u32,
    pub journal_blocks: u32,
    pub inode_bitmap: u32,
    pub data_bitmap: u32,
    pub inode_start: u32,
    pub inode_blocks: u32,
    pub data_start: u32,
    pub data_blocks: u32,
}

impl Layout {
    /// Size of the journal region in bytes
    pub fn journal_capacity(&self) -> usize {
        self.journal_blocks as usize * BLOCK_SIZE
    }

    /// Block index and slot within that block holding inode `ino`
    pub fn inode_location(&self, ino: u32) -> (u32, usize) {
        let per_block = INODES_PER_BLOCK as u32;
        (self.inode_start + ino / per_block, (ino % per_block) as usize)
    }

    /// Whether `block` lies inside the data region
    pub fn is_data_block(&self, block: u32) -> bool {
        block >= self.data_start && block < self.data_start + self.data_blocks
    }

    /// Whether `block` lies inside the journal region
    pub fn is_journal_block(&self, block: u32) -> bool {
        block >= self.journal_start && block < self.journal_start + self.journal_blocks
    }

    /// Whether a journaled write may target `block`: anything inside the
    /// image except the superblock and the journal itself
    pub fn is_home_block(&self, block: u32) -> bool {
        block != 0 && !self.is_journal_block(block) && block < self.total_blocks
    }
}
