//! Block Store
//!
//! Fixed-size block reads and writes over a single image file.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, VsfsError};
use crate::layout::{Superblock, BLOCK_SIZE};

/// File-backed array of `BLOCK_SIZE` blocks
pub struct BlockStore {
    /// Open image, read + write
    file: File,
    /// Image path, kept for diagnostics
    path: PathBuf,
    /// Number of whole blocks in the image
    block_count: u32,
}

impl BlockStore {
    /// Open an existing image for reading and writing
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        let block_count = u32::try_from(len / BLOCK_SIZE as u64).map_err(|_| {
            VsfsError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("image {} is too large", path.display()),
            ))
        })?;

        tracing::debug!("Opened image {} ({} blocks)", path.display(), block_count);

        Ok(Self {
            file,
            path: path.to_path_buf(),
            block_count,
        })
    }

    /// Read exactly one block
    pub fn read_block(&mut self, index: u32) -> Result<Vec<u8>> {
        self.seek_to(index)?;
        let mut block = vec![0u8; BLOCK_SIZE];
        self.file.read_exact(&mut block)?;
        Ok(block)
    }

    /// Write exactly one block at `index * BLOCK_SIZE`
    pub fn write_block(&mut self, index: u32, data: &[u8]) -> Result<()> {
        if data.len() != BLOCK_SIZE {
            return Err(VsfsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("block write of {} bytes (expected {})", data.len(), BLOCK_SIZE),
            )));
        }
        self.seek_to(index)?;
        // write_all fails with WriteZero on a short write
        self.file.write_all(data)?;
        Ok(())
    }

    /// Flush all written blocks to stable storage
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Read and decode the superblock from block 0
    pub fn read_superblock(&mut self) -> Result<Superblock> {
        let block = self.read_block(0)?;
        Superblock::decode(&block)
    }

    /// Number of whole blocks in the image
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Path of the backing image
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn seek_to(&mut self, index: u32) -> Result<()> {
        if index >= self.block_count {
            return Err(VsfsError::BlockOutOfRange {
                index,
                count: self.block_count,
            });
        }
        self.file
            .seek(SeekFrom::Start(index as u64 * BLOCK_SIZE as u64))?;
        Ok(())
    }
}
