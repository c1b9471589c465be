//! Directory entry codec
//!
//! Entries are packed contiguously in a directory block:
//! `[inode: u32][name: 28 bytes, NUL padded]`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VsfsError};

use super::{BLOCK_SIZE, DIRENTS_PER_BLOCK, DIRENT_SIZE, NAME_LEN};

/// One `(inode, name)` slot of a directory block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub inode: u32,
    pub name: [u8; NAME_LEN],
}

impl DirEntry {
    /// Build an entry, validating the name
    ///
    /// Names must be non-empty, shorter than `NAME_LEN` bytes so a NUL
    /// terminator always fits, and free of `/` and NUL.
    pub fn new(inode: u32, name: &str) -> Result<Self> {
        validate_name(name)?;
        let mut raw = [0u8; NAME_LEN];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self { inode, name: raw })
    }

    /// A slot is free iff its inode is 0 and its name is empty
    pub fn is_free(&self) -> bool {
        self.inode == 0 && self.name[0] == 0
    }

    /// Name bytes up to the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        &self.name[..end]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DIRENT_SIZE {
            return Err(VsfsError::Serialization(format!(
                "directory entry needs {} bytes, got {}",
                DIRENT_SIZE,
                bytes.len()
            )));
        }
        Ok(bincode::deserialize(&bytes[..DIRENT_SIZE])?)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode every slot of a directory block, free slots included
    pub fn read_block(block: &[u8]) -> Result<Vec<Self>> {
        if block.len() != BLOCK_SIZE {
            return Err(VsfsError::Serialization(format!(
                "directory block must be {} bytes, got {}",
                BLOCK_SIZE,
                block.len()
            )));
        }
        block
            .chunks_exact(DIRENT_SIZE)
            .take(DIRENTS_PER_BLOCK)
            .map(Self::decode)
            .collect()
    }

    /// Overwrite `slot` of a directory block with this entry
    pub fn write_slot(&self, block: &mut [u8], slot: usize) -> Result<()> {
        if block.len() != BLOCK_SIZE || slot >= DIRENTS_PER_BLOCK {
            return Err(VsfsError::Serialization(format!(
                "directory slot {} out of range",
                slot
            )));
        }
        let start = slot * DIRENT_SIZE;
        block[start..start + DIRENT_SIZE].copy_from_slice(&self.encode()?);
        Ok(())
    }
}

/// Check a name against the directory entry rules
pub fn validate_name(name: &str) -> Result<()> {
    if name.len() >= NAME_LEN {
        return Err(VsfsError::NameTooLong {
            len: name.len(),
            max: NAME_LEN - 1,
        });
    }
    if name.is_empty() || name.bytes().any(|b| b == 0 || b == b'/') {
        return Err(VsfsError::InvalidName(name.to_string()));
    }
    Ok(())
}
