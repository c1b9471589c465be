//! Transaction Builder
//!
//! Stages the set of modified blocks for one logical operation and appends
//! them, followed by a commit marker, to the journal.

use crate::error::{Result, VsfsError};
use crate::layout::{Layout, BLOCK_SIZE};

use super::buffer::Journal;
use super::record::BlockWrite;

/// Ordered, de-duplicated set of block writes for one transaction
#[derive(Debug)]
pub struct TransactionBuilder {
    layout: Layout,
    /// Staged writes in the order they were first staged
    writes: Vec<BlockWrite>,
}

impl TransactionBuilder {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            writes: Vec::new(),
        }
    }

    /// Stage new contents for `block`
    ///
    /// Restaging a block replaces its contents but keeps its original
    /// position. The superblock, the journal region and blocks past the
    /// end of the image are refused.
    pub fn stage(&mut self, block: u32, data: Vec<u8>) -> Result<()> {
        if !self.layout.is_home_block(block) {
            return Err(VsfsError::Corruption(format!(
                "refusing to stage write to block {}",
                block
            )));
        }
        if data.len() != BLOCK_SIZE {
            return Err(VsfsError::Serialization(format!(
                "staged block {} has {} bytes (expected {})",
                block,
                data.len(),
                BLOCK_SIZE
            )));
        }

        match self.writes.iter_mut().find(|w| w.block == block) {
            Some(existing) => existing.data = data,
            None => self.writes.push(BlockWrite::new(block, data)),
        }
        Ok(())
    }

    /// Contents staged for `block`, if any
    pub fn staged(&self, block: u32) -> Option<&[u8]> {
        self.writes
            .iter()
            .find(|w| w.block == block)
            .map(|w| w.data.as_slice())
    }

    pub fn writes(&self) -> &[BlockWrite] {
        &self.writes
    }

    /// Staged block indices, in order
    pub fn blocks(&self) -> Vec<u32> {
        self.writes.iter().map(|w| w.block).collect()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Append the staged writes plus a commit record to `journal`
    ///
    /// Returns the number of journal bytes used. On `JournalFull` the
    /// journal is untouched.
    pub fn commit(self, journal: &mut Journal) -> Result<usize> {
        journal.append_transaction(&self.writes)
    }
}
