//! Metadata Mutator
//!
//! Computes the copy-on-write block changes for filesystem operations.
//! Reads go through a [`PendingView`] so decisions account for every
//! transaction already waiting in the journal.

use crate::error::{Result, VsfsError};
use crate::journal::{PendingView, TransactionBuilder};
use crate::layout::{validate_name, DirEntry, Inode, Layout, DIRENT_SIZE, ROOT_INODE};
use crate::storage::Bitmap;

/// Outcome of a staged `create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEntry {
    /// Name of the new entry
    pub name: String,
    /// Inode allocated for it
    pub inode: u32,
    /// Root directory slot it occupies
    pub slot: usize,
}

/// Builds transactions for metadata operations on the root directory
pub struct MetadataMutator {
    layout: Layout,
}

impl MetadataMutator {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Stage the creation of an empty file named `name` in the root directory
    ///
    /// Checks, in order: name validity, duplicate name, free inode, free
    /// directory slot. Nothing is staged unless all pass.
    ///
    /// Stages, in order: the inode bitmap, the inode-table block holding the
    /// root inode (size and mtime updated), the inode-table block holding the
    /// new inode if different, and the root directory block.
    pub fn create_entry(
        &self,
        view: &mut PendingView<'_>,
        name: &str,
        now: u32,
    ) -> Result<(CreatedEntry, TransactionBuilder)> {
        validate_name(name)?;

        // Current state: committed blocks plus pending journal writes
        let mut bitmap = Bitmap::from_block(view.read_block(self.layout.inode_bitmap)?);
        if !bitmap.test(ROOT_INODE) {
            return Err(VsfsError::Corruption("root inode is not allocated".to_string()));
        }

        let (root_block_idx, root_slot) = self.layout.inode_location(ROOT_INODE);
        let mut root_block = view.read_block(root_block_idx)?;
        let mut root = Inode::read_slot(&root_block, root_slot)?;

        let dir_block_idx = root.direct[0];
        if !self.layout.is_data_block(dir_block_idx) {
            return Err(VsfsError::Corruption(format!(
                "root directory block {} outside data region",
                dir_block_idx
            )));
        }
        let mut dir_block = view.read_block(dir_block_idx)?;
        let entries = DirEntry::read_block(&dir_block)?;

        if entries
            .iter()
            .any(|e| !e.is_free() && e.name_bytes() == name.as_bytes())
        {
            return Err(VsfsError::AlreadyExists(name.to_string()));
        }

        let inode = bitmap
            .find_free(self.layout.inode_count)
            .ok_or(VsfsError::NoFreeInodes)?;

        let slot = entries
            .iter()
            .position(DirEntry::is_free)
            .ok_or(VsfsError::DirectoryFull)?;

        // Copy-on-write versions of exactly the changed blocks
        let mut tx = TransactionBuilder::new(self.layout);

        bitmap.set(inode);
        tx.stage(self.layout.inode_bitmap, bitmap.into_block())?;

        root.size = root.size.checked_add(DIRENT_SIZE as u32).ok_or_else(|| {
            VsfsError::Corruption(format!("root directory size {} overflows", root.size))
        })?;
        root.mtime = now;
        root.write_slot(&mut root_block, root_slot)?;

        let (inode_block_idx, inode_slot) = self.layout.inode_location(inode);
        let new_inode = Inode::new_file(now);
        if inode_block_idx == root_block_idx {
            new_inode.write_slot(&mut root_block, inode_slot)?;
            tx.stage(root_block_idx, root_block)?;
        } else {
            tx.stage(root_block_idx, root_block)?;
            let mut inode_block = view.read_block(inode_block_idx)?;
            new_inode.write_slot(&mut inode_block, inode_slot)?;
            tx.stage(inode_block_idx, inode_block)?;
        }

        DirEntry::new(inode, name)?.write_slot(&mut dir_block, slot)?;
        tx.stage(dir_block_idx, dir_block)?;

        tracing::debug!(
            "Staged create of {:?}: inode {}, slot {}, blocks {:?}",
            name,
            inode,
            slot,
            tx.blocks()
        );

        Ok((
            CreatedEntry {
                name: name.to_string(),
                inode,
                slot,
            },
            tx,
        ))
    }
}
