//! Engine Module
//!
//! The contract surface consumed by the command layer.
//!
//! ## Responsibilities
//! - Open the image and validate the superblock
//! - `create`: stage a new root directory entry as one journal transaction
//! - `install`: apply committed journal transactions to their home blocks
//! - Read-only inspection of the installed directory and the journal
//!
//! Every call runs to completion on a single thread; concurrent processes
//! against the same image must be serialized by the caller.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{Config, SyncStrategy};
use crate::error::{Result, VsfsError};
use crate::journal::{InstallReport, Installer, Journal, PendingView, ScanStop};
use crate::layout::{DirEntry, Inode, Layout, Superblock, ROOT_INODE};
use crate::mutator::{CreatedEntry, MetadataMutator};
use crate::storage::BlockStore;

/// Snapshot of the journal region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalStatus {
    /// Whether the header magic is recognized
    pub initialized: bool,
    /// Offset of the first free byte (0 if not initialized)
    pub bytes_used: usize,
    /// Size of the journal region
    pub capacity: usize,
    /// Complete transactions waiting to be installed
    pub pending_transactions: usize,
    /// Trailing data records with no commit
    pub discarded_records: usize,
    /// Why the record scan ended
    pub stop: ScanStop,
}

/// Journaled metadata engine over one image
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Backing image
    store: BlockStore,

    /// Superblock as read at open
    superblock: Superblock,

    /// Region map derived from the superblock
    layout: Layout,
}

impl Engine {
    /// Open an existing, formatted image
    ///
    /// On startup:
    /// 1. Open the image file
    /// 2. Read and validate the superblock
    /// 3. Check the image holds every block the superblock describes
    pub fn open(config: Config) -> Result<Self> {
        let mut store = BlockStore::open(&config.image_path)?;
        let superblock = store.read_superblock()?;
        let layout = superblock.layout()?;

        if store.block_count() < layout.total_blocks {
            return Err(VsfsError::InvalidSuperblock(format!(
                "image has {} blocks, superblock describes {}",
                store.block_count(),
                layout.total_blocks
            )));
        }

        tracing::debug!(
            "Opened {}: journal {}+{}, {} inodes, data {}+{}",
            store.path().display(),
            layout.journal_start,
            layout.journal_blocks,
            layout.inode_count,
            layout.data_start,
            layout.data_blocks
        );

        Ok(Self {
            config,
            store,
            superblock,
            layout,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified image
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().image_path(path).build())
    }

    /// Journal the creation of an empty file `name` in the root directory
    ///
    /// Steps:
    /// 1. Load the journal, initializing it on first use
    /// 2. Refuse a journal holding writes install could not apply, and drop
    ///    any torn or unrecognized tail after the last commit
    /// 3. Stage changes against committed + pending state
    /// 4. Append the transaction (all or nothing) and persist the journal
    ///
    /// Visible filesystem state is unchanged until `install` runs.
    pub fn create(&mut self, name: &str) -> Result<CreatedEntry> {
        self.create_at(name, now_secs())
    }

    /// `create` with an explicit timestamp for the new inode
    pub fn create_at(&mut self, name: &str, now: u32) -> Result<CreatedEntry> {
        // Step 1: Load the journal
        let mut journal = Journal::load(&mut self.store, &self.layout)?;
        journal.prepare(self.config.header_policy)?;

        // Step 2 + 3: Stage against committed + pending state
        let (created, tx, committed_end) = {
            let scan = journal.scan();
            // Never queue behind a transaction install would refuse
            scan.check_targets(&self.layout)?;
            if scan.committed_end < journal.bytes_used() {
                tracing::warn!(
                    "Dropping {} journal byte(s) after the last commit ({})",
                    journal.bytes_used() - scan.committed_end,
                    scan.stop
                );
            }
            let committed_end = scan.committed_end;
            let mut view = PendingView::new(&mut self.store, &scan);
            let mutator = MetadataMutator::new(self.layout);
            let (created, tx) = mutator.create_entry(&mut view, name, now)?;
            (created, tx, committed_end)
        };
        journal.truncate(committed_end);

        // Step 4: Append and persist
        let blocks = tx.len();
        tx.commit(&mut journal)?;
        journal.persist(&mut self.store)?;
        if self.config.sync_strategy == SyncStrategy::OnCommit {
            self.store.sync()?;
        }

        tracing::info!(
            "Journaled create of '{}' (inode {}, {} block(s)); run install to apply",
            created.name,
            created.inode,
            blocks
        );

        Ok(created)
    }

    /// Apply every committed journal transaction and empty the journal
    pub fn install(&mut self) -> Result<InstallReport> {
        Installer::new(self.layout, &self.config).install(&mut self.store)
    }

    /// Installed root directory entries as `(inode, name)`, in slot order
    ///
    /// Pending journal transactions are not included.
    pub fn entries(&mut self) -> Result<Vec<(u32, String)>> {
        let mut view = PendingView::committed(&mut self.store);
        let (root_block_idx, root_slot) = self.layout.inode_location(ROOT_INODE);
        let root = Inode::read_slot(&view.read_block(root_block_idx)?, root_slot)?;

        let dir_block_idx = root.direct[0];
        if !self.layout.is_data_block(dir_block_idx) {
            return Err(VsfsError::Corruption(format!(
                "root directory block {} outside data region",
                dir_block_idx
            )));
        }

        let dir_block = view.read_block(dir_block_idx)?;
        Ok(DirEntry::read_block(&dir_block)?
            .into_iter()
            .filter(|e| !e.is_free())
            .map(|e| (e.inode, e.name()))
            .collect())
    }

    /// Read an installed inode
    pub fn inode(&mut self, ino: u32) -> Result<Inode> {
        if ino >= self.layout.inode_count {
            return Err(VsfsError::Corruption(format!(
                "inode {} out of range (count {})",
                ino, self.layout.inode_count
            )));
        }
        let (block, slot) = self.layout.inode_location(ino);
        Inode::read_slot(&self.store.read_block(block)?, slot)
    }

    /// Inspect the journal without modifying it
    pub fn journal_status(&mut self) -> Result<JournalStatus> {
        let journal = Journal::load(&mut self.store, &self.layout)?;
        if !journal.is_initialized() {
            return Ok(JournalStatus {
                initialized: false,
                bytes_used: 0,
                capacity: journal.capacity(),
                pending_transactions: 0,
                discarded_records: 0,
                stop: ScanStop::End,
            });
        }
        journal.check_bounds()?;

        let scan = journal.scan();
        Ok(JournalStatus {
            initialized: true,
            bytes_used: journal.bytes_used(),
            capacity: journal.capacity(),
            pending_transactions: scan.transactions.len(),
            discarded_records: scan.discarded_records,
            stop: scan.stop,
        })
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Seconds since the Unix epoch, truncated to the on-disk width
fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
