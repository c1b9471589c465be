//! Journal Installer
//!
//! Applies committed journal transactions to their home blocks, then
//! empties the journal.

use crate::config::{Config, JournalHeaderPolicy, SyncStrategy};
use crate::error::{Result, VsfsError};
use crate::layout::Layout;
use crate::storage::BlockStore;

use super::buffer::{HeaderState, Journal};
use super::reader::ScanStop;

/// Result of an install run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Number of complete transactions applied
    pub transactions_applied: usize,

    /// Number of block writes issued to the data region
    pub blocks_written: usize,

    /// Data records without a commit that were dropped
    pub records_discarded: usize,

    /// Why the record scan ended
    pub stop: ScanStop,
}

impl InstallReport {
    fn nothing() -> Self {
        Self {
            transactions_applied: 0,
            blocks_written: 0,
            records_discarded: 0,
            stop: ScanStop::End,
        }
    }
}

/// Replays the journal into the block store
pub struct Installer {
    layout: Layout,
    sync_strategy: SyncStrategy,
    header_policy: JournalHeaderPolicy,
}

impl Installer {
    pub fn new(layout: Layout, config: &Config) -> Self {
        Self {
            layout,
            sync_strategy: config.sync_strategy,
            header_policy: config.header_policy,
        }
    }

    /// Install every committed transaction, in log order
    ///
    /// Steps:
    /// 1. Load the journal; an unrecognized header means nothing to install
    /// 2. Scan records; only commit-terminated transactions are applied, and
    ///    none at all if any of them targets a block outside the home area
    /// 3. Sync the data region (if configured)
    /// 4. Reset the journal and sync again
    ///
    /// Running it again on an empty journal applies nothing.
    pub fn install(&self, store: &mut BlockStore) -> Result<InstallReport> {
        let mut journal = Journal::load(store, &self.layout)?;

        match journal.header_state() {
            HeaderState::Valid => journal.check_bounds()?,
            HeaderState::Blank => {
                tracing::debug!("Journal not initialized, nothing to install");
                return Ok(InstallReport::nothing());
            }
            HeaderState::Unrecognized => {
                if self.header_policy == JournalHeaderPolicy::FailClosed {
                    return Err(VsfsError::JournalCorruption(format!(
                        "unrecognized journal header magic {:#010x}",
                        journal.header().magic
                    )));
                }
                tracing::warn!("Journal header not recognized, nothing to install");
                return Ok(InstallReport::nothing());
            }
        }

        let report = {
            let scan = journal.scan();

            if scan.stop != ScanStop::End {
                tracing::warn!("Journal scan stopped early: {}", scan.stop);
            }
            if scan.discarded_records > 0 {
                tracing::warn!(
                    "Discarding {} uncommitted data record(s)",
                    scan.discarded_records
                );
            }

            // Validate every target before the first home block is touched
            scan.check_targets(&self.layout)?;

            let mut blocks_written = 0;
            for (n, tx) in scan.transactions.iter().enumerate() {
                for (block, payload) in &tx.writes {
                    tracing::debug!("Transaction {}: writing block {}", n + 1, block);
                    store.write_block(*block, payload)?;
                    blocks_written += 1;
                }
            }

            InstallReport {
                transactions_applied: scan.transactions.len(),
                blocks_written,
                records_discarded: scan.discarded_records,
                stop: scan.stop,
            }
        };

        // Home blocks must be durable before the journal that covers them
        // is erased
        self.sync(store)?;
        journal.reset(store)?;
        self.sync(store)?;

        tracing::info!(
            "Installed {} transaction(s), {} block(s); journal cleared",
            report.transactions_applied,
            report.blocks_written
        );

        Ok(report)
    }

    fn sync(&self, store: &mut BlockStore) -> Result<()> {
        if self.sync_strategy == SyncStrategy::OnCommit {
            store.sync()?;
        }
        Ok(())
    }
}
