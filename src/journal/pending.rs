//! Pending View
//!
//! Reads blocks as they will look once every journaled transaction has
//! been installed: committed block store contents overlaid with the
//! complete transactions still waiting in the journal.

use std::collections::HashMap;

use crate::error::Result;
use crate::storage::BlockStore;

use super::reader::TransactionScan;

/// Block store reader that sees journaled-but-uninstalled writes
pub struct PendingView<'a> {
    store: &'a mut BlockStore,
    /// Latest journaled contents per block (log order, last writer wins)
    overlay: HashMap<u32, Vec<u8>>,
}

impl<'a> PendingView<'a> {
    /// Overlay the complete transactions of `scan` on `store`
    pub fn new(store: &'a mut BlockStore, scan: &TransactionScan<'_>) -> Self {
        let mut overlay = HashMap::new();
        for tx in &scan.transactions {
            for (block, payload) in &tx.writes {
                overlay.insert(*block, payload.to_vec());
            }
        }
        Self { store, overlay }
    }

    /// A view with nothing pending
    pub fn committed(store: &'a mut BlockStore) -> Self {
        Self {
            store,
            overlay: HashMap::new(),
        }
    }

    /// Current contents of `index`, pending writes included
    pub fn read_block(&mut self, index: u32) -> Result<Vec<u8>> {
        match self.overlay.get(&index) {
            Some(data) => Ok(data.clone()),
            None => self.store.read_block(index),
        }
    }

    /// Whether `index` has a journaled write pending
    pub fn is_pending(&self, index: u32) -> bool {
        self.overlay.contains_key(&index)
    }

    /// Number of distinct blocks with pending writes
    pub fn pending_blocks(&self) -> usize {
        self.overlay.len()
    }
}
