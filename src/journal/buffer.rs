//! Journal Buffer
//!
//! In-memory copy of the journal region. Each operation loads its own
//! `Journal`, mutates it, and persists it back; nothing is shared between
//! invocations.

use crate::config::JournalHeaderPolicy;
use crate::error::{Result, VsfsError};
use crate::layout::{Layout, BLOCK_SIZE};
use crate::storage::BlockStore;

use super::reader::{RecordReader, TransactionScan};
use super::record::{
    BlockWrite, JournalHeader, Record, COMMIT_RECORD_SIZE, DATA_RECORD_SIZE, JOURNAL_HEADER_SIZE,
    JOURNAL_MAGIC,
};

/// State of the journal header as loaded from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    /// Magic matches
    Valid,
    /// Region is all zeros (never used)
    Blank,
    /// Magic does not match and the region holds non-zero bytes
    Unrecognized,
}

/// The journal region: header followed by records
#[derive(Debug, Clone)]
pub struct Journal {
    /// Verbatim copy of the journal blocks
    buf: Vec<u8>,
    /// First block of the journal region
    start_block: u32,
}

impl Journal {
    /// Read the whole journal region verbatim
    pub fn load(store: &mut BlockStore, layout: &Layout) -> Result<Self> {
        let mut buf = Vec::with_capacity(layout.journal_capacity());
        for i in 0..layout.journal_blocks {
            buf.extend_from_slice(&store.read_block(layout.journal_start + i)?);
        }
        Ok(Self {
            buf,
            start_block: layout.journal_start,
        })
    }

    /// Wrap an existing buffer. Its length must be a whole number of blocks
    /// and large enough to hold the header.
    pub fn from_bytes(buf: Vec<u8>, start_block: u32) -> Result<Self> {
        if buf.len() % BLOCK_SIZE != 0 || buf.len() < BLOCK_SIZE {
            return Err(VsfsError::JournalCorruption(format!(
                "journal buffer of {} bytes is not a whole number of blocks",
                buf.len()
            )));
        }
        Ok(Self { buf, start_block })
    }

    /// Whether the header magic is recognized
    pub fn is_initialized(&self) -> bool {
        self.header().magic == JOURNAL_MAGIC
    }

    pub fn header_state(&self) -> HeaderState {
        if self.is_initialized() {
            HeaderState::Valid
        } else if self.buf.iter().all(|&b| b == 0) {
            HeaderState::Blank
        } else {
            HeaderState::Unrecognized
        }
    }

    /// Zero the buffer and write an empty header
    pub fn initialize(&mut self) {
        self.buf.fill(0);
        self.write_header(JournalHeader::empty());
    }

    /// Bring the loaded buffer into a usable state
    ///
    /// A valid header must have `bytes_used` within the region. A blank
    /// region is first use and gets initialized. An unrecognized header is
    /// reinitialized or rejected depending on `policy`.
    pub fn prepare(&mut self, policy: JournalHeaderPolicy) -> Result<HeaderState> {
        let state = self.header_state();
        match state {
            HeaderState::Valid => self.check_bounds()?,
            HeaderState::Blank => {
                tracing::debug!("Journal region is blank, initializing");
                self.initialize();
            }
            HeaderState::Unrecognized => match policy {
                JournalHeaderPolicy::Reinitialize => {
                    tracing::warn!(
                        "Journal header magic {:#010x} not recognized, reinitializing",
                        self.header().magic
                    );
                    self.initialize();
                }
                JournalHeaderPolicy::FailClosed => {
                    return Err(VsfsError::JournalCorruption(format!(
                        "unrecognized journal header magic {:#010x}",
                        self.header().magic
                    )));
                }
            },
        }
        Ok(state)
    }

    /// Check the `bytes_used <= capacity` invariant of a valid header
    pub fn check_bounds(&self) -> Result<()> {
        let used = self.header().bytes_used as usize;
        if used < JOURNAL_HEADER_SIZE || used > self.capacity() {
            return Err(VsfsError::JournalCorruption(format!(
                "bytes_used {} outside {}..={}",
                used,
                JOURNAL_HEADER_SIZE,
                self.capacity()
            )));
        }
        Ok(())
    }

    pub fn header(&self) -> JournalHeader {
        // The buffer always holds at least one block
        JournalHeader::decode(&self.buf).unwrap_or(JournalHeader {
            magic: 0,
            bytes_used: 0,
        })
    }

    pub fn bytes_used(&self) -> usize {
        self.header().bytes_used as usize
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes still available for records
    pub fn available(&self) -> usize {
        self.capacity().saturating_sub(self.bytes_used())
    }

    /// True when no records follow the header
    pub fn is_empty(&self) -> bool {
        self.bytes_used() <= JOURNAL_HEADER_SIZE
    }

    /// Space one transaction of `writes` block writes occupies
    pub fn transaction_size(writes: usize) -> usize {
        writes * DATA_RECORD_SIZE + COMMIT_RECORD_SIZE
    }

    /// Append one transaction: a data record per write, in order, then a
    /// commit record
    ///
    /// The whole transaction must fit or nothing is written: on
    /// `JournalFull` the buffer is left byte-for-byte unchanged. The header
    /// must already be valid (see [`Journal::prepare`]).
    pub fn append_transaction(&mut self, writes: &[BlockWrite]) -> Result<usize> {
        if !self.is_initialized() {
            return Err(VsfsError::JournalCorruption(format!(
                "cannot append to uninitialized journal (magic {:#010x})",
                self.header().magic
            )));
        }
        self.check_bounds()?;

        if let Some(bad) = writes.iter().find(|w| w.data.len() != BLOCK_SIZE) {
            return Err(VsfsError::Serialization(format!(
                "write to block {} carries {} bytes (expected {})",
                bad.block,
                bad.data.len(),
                BLOCK_SIZE
            )));
        }

        let needed = Self::transaction_size(writes.len());
        let available = self.available();
        if needed > available {
            return Err(VsfsError::JournalFull { needed, available });
        }

        let mut offset = self.bytes_used();
        for write in writes {
            offset = self.put_record(
                offset,
                &Record::Data {
                    target: write.block,
                    payload: &write.data,
                },
            );
        }
        offset = self.put_record(offset, &Record::Commit);

        self.write_header(JournalHeader {
            magic: JOURNAL_MAGIC,
            bytes_used: offset as u32,
        });

        tracing::debug!(
            "Appended transaction of {} block(s), journal now {}/{} bytes",
            writes.len(),
            offset,
            self.capacity()
        );

        Ok(needed)
    }

    /// Drop every record at or after `end`, zeroing the freed bytes
    pub fn truncate(&mut self, end: usize) {
        let used = self.bytes_used();
        if end >= used || end < JOURNAL_HEADER_SIZE {
            return;
        }
        self.buf[end..used].fill(0);
        self.write_header(JournalHeader {
            magic: JOURNAL_MAGIC,
            bytes_used: end as u32,
        });
    }

    /// Write the whole buffer back across the journal blocks, in order
    pub fn persist(&self, store: &mut BlockStore) -> Result<()> {
        for (i, block) in self.buf.chunks_exact(BLOCK_SIZE).enumerate() {
            store.write_block(self.start_block + i as u32, block)?;
        }
        Ok(())
    }

    /// Empty the journal on disk
    pub fn reset(&mut self, store: &mut BlockStore) -> Result<()> {
        self.initialize();
        self.persist(store)
    }

    /// Records between the header and `bytes_used`
    pub fn records(&self) -> RecordReader<'_> {
        RecordReader::new(self.log())
    }

    /// Group the records into complete transactions
    pub fn scan(&self) -> TransactionScan<'_> {
        TransactionScan::scan(self.log())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Bytes from the start of the buffer up to `bytes_used`
    fn log(&self) -> &[u8] {
        let end = self.bytes_used().min(self.capacity());
        &self.buf[..end]
    }

    fn write_header(&mut self, header: JournalHeader) {
        self.buf[..JOURNAL_HEADER_SIZE].copy_from_slice(&header.encode());
    }

    /// Encode `record` at `offset`; returns the offset after it
    fn put_record(&mut self, offset: usize, record: &Record<'_>) -> usize {
        let bytes = record.encode();
        let end = offset + bytes.len();
        self.buf[offset..end].copy_from_slice(&bytes);
        end
    }
}
