//! Journal Reader
//!
//! Sequential record decoding and transaction grouping over a journal
//! buffer. Scanning never fails: a record that cannot be decoded ends the
//! scan and the reason is reported as a [`ScanStop`].

use std::fmt;

use crate::error::{Result, VsfsError};
use crate::layout::Layout;

use super::record::{
    Record, RecordHeader, RecordType, COMMIT_RECORD_SIZE, DATA_RECORD_SIZE, JOURNAL_HEADER_SIZE,
    RECORD_HEADER_SIZE,
};

/// Why a record scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// Reached `bytes_used` cleanly
    End,

    /// A record (or its header) extends past `bytes_used`
    TornRecord { offset: usize },

    /// A known record type with an impossible size field
    BadSize { offset: usize, size: u16 },

    /// A record type this version does not understand
    UnknownType { offset: usize, tag: u16 },
}

impl fmt::Display for ScanStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStop::End => write!(f, "end of log"),
            ScanStop::TornRecord { offset } => write!(f, "torn record at offset {}", offset),
            ScanStop::BadSize { offset, size } => {
                write!(f, "bad record size {} at offset {}", size, offset)
            }
            ScanStop::UnknownType { offset, tag } => {
                write!(f, "unknown record type {} at offset {}", tag, offset)
            }
        }
    }
}

/// Iterator over the records of a journal buffer
///
/// Yields `(offset, record)` pairs. After it returns `None`, [`stop`]
/// says why.
///
/// [`stop`]: RecordReader::stop
pub struct RecordReader<'a> {
    /// Journal bytes up to `bytes_used`
    log: &'a [u8],
    /// Offset of the next record
    offset: usize,
    /// Set once scanning has ended
    stop: Option<ScanStop>,
}

impl<'a> RecordReader<'a> {
    /// Read records from `log`, which must be cut at `bytes_used`
    pub fn new(log: &'a [u8]) -> Self {
        Self {
            log,
            offset: JOURNAL_HEADER_SIZE,
            stop: None,
        }
    }

    /// Offset just past the last record returned
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Why the scan ended, or None while records remain
    pub fn stop(&self) -> Option<ScanStop> {
        self.stop
    }

    fn halt(&mut self, reason: ScanStop) -> Option<(usize, Record<'a>)> {
        self.stop = Some(reason);
        None
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = (usize, Record<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.stop.is_some() {
            return None;
        }

        let offset = self.offset;
        if offset >= self.log.len() {
            return self.halt(ScanStop::End);
        }

        let header = match RecordHeader::decode(&self.log[offset..]) {
            Some(h) => h,
            None => return self.halt(ScanStop::TornRecord { offset }),
        };

        let record_type = match RecordType::from_tag(header.tag) {
            Some(t) => t,
            None => {
                return self.halt(ScanStop::UnknownType {
                    offset,
                    tag: header.tag,
                })
            }
        };

        let size = header.size as usize;
        let valid_size = match record_type {
            RecordType::Data => size == DATA_RECORD_SIZE,
            // Commit records may grow trailing fields in later versions
            RecordType::Commit => size >= COMMIT_RECORD_SIZE,
        };
        if !valid_size || size < RECORD_HEADER_SIZE {
            return self.halt(ScanStop::BadSize {
                offset,
                size: header.size,
            });
        }
        if offset + size > self.log.len() {
            return self.halt(ScanStop::TornRecord { offset });
        }

        let bytes = &self.log[offset..offset + size];
        let record = match record_type {
            RecordType::Data => Record::decode_data(bytes),
            RecordType::Commit => Record::Commit,
        };

        self.offset = offset + size;
        Some((offset, record))
    }
}

// =============================================================================
// Transaction Scan
// =============================================================================

/// A commit-terminated run of data records found in the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournaledTransaction<'a> {
    /// Offset of the first record of the transaction
    pub start: usize,
    /// Offset just past its commit record
    pub end: usize,
    /// Block writes in log order
    pub writes: Vec<(u32, &'a [u8])>,
}

/// Result of grouping a journal's records into transactions
#[derive(Debug, Clone)]
pub struct TransactionScan<'a> {
    /// Complete transactions, in log order
    pub transactions: Vec<JournaledTransaction<'a>>,

    /// Offset just past the last commit record (header size if none)
    pub committed_end: usize,

    /// Data records after the last commit that will never be applied
    pub discarded_records: usize,

    /// Why the scan ended
    pub stop: ScanStop,
}

impl<'a> TransactionScan<'a> {
    /// Group the records of `log` (cut at `bytes_used`) into transactions
    ///
    /// Data records accumulate until a commit record closes them into a
    /// transaction. Records left open when the scan ends are discarded.
    pub fn scan(log: &'a [u8]) -> Self {
        let mut reader = RecordReader::new(log);
        let mut transactions = Vec::new();
        let mut pending: Vec<(u32, &'a [u8])> = Vec::new();
        let mut start: Option<usize> = None;
        let mut committed_end = JOURNAL_HEADER_SIZE;

        while let Some((offset, record)) = reader.next() {
            let tx_start = *start.get_or_insert(offset);
            match record {
                Record::Data { target, payload } => pending.push((target, payload)),
                Record::Commit => {
                    committed_end = reader.offset();
                    transactions.push(JournaledTransaction {
                        start: tx_start,
                        end: committed_end,
                        writes: std::mem::take(&mut pending),
                    });
                    start = None;
                }
            }
        }

        Self {
            transactions,
            committed_end,
            discarded_records: pending.len(),
            stop: reader.stop().unwrap_or(ScanStop::End),
        }
    }

    /// Total block writes across all complete transactions
    pub fn block_count(&self) -> usize {
        self.transactions.iter().map(|t| t.writes.len()).sum()
    }

    /// Refuse the log if any committed write would land on the superblock,
    /// inside the journal, or past the end of the image
    pub fn check_targets(&self, layout: &Layout) -> Result<()> {
        for tx in &self.transactions {
            if let Some((block, _)) = tx.writes.iter().find(|(b, _)| !layout.is_home_block(*b)) {
                return Err(VsfsError::JournalCorruption(format!(
                    "transaction at offset {} targets invalid block {}",
                    tx.start, block
                )));
            }
        }
        Ok(())
    }
}
