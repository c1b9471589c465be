//! Write-Ahead Journal Module
//!
//! Crash-consistent metadata updates through a redo log stored in the
//! image's journal region.
//!
//! ## Responsibilities
//! - Append whole transactions (data records + commit marker) or nothing
//! - Persist the journal region before any home block changes
//! - Replay only commit-terminated transactions, in log order
//! - Stop cleanly at records this version does not understand
//!
//! ## Region Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Header                                  │
//! │ ┌───────────┬──────────────┐            │
//! │ │ Magic (4) │ BytesUsed (4)│            │
//! │ └───────────┴──────────────┘            │
//! ├─────────────────────────────────────────┤
//! │ Data record                             │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │Type=1(2)│Size (2) │Blk (4) │ Block  │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ ... more data records ...               │
//! ├─────────────────────────────────────────┤
//! │ Commit record                           │
//! │ ┌─────────┬─────────┐                   │
//! │ │Type=2(2)│Size (2) │                   │
//! │ └─────────┴─────────┘                   │
//! ├─────────────────────────────────────────┤
//! │ ... next transaction ...                │
//! └─────────────────────────────────────────┘
//! ```

mod buffer;
mod install;
mod pending;
mod reader;
mod record;
mod transaction;

pub use buffer::{HeaderState, Journal};
pub use install::{InstallReport, Installer};
pub use pending::PendingView;
pub use reader::{JournaledTransaction, RecordReader, ScanStop, TransactionScan};
pub use record::{
    BlockWrite, JournalHeader, Record, RecordHeader, RecordType, COMMIT_RECORD_SIZE,
    DATA_RECORD_SIZE, JOURNAL_HEADER_SIZE, JOURNAL_MAGIC, RECORD_HEADER_SIZE,
};
pub use transaction::TransactionBuilder;
