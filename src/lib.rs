//! # vsjournal
//!
//! Crash-consistent metadata updates for a small block-structured
//! filesystem image, with:
//! - A write-ahead journal of whole-block redo records
//! - All-or-nothing transaction append and commit-gated replay
//! - Idempotent install that empties the journal
//! - Forward-compatible record scanning (unknown records stop replay)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                              │
//! │                 (create / install / inspect)                 │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │ create                       │ install
//!                ▼                              ▼
//!   ┌────────────────────────┐        ┌──────────────────┐
//!   │    MetadataMutator     │        │    Installer     │
//!   │  (reads PendingView)   │        │ (commit-gated    │
//!   └───────────┬────────────┘        │  replay, reset)  │
//!               ▼                     └────────┬─────────┘
//!   ┌────────────────────────┐                 │
//!   │  TransactionBuilder    │                 │
//!   └───────────┬────────────┘                 │
//!               ▼                              ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │            Journal (header + records)                │
//!   └──────────────────────────┬──────────────────────────┘
//!                              ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │     BlockStore (superblock, journal, bitmaps,        │
//!   │             inode table, data region)                │
//!   └─────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod layout;
pub mod storage;
pub mod journal;
pub mod mutator;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, Result, VsfsError};
pub use config::Config;
pub use engine::{Engine, JournalStatus};
pub use journal::InstallReport;
pub use mutator::CreatedEntry;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of vsjournal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
