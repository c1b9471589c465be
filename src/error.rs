//! Error types for vsjournal
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using VsfsError
pub type Result<T> = std::result::Result<T, VsfsError>;

/// Unified error type for vsjournal operations
#[derive(Debug, Error)]
pub enum VsfsError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Block {index} out of range (image has {count} blocks)")]
    BlockOutOfRange { index: u32, count: u32 },

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Name too long: {len} bytes (max {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    // -------------------------------------------------------------------------
    // Resource Exhaustion
    // -------------------------------------------------------------------------
    #[error("No free inodes")]
    NoFreeInodes,

    #[error("Root directory is full")]
    DirectoryFull,

    #[error("Insufficient journal space: need {needed} bytes, {available} available; run install first")]
    JournalFull { needed: usize, available: usize },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Corruption Errors
    // -------------------------------------------------------------------------
    #[error("Invalid superblock: {0}")]
    InvalidSuperblock(String),

    #[error("Journal corruption detected: {0}")]
    JournalCorruption(String),

    #[error("Filesystem corruption detected: {0}")]
    Corruption(String),
}

/// Coarse classification of a [`VsfsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing was mutated
    Validation,
    /// Out of inodes, directory slots or journal space; nothing was mutated
    ResourceExhausted,
    /// Storage failure; the current operation was aborted
    Io,
    /// On-disk structures failed validation
    Corruption,
}

impl VsfsError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VsfsError::Io(_) | VsfsError::BlockOutOfRange { .. } => ErrorKind::Io,
            VsfsError::NameTooLong { .. }
            | VsfsError::InvalidName(_)
            | VsfsError::AlreadyExists(_) => ErrorKind::Validation,
            VsfsError::NoFreeInodes | VsfsError::DirectoryFull | VsfsError::JournalFull { .. } => {
                ErrorKind::ResourceExhausted
            }
            VsfsError::Serialization(_)
            | VsfsError::InvalidSuperblock(_)
            | VsfsError::JournalCorruption(_)
            | VsfsError::Corruption(_) => ErrorKind::Corruption,
        }
    }
}

impl From<bincode::Error> for VsfsError {
    fn from(e: bincode::Error) -> Self {
        VsfsError::Serialization(e.to_string())
    }
}
