//! Configuration for vsjournal
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for an engine instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Image Configuration
    // -------------------------------------------------------------------------
    /// Path to the formatted disk image
    pub image_path: PathBuf,

    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: when to fsync the image
    pub sync_strategy: SyncStrategy,

    /// What to do with a journal region whose header is not recognized
    pub header_policy: JournalHeaderPolicy,
}

/// Image sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync at every commit boundary: after the journal is persisted,
    /// after install writes the data region, and after the journal reset
    OnCommit,

    /// Rely on platform write semantics only (fastest, not crash-safe)
    Never,
}

/// Handling of an unrecognized journal header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalHeaderPolicy {
    /// Treat any unrecognized header as first use and reformat the region
    Reinitialize,

    /// Only an all-zero region counts as first use; any other unrecognized
    /// header is reported as journal corruption
    FailClosed,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("vsfs.img"),
            sync_strategy: SyncStrategy::OnCommit,
            header_policy: JournalHeaderPolicy::Reinitialize,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the disk image path
    pub fn image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.image_path = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the journal header policy
    pub fn header_policy(mut self, policy: JournalHeaderPolicy) -> Self {
        self.config.header_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
