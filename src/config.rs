//! Configuration for todokv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, TodoError};

/// Main configuration for a todokv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── items.log        (append-only item log)
    pub data_dir: PathBuf,

    /// Longest accepted item text, in characters
    pub max_text_len: usize,

    // -------------------------------------------------------------------------
    // Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the item log
    pub sync_strategy: SyncStrategy,

    /// Log size (in records) at which a mostly stale log gets rewritten
    /// (0 disables automatic compaction)
    pub compaction_threshold: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    /// Largest accepted request body (bytes)
    pub max_body_bytes: usize,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Default maximum text length, in characters
pub const DEFAULT_MAX_TEXT_LEN: usize = 1024;

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./todokv_data"),
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            sync_strategy: SyncStrategy::EveryWrite,
            compaction_threshold: 10_000,
            listen_addr: "127.0.0.1:5000".to_string(),
            max_body_bytes: 64 * 1024, // 64 KiB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings no store or server can run with
    pub fn validate(&self) -> Result<()> {
        if self.max_text_len == 0 {
            return Err(TodoError::Config("max_text_len must be at least 1".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(TodoError::Config("max_body_bytes must be at least 1".into()));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(TodoError::Config("sync every 0 entries".into()));
        }
        if self.listen_addr.trim().is_empty() {
            return Err(TodoError::Config("listen_addr is empty".into()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the maximum item text length
    pub fn max_text_len(mut self, len: usize) -> Self {
        self.config.max_text_len = len;
        self
    }

    /// Set the log sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the automatic compaction threshold (log records)
    pub fn compaction_threshold(mut self, records: u64) -> Self {
        self.config.compaction_threshold = records;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the request body limit (in bytes)
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.config.max_body_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
