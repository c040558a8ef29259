//! Configuration for ShardKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{KvError, Result};

/// Default number of partitions
pub const DEFAULT_PARTITION_COUNT: usize = 3;

/// Main configuration for a ShardKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Number of partitions (P). Fixed for the lifetime of the store.
    pub partition_count: usize,

    // -------------------------------------------------------------------------
    // AOF Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only file
    pub aof_path: PathBuf,

    /// Sync strategy: how often to fsync the AOF
    pub aof_sync_strategy: AofSyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// How long the accept loop sleeps when no connection is pending
    /// (milliseconds)
    pub accept_poll_interval_ms: u64,
}

/// AOF sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AofSyncStrategy {
    /// fsync after every record (a reply implies the record is on disk)
    EveryWrite,

    /// fsync after N appended records
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partition_count: DEFAULT_PARTITION_COUNT,
            aof_path: PathBuf::from("AOF.txt"),
            aof_sync_strategy: AofSyncStrategy::EveryWrite,
            listen_addr: "0.0.0.0:9090".to_string(),
            accept_poll_interval_ms: 50,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Poll interval of the accept loop as a `Duration`
    pub fn accept_poll_interval(&self) -> Duration {
        Duration::from_millis(self.accept_poll_interval_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the number of partitions
    pub fn partition_count(mut self, count: usize) -> Self {
        self.config.partition_count = count;
        self
    }

    /// Set the AOF path
    pub fn aof_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.aof_path = path.into();
        self
    }

    /// Set the AOF sync strategy
    pub fn aof_sync_strategy(mut self, strategy: AofSyncStrategy) -> Self {
        self.config.aof_sync_strategy = strategy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the accept poll interval (in milliseconds)
    pub fn accept_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_interval_ms = ms;
        self
    }

    /// Validate and return the config
    pub fn build(self) -> Result<Config> {
        if self.config.partition_count == 0 {
            return Err(KvError::Config(
                "partition count must be at least 1".to_string(),
            ));
        }
        if let AofSyncStrategy::EveryNEntries { count: 0 } = self.config.aof_sync_strategy {
            return Err(KvError::Config(
                "sync interval must be at least 1 entry".to_string(),
            ));
        }
        Ok(self.config)
    }
}
