//! Engine Module
//!
//! The command interpreter that ties the partitioned map to the AOF.
//!
//! ## Responsibilities
//! - Parse request lines and dispatch them to the partitioned map
//! - Append client mutations to the AOF before they are applied
//! - Replay the AOF into an empty map on startup

use bytes::Bytes;
use parking_lot::Mutex;

use crate::aof::{AofRecovery, AofWriter, ReplayResult};
use crate::config::Config;
use crate::error::Result;
use crate::partition::{PartitionedMap, SetStatus, MAX_KEY_SIZE};
use crate::protocol::{parse_command, Command, Response};

/// Where a command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Sent by a client: mutations are appended to the AOF
    Client,

    /// Read back from the AOF: never re-appended
    Replay,
}

/// The main storage engine
///
/// ## Write Path
///
/// For a client SET/DEL the engine takes the key's partition write lock,
/// appends the record to the AOF (write + fsync under the AOF mutex), then
/// mutates the partition. The lock order is always partition -> AOF, so:
///
/// - AOF order equals commit order for every key
/// - the reply is only produced after the record is on disk
///
/// An oversized SET is rejected before any lock is taken and leaves no
/// record behind.
pub struct Engine {
    /// Sharded in-memory data
    map: PartitionedMap,

    /// Append-only log; `None` when the file could not be opened
    aof: Option<Mutex<AofWriter>>,
}

impl Engine {
    /// Build the map, open the AOF and replay it
    ///
    /// On startup:
    /// 1. Create `partition_count` empty partitions
    /// 2. Open/create the AOF (failure is logged; the engine runs without durability)
    /// 3. Replay every record in replay mode
    /// 4. Terminate a torn final record so later appends start on a new line
    pub fn open(config: &Config) -> Result<Self> {
        let map = PartitionedMap::new(config.partition_count);

        let aof = match AofWriter::open(&config.aof_path, config.aof_sync_strategy) {
            Ok(writer) => {
                tracing::info!("AOF opened at {}", config.aof_path.display());
                Some(Mutex::new(writer))
            }
            Err(e) => {
                tracing::error!("Failed to create or open AOF, running without durability: {}", e);
                None
            }
        };

        let engine = Self { map, aof };

        let mut result = engine.replay()?;
        if let Some(tail) = result.tail.take() {
            engine.recover_partial_tail(&tail, &mut result)?;
        }
        tracing::info!(
            "AOF replay complete: {} records read, {} applied, {} skipped{}",
            result.records_read,
            result.records_applied,
            result.records_skipped,
            if result.partial_tail { ", partial tail terminated" } else { "" }
        );

        Ok(engine)
    }

    /// Engine with no AOF at all
    pub fn in_memory(partition_count: usize) -> Self {
        Self {
            map: PartitionedMap::new(partition_count),
            aof: None,
        }
    }

    /// Replay the AOF from offset 0 into the map
    ///
    /// Single-threaded; must finish before the server starts accepting.
    pub fn replay(&self) -> Result<ReplayResult> {
        let reader = match &self.aof {
            Some(aof) => aof.lock().reader()?,
            None => return Ok(ReplayResult::default()),
        };

        AofRecovery::replay(reader, |record| {
            !self.process_command(record, ExecMode::Replay).is_error()
        })
    }

    /// Terminate the unterminated fragment left by a torn write and apply it
    ///
    /// After the `\n` is written the fragment is an ordinary record for every
    /// later replay, so it is applied now too and memory matches the file.
    fn recover_partial_tail(&self, tail: &[u8], result: &mut ReplayResult) -> Result<()> {
        if let Some(aof) = &self.aof {
            aof.lock().terminate_partial_tail()?;
        }
        tracing::warn!(
            "Terminated partial AOF record: {:?}",
            String::from_utf8_lossy(tail)
        );

        result.records_read += 1;
        if self.process_command(tail, ExecMode::Replay).is_error() {
            result.records_skipped += 1;
        } else {
            result.records_applied += 1;
        }
        Ok(())
    }

    // =========================================================================
    // Command Execution
    // =========================================================================

    /// Interpret one request line and produce its reply
    ///
    /// The trimmed line itself is what gets appended to the AOF.
    pub fn process_command(&self, line: &[u8], mode: ExecMode) -> Response {
        let line = line.trim_ascii();

        match parse_command(line) {
            Ok(command) => self.apply(&command, line, mode),
            Err(e) => e.into(),
        }
    }

    /// Execute an already-parsed client command
    pub fn execute(&self, command: &Command) -> Response {
        self.apply(command, &command.encode(), ExecMode::Client)
    }

    fn apply(&self, command: &Command, record: &[u8], mode: ExecMode) -> Response {
        match command {
            Command::Set { key, value } => {
                let status = self.map.set_with(key, value, || self.log(record, mode));
                match status {
                    SetStatus::Stored => Response::Ok,
                    SetStatus::KeyTooLarge => {
                        tracing::debug!(
                            "Rejected SET with {}-byte key (max {})",
                            key.len(),
                            MAX_KEY_SIZE
                        );
                        Response::KeyTooLarge
                    }
                }
            }
            Command::Get { key } => match self.map.get(key) {
                Some(value) => Response::Value(value),
                None => Response::NotFound,
            },
            Command::Del { key } => {
                if self.map.delete_with(key, || self.log(record, mode)) {
                    Response::KeyDeleted
                } else {
                    Response::NotFound
                }
            }
        }
    }

    /// Append a mutation record (client mode only)
    ///
    /// Failures are logged and the mutation still goes ahead in memory.
    fn log(&self, record: &[u8], mode: ExecMode) {
        if mode == ExecMode::Replay {
            return;
        }
        let Some(aof) = &self.aof else {
            return;
        };

        let mut writer = aof.lock();
        match writer.append(record) {
            Ok(()) => tracing::trace!(
                "Wrote to AOF: {}",
                String::from_utf8_lossy(record)
            ),
            Err(e) => tracing::error!("Failed to write to AOF: {}", e),
        }
    }

    // =========================================================================
    // Direct Access
    // =========================================================================

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.map.get(key)
    }

    /// The underlying partitioned map
    pub fn map(&self) -> &PartitionedMap {
        &self.map
    }

    /// Number of keys per partition
    pub fn partition_sizes(&self) -> Vec<usize> {
        self.map.partition_sizes()
    }

    /// Whether mutations are being persisted
    pub fn is_durable(&self) -> bool {
        self.aof.is_some()
    }

    /// Records appended to the AOF since open
    pub fn aof_records_written(&self) -> u64 {
        self.aof
            .as_ref()
            .map(|aof| aof.lock().records_written())
            .unwrap_or(0)
    }

    /// Log a partition-wise summary of the data
    pub fn log_partition_summary(&self) {
        let sizes = self.map.partition_sizes();
        let total: usize = sizes.iter().sum();
        tracing::info!(
            total_partitions = sizes.len(),
            total_elements = total,
            "Partition-wise data summary: {:?}",
            sizes
        );
    }

    /// Flush and fsync any pending AOF records
    pub fn close(&self) -> Result<()> {
        if let Some(aof) = &self.aof {
            aof.lock().sync()?;
        }
        Ok(())
    }
}
