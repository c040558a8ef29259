//! # ShardKV
//!
//! A single-process, in-memory key-value store with:
//! - A partitioned map (one readers-writer lock per partition)
//! - An append-only file (AOF) replayed on startup
//! - A line-oriented TCP protocol (`SET`, `GET`, `DEL`)
//! - Graceful shutdown that drains connections and dumps statistics
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │          (accept loop, one thread per connection)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one line in, one line out
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │              (parse, log mutation, apply)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────────┐
//!   │     AOF     │          │ PartitionedMap   │
//!   │  (Append)   │          │ (RwLock x P)     │
//!   └─────────────┘          └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod aof;
pub mod partition;
pub mod protocol;
pub mod engine;
pub mod stats;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::{Engine, ExecMode};
pub use stats::Statistics;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ShardKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
