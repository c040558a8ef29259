//! Append-Only File (AOF) Module
//!
//! Durability through a replayable log of accepted mutations.
//!
//! ## Responsibilities
//! - Append every client SET/DEL before it is applied to memory
//! - fsync according to the configured [`AofSyncStrategy`](crate::config::AofSyncStrategy)
//! - Stream records back at startup for replay
//!
//! ## File Format
//! ```text
//! SET user:1 alice\n
//! SET user:2 bob\n
//! DEL user:1\n
//! ```
//! One command per line, byte-for-byte the text the client sent (trimmed).
//! No header, framing, or checksum. A trailing fragment without `\n` is not a
//! record and is ignored by the reader.

mod writer;
mod reader;
mod recovery;

pub use writer::AofWriter;
pub use reader::{AofReader, AofRecords};
pub use recovery::{AofRecovery, ReplayResult};

/// Record terminator
pub const RECORD_TERMINATOR: u8 = b'\n';
