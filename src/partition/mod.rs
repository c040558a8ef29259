//! Partition Module
//!
//! Sharded in-memory storage for keys and values.
//!
//! ## Responsibilities
//! - Route every key to exactly one partition: `fnv1_32(key) mod P`
//! - One readers-writer lock per partition, no global lock
//! - Reject keys longer than [`MAX_KEY_SIZE`] before touching any partition
//!
//! ## Locking Discipline
//! No operation ever holds two partition locks at the same time. Whole-store
//! views (`entries`, `partition_sizes`) visit the partitions one by one,
//! releasing each lock before taking the next.

mod hash;
mod map;

pub use hash::{fnv1_32, partition_index};
pub use map::PartitionedMap;

/// Maximum accepted key length in bytes
pub const MAX_KEY_SIZE: usize = 128;

/// Outcome of a `set` on the partitioned map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetStatus {
    /// The value was inserted or overwritten
    Stored,

    /// The key exceeded [`MAX_KEY_SIZE`]; nothing was written
    KeyTooLarge,
}
