//! PartitionedMap implementation
//!
//! A fixed vector of `HashMap`s, each behind its own `parking_lot::RwLock`.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

use super::{partition_index, SetStatus, MAX_KEY_SIZE};

type Partition = HashMap<Bytes, Bytes>;

/// Sharded key-value map
///
/// ## Concurrency Model
///
/// - **Writes** (set/delete): exclusive lock on the key's partition only
/// - **Reads** (get): shared lock on the key's partition only
///
/// Writes to different partitions never contend. Writes to the same key are
/// totally ordered by acquisition of that key's partition lock.
pub struct PartitionedMap {
    partitions: Vec<RwLock<Partition>>,
}

impl PartitionedMap {
    /// Create a map with `partition_count` empty partitions
    ///
    /// # Panics
    /// Panics if `partition_count` is zero.
    pub fn new(partition_count: usize) -> Self {
        assert!(partition_count > 0, "partition count must be at least 1");

        let partitions = (0..partition_count)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();

        Self { partitions }
    }

    /// Number of partitions (P)
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Index of the partition that owns `key`
    pub fn partition_of(&self, key: &[u8]) -> usize {
        partition_index(key, self.partitions.len())
    }

    // =========================================================================
    // Point Operations
    // =========================================================================

    /// Insert or overwrite a key
    pub fn set(&self, key: &[u8], value: &[u8]) -> SetStatus {
        self.set_with(key, value, || {})
    }

    /// Insert or overwrite a key, running `before_commit` under the
    /// partition's exclusive lock just before the insert
    ///
    /// `before_commit` is not called when the key is rejected as oversized.
    pub fn set_with<F: FnOnce()>(&self, key: &[u8], value: &[u8], before_commit: F) -> SetStatus {
        if key.len() > MAX_KEY_SIZE {
            return SetStatus::KeyTooLarge;
        }

        let mut partition = self.partitions[self.partition_of(key)].write();
        before_commit();
        partition.insert(Bytes::copy_from_slice(key), Bytes::copy_from_slice(value));

        SetStatus::Stored
    }

    /// Look up a key under the partition's shared lock
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let partition = self.partitions[self.partition_of(key)].read();
        partition.get(key).cloned()
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &[u8]) -> bool {
        let partition = self.partitions[self.partition_of(key)].read();
        partition.contains_key(key)
    }

    /// Remove a key, returning whether it was present
    pub fn delete(&self, key: &[u8]) -> bool {
        self.delete_with(key, || {})
    }

    /// Remove a key, running `before_commit` under the partition's exclusive
    /// lock just before the removal
    pub fn delete_with<F: FnOnce()>(&self, key: &[u8], before_commit: F) -> bool {
        let mut partition = self.partitions[self.partition_of(key)].write();
        before_commit();
        partition.remove(key).is_some()
    }

    // =========================================================================
    // Whole-Store Views (one partition lock at a time)
    // =========================================================================

    /// Number of keys in each partition, indexed by partition
    pub fn partition_sizes(&self) -> Vec<usize> {
        self.partitions
            .iter()
            .map(|partition| partition.read().len())
            .collect()
    }

    /// Total number of keys
    pub fn len(&self) -> usize {
        self.partitions
            .iter()
            .map(|partition| partition.read().len())
            .sum()
    }

    /// Check if every partition is empty
    pub fn is_empty(&self) -> bool {
        self.partitions
            .iter()
            .all(|partition| partition.read().is_empty())
    }

    /// Copy out every key-value pair, grouped by partition
    ///
    /// Not a consistent snapshot: a partition may change after it has been
    /// visited.
    pub fn entries(&self) -> Vec<(Bytes, Bytes)> {
        let mut entries = Vec::new();
        for partition in &self.partitions {
            let guard = partition.read();
            entries.extend(guard.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        entries
    }
}
