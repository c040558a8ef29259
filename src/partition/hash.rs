//! Key hashing
//!
//! 32-bit FNV-1 (multiply, then xor). Replay determinism depends on this
//! staying bit-for-bit stable.

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// FNV-1 32-bit hash over raw key bytes
pub fn fnv1_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV32_OFFSET_BASIS, |hash, &byte| {
        hash.wrapping_mul(FNV32_PRIME) ^ u32::from(byte)
    })
}

/// Partition owning `key` among `partition_count` partitions
///
/// `partition_count` must be non-zero.
pub fn partition_index(key: &[u8], partition_count: usize) -> usize {
    fnv1_32(key) as usize % partition_count
}
