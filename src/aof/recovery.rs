//! AOF Recovery
//!
//! Replays the AOF into a fresh store at startup.

use std::io::Read;

use crate::error::Result;
use super::AofReader;

/// Drives replay of an AOF
pub struct AofRecovery;

/// Result of a replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayResult {
    /// Complete records read from the file
    pub records_read: u64,

    /// Records the interpreter accepted and applied
    pub records_applied: u64,

    /// Malformed or unknown records skipped
    pub records_skipped: u64,

    /// Whether an unterminated fragment was found at the end
    pub partial_tail: bool,

    /// The fragment itself; it is not passed to `apply`
    pub tail: Option<Vec<u8>>,
}

impl AofRecovery {
    /// Feed every record to `apply`, in file order
    ///
    /// `apply` returns `true` when the record was a well-formed command and
    /// `false` when it was skipped. Replay stops at the first I/O error.
    pub fn replay<R, F>(reader: AofReader<R>, mut apply: F) -> Result<ReplayResult>
    where
        R: Read,
        F: FnMut(&[u8]) -> bool,
    {
        let mut result = ReplayResult::default();
        let mut records = reader.records();

        for record in records.by_ref() {
            let record = record?;
            result.records_read += 1;

            if apply(&record) {
                result.records_applied += 1;
            } else {
                tracing::debug!(
                    "Skipping malformed AOF record: {:?}",
                    String::from_utf8_lossy(&record)
                );
                result.records_skipped += 1;
            }
        }

        result.tail = records.reader().partial_tail().map(<[u8]>::to_vec);
        result.partial_tail = result.tail.is_some();
        Ok(result)
    }
}
