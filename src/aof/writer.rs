//! AOF Writer
//!
//! Handles appending records to the AOF.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::AofSyncStrategy;
use crate::error::{KvError, Result};
use super::{AofReader, RECORD_TERMINATOR};

/// Writes records to the AOF
///
/// Not synchronized on its own; the engine keeps it behind a mutex so that
/// a record's write and fsync happen as one unit.
pub struct AofWriter {
    file: File,
    path: PathBuf,
    sync_strategy: AofSyncStrategy,

    /// Records appended since the last fsync
    unsynced: usize,

    /// Records appended through this writer
    records_written: u64,
}

impl AofWriter {
    /// Open or create the AOF in append + read mode
    ///
    /// New files are created with mode `0644` on Unix.
    pub fn open(path: &Path, sync_strategy: AofSyncStrategy) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true).append(true).create(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }

        let file = options.open(path).map_err(|e| {
            KvError::AofUnavailable(format!("{}: {}", path.display(), e))
        })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sync_strategy,
            unsynced: 0,
            records_written: 0,
        })
    }

    /// Append one record (without its terminator)
    ///
    /// The record and its `\n` go out in a single write call.
    pub fn append(&mut self, record: &[u8]) -> Result<()> {
        if record.contains(&RECORD_TERMINATOR) {
            return Err(KvError::AofWrite(
                "record must not contain a line feed".to_string(),
            ));
        }

        let mut line = Vec::with_capacity(record.len() + 1);
        line.extend_from_slice(record);
        line.push(RECORD_TERMINATOR);

        self.file.write_all(&line)?;
        self.records_written += 1;
        self.unsynced += 1;

        let should_sync = match self.sync_strategy {
            AofSyncStrategy::EveryWrite => true,
            AofSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if should_sync {
            self.sync()?;
        }

        Ok(())
    }

    /// Terminate an unterminated fragment at the end of the file
    ///
    /// Writes a lone `\n` and fsyncs, so the next append starts on a fresh
    /// line instead of extending the fragment. Existing bytes are untouched.
    pub fn terminate_partial_tail(&mut self) -> Result<()> {
        self.file.write_all(&[RECORD_TERMINATOR])?;
        self.sync()
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Open a reader positioned at the start of the file
    ///
    /// Shares the underlying handle; appends are unaffected by the reader's
    /// position because the file is in append mode.
    pub fn reader(&self) -> Result<AofReader<File>> {
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(AofReader::new(file))
    }

    /// Records appended through this writer
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Records appended but not yet fsynced
    pub fn unsynced(&self) -> usize {
        self.unsynced
    }

    /// Path of the AOF
    pub fn path(&self) -> &Path {
        &self.path
    }
}
