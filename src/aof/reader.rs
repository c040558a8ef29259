//! AOF Reader
//!
//! Streams records from the AOF in file order.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::Result;
use super::RECORD_TERMINATOR;

/// Reads records from an AOF
pub struct AofReader<R> {
    reader: BufReader<R>,

    /// Byte offset just past the last complete record
    position: u64,

    /// Unterminated fragment found at the end, if any
    tail: Option<Vec<u8>>,
}

impl AofReader<File> {
    /// Open an AOF for reading from the start
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> AofReader<R> {
    /// Wrap any byte source
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            position: 0,
            tail: None,
        }
    }

    /// Read the next complete record, without its terminator
    ///
    /// Returns `Ok(None)` at end of file. A final fragment with no `\n` is
    /// not returned as a record; it is kept in [`partial_tail`](Self::partial_tail).
    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let n = self.reader.read_until(RECORD_TERMINATOR, &mut line)?;

        if n == 0 {
            return Ok(None);
        }

        if line.last() != Some(&RECORD_TERMINATOR) {
            tracing::warn!(
                "Ignoring {} trailing AOF bytes without a terminator at offset {}",
                n,
                self.position
            );
            self.tail = Some(line);
            return Ok(None);
        }

        self.position += n as u64;
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Ok(Some(line))
    }

    /// Iterate over all complete records
    pub fn records(self) -> AofRecords<R> {
        AofRecords { reader: self, done: false }
    }

    /// Byte offset just past the last complete record read
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether an unterminated fragment was found at the end
    pub fn has_partial_tail(&self) -> bool {
        self.tail.is_some()
    }

    /// Bytes of the unterminated fragment at the end, if one was found
    pub fn partial_tail(&self) -> Option<&[u8]> {
        self.tail.as_deref()
    }
}

/// Iterator over AOF records
pub struct AofRecords<R> {
    reader: AofReader<R>,
    done: bool,
}

impl<R> AofRecords<R> {
    /// Access the underlying reader (for position / tail state)
    pub fn reader(&self) -> &AofReader<R> {
        &self.reader
    }
}

impl<R: Read> Iterator for AofRecords<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
