//! Protocol codec
//!
//! Line framing and command parsing for the text protocol.
//!
//! ## Parsing Rules
//! 1. Trim leading/trailing ASCII whitespace
//! 2. Split on every single space (`"SET a  b"` has an empty third token)
//! 3. Fewer than 2 tokens is `invalid command`, whatever the verb
//! 4. Verb is matched case-sensitively; extra trailing tokens are ignored

use std::io::{BufRead, Read, Write};

use thiserror::Error;

use crate::error::{KvError, Result};
use super::{Command, CommandType, Response};

/// Longest accepted request line, excluding the terminator (64 KiB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Why a line could not be turned into a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid command")]
    Invalid,

    #[error("unknown command: {}", String::from_utf8_lossy(.0))]
    UnknownVerb(Vec<u8>),
}

impl From<ParseError> for Response {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Invalid => Response::InvalidCommand,
            ParseError::UnknownVerb(verb) => Response::UnknownCommand(verb),
        }
    }
}

// =============================================================================
// Command Parsing
// =============================================================================

/// Parse one request line (terminator optional)
pub fn parse_command(line: &[u8]) -> std::result::Result<Command, ParseError> {
    let tokens: Vec<&[u8]> = line.trim_ascii().split(|b| *b == b' ').collect();

    if tokens.len() < 2 {
        return Err(ParseError::Invalid);
    }

    let command_type = CommandType::from_verb(tokens[0])
        .ok_or_else(|| ParseError::UnknownVerb(tokens[0].to_vec()))?;

    let key = tokens[1].to_vec();
    match command_type {
        CommandType::Set => {
            let value = tokens.get(2).ok_or(ParseError::Invalid)?;
            Ok(Command::Set {
                key,
                value: value.to_vec(),
            })
        }
        CommandType::Get => Ok(Command::Get { key }),
        CommandType::Del => Ok(Command::Del { key }),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one line into `buf`, stripping `\n` (and a preceding `\r`)
///
/// Returns `Ok(false)` at end of stream. A final line without a terminator is
/// still returned. Lines longer than [`MAX_LINE_LENGTH`] are a protocol error.
pub fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<bool> {
    buf.clear();

    let limit = MAX_LINE_LENGTH as u64 + 1;
    let n = reader.by_ref().take(limit).read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(false);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > MAX_LINE_LENGTH {
        return Err(KvError::Protocol(format!(
            "line exceeds {} bytes",
            MAX_LINE_LENGTH
        )));
    }

    Ok(true)
}

/// Write a request line followed by `\n`
pub fn write_line<W: Write>(writer: &mut W, line: &[u8]) -> Result<()> {
    writer.write_all(line)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read a response line; `Ok(None)` if the peer closed the stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    if read_line(reader, &mut buf)? {
        Ok(Some(buf))
    } else {
        Ok(None)
    }
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&response.encode())?;
    writer.flush()?;
    Ok(())
}
