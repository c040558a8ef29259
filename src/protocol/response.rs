//! Response definitions
//!
//! Represents the single-line replies sent to clients.

use bytes::Bytes;

/// A response to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// SET stored the value
    Ok,

    /// GET found a value
    Value(Bytes),

    /// GET or DEL on an absent key
    NotFound,

    /// DEL removed the key
    KeyDeleted,

    /// SET key exceeded the size cap
    KeyTooLarge,

    /// Fewer tokens than the verb needs
    InvalidCommand,

    /// Verb not recognised
    UnknownCommand(Vec<u8>),
}

impl Response {
    /// Encode as a `\n`-terminated line
    pub fn encode(&self) -> Vec<u8> {
        let mut line = match self {
            Response::Ok => b"OK".to_vec(),
            Response::Value(value) => value.to_vec(),
            Response::NotFound => b"NOT FOUND".to_vec(),
            Response::KeyDeleted => b"KEY DELETED".to_vec(),
            Response::KeyTooLarge => b"Key size is too large".to_vec(),
            Response::InvalidCommand => b"invalid command".to_vec(),
            Response::UnknownCommand(verb) => {
                let mut line = b"unknown command: ".to_vec();
                line.extend_from_slice(verb);
                line
            }
        };
        line.push(b'\n');
        line
    }

    /// Whether this reply reports a client error
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Response::KeyTooLarge | Response::InvalidCommand | Response::UnknownCommand(_)
        )
    }
}
