//! Protocol Module
//!
//! Defines the line-oriented text protocol shared by clients and the AOF.
//!
//! ## Request Format
//! ```text
//! <VERB> <arg> [<arg>]\n
//! ```
//! The line is trimmed of ASCII whitespace, then split on single spaces.
//! Values are one token; they cannot contain spaces or line feeds.
//!
//! ### Commands
//! - `SET <key> <value>` - store a value (mutation, logged)
//! - `GET <key>`         - fetch a value
//! - `DEL <key>`         - remove a key (mutation, logged)
//!
//! ## Response Format
//! One line per request:
//! - `OK`, `<value>`, `NOT FOUND`, `KEY DELETED`
//! - `Key size is too large`
//! - `invalid command`, `unknown command: <verb>`

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::Response;
pub use codec::{
    parse_command, read_line, write_line, read_response, write_response,
    ParseError, MAX_LINE_LENGTH,
};
