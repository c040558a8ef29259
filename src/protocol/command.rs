//! Command definitions
//!
//! Represents commands from clients and AOF records.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Set,
    Get,
    Del,
}

impl CommandType {
    /// Wire spelling of the verb
    pub fn verb(&self) -> &'static str {
        match self {
            CommandType::Set => "SET",
            CommandType::Get => "GET",
            CommandType::Del => "DEL",
        }
    }

    /// Match a verb token (case-sensitive)
    pub fn from_verb(verb: &[u8]) -> Option<Self> {
        match verb {
            b"SET" => Some(CommandType::Set),
            b"GET" => Some(CommandType::Get),
            b"DEL" => Some(CommandType::Del),
            _ => None,
        }
    }

    /// Whether commands of this type change state (and are logged)
    pub fn is_mutation(&self) -> bool {
        matches!(self, CommandType::Set | CommandType::Del)
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a value under a key
    Set { key: Vec<u8>, value: Vec<u8> },

    /// Get a value by key
    Get { key: Vec<u8> },

    /// Delete a key
    Del { key: Vec<u8> },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Set { .. } => CommandType::Set,
            Command::Get { .. } => CommandType::Get,
            Command::Del { .. } => CommandType::Del,
        }
    }

    /// The key this command addresses
    pub fn key(&self) -> &[u8] {
        match self {
            Command::Set { key, .. } | Command::Get { key } | Command::Del { key } => key,
        }
    }

    pub fn is_mutation(&self) -> bool {
        self.command_type().is_mutation()
    }

    /// Render as a request line, without the trailing `\n`
    pub fn encode(&self) -> Vec<u8> {
        let verb = self.command_type().verb().as_bytes();
        let mut line = Vec::with_capacity(verb.len() + self.key().len() + 16);
        line.extend_from_slice(verb);
        line.push(b' ');
        line.extend_from_slice(self.key());
        if let Command::Set { value, .. } = self {
            line.push(b' ');
            line.extend_from_slice(value);
        }
        line
    }
}
