//! Blocking client
//!
//! Speaks the line protocol over one TCP connection.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{KvError, Result};
use crate::protocol::{read_response, write_line, Command};

/// A connected client
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one raw line and return the reply, without its `\n`
    pub fn send_line(&mut self, line: &[u8]) -> Result<Vec<u8>> {
        write_line(&mut self.writer, line)?;
        read_response(&mut self.reader)?
            .ok_or_else(|| KvError::Network("server closed the connection".to_string()))
    }

    /// Send one raw line, reply decoded lossily as UTF-8
    pub fn request(&mut self, line: &str) -> Result<String> {
        let reply = self.send_line(line.as_bytes())?;
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    /// SET a key; any reply other than `OK` is returned as an error
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let command = Command::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        let reply = self.send_line(&command.encode())?;
        if reply == b"OK" {
            Ok(())
        } else {
            Err(KvError::Protocol(String::from_utf8_lossy(&reply).into_owned()))
        }
    }

    /// GET a key; `None` on `NOT FOUND`
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let reply = self.send_line(&Command::Get { key: key.to_vec() }.encode())?;
        if reply == b"NOT FOUND" {
            Ok(None)
        } else {
            Ok(Some(reply))
        }
    }

    /// DEL a key; returns whether it existed
    pub fn del(&mut self, key: &[u8]) -> Result<bool> {
        let reply = self.send_line(&Command::Del { key: key.to_vec() }.encode())?;
        match reply.as_slice() {
            b"KEY DELETED" => Ok(true),
            b"NOT FOUND" => Ok(false),
            other => Err(KvError::Protocol(String::from_utf8_lossy(other).into_owned())),
        }
    }
}
