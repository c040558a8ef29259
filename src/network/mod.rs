//! Network Module
//!
//! TCP server, per-connection handlers and a blocking client.
//!
//! ## Architecture
//! - Single acceptor thread polling a non-blocking listener
//! - One OS thread per accepted connection
//! - Commands routed through Engine
//! - Shutdown: stop accepting, drain in-flight connections, dump statistics

mod server;
mod connection;
mod tracker;
mod client;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use tracker::{ConnectionGuard, ConnectionTracker};
pub use client::Client;
