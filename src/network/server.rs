//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::stats::Statistics;
use super::{Connection, ConnectionTracker};

/// Cloneable flag that asks a running server to shut down
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown; the accept loop exits on its next poll
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// TCP server for ShardKV
///
/// ## Shutdown Sequence
/// 1. Accept loop sees the shutdown flag and exits
/// 2. Listener is closed (no new connections)
/// 3. Wait for every in-flight handler to return
/// 4. Dump connection statistics, log the partition summary
/// 5. fsync the AOF
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    stats: Arc<Statistics>,
    listener: TcpListener,
    tracker: Arc<ConnectionTracker>,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind the listener on `config.listen_addr`
    ///
    /// The engine must already have replayed its AOF.
    pub fn bind(config: Config, engine: Arc<Engine>, stats: Arc<Statistics>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|source| KvError::Bind {
            addr: config.listen_addr.clone(),
            source,
        })?;
        listener.set_nonblocking(true)?;

        tracing::info!("TCP server listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            engine,
            stats,
            listener,
            tracker: Arc::new(ConnectionTracker::new()),
            shutdown: ShutdownHandle::new(),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops this server when triggered
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// In-flight connection counter
    pub fn tracker(&self) -> Arc<ConnectionTracker> {
        Arc::clone(&self.tracker)
    }

    /// Run the accept loop, then drain (blocking)
    pub fn run(self) -> Result<()> {
        let poll_interval = self.config.accept_poll_interval();

        while !self.shutdown.is_triggered() {
            match self.listener.accept() {
                Ok((stream, peer)) => self.dispatch(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(poll_interval),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                    thread::sleep(poll_interval);
                }
            }
        }

        let Server {
            engine,
            stats,
            listener,
            tracker,
            ..
        } = self;

        tracing::info!("Shutting down the server, no longer accepting connections");
        drop(listener);

        tracing::info!("Waiting for {} in-flight connection(s) to finish", tracker.active());
        tracker.wait_idle();

        stats.display();
        engine.log_partition_summary();
        engine.close()?;

        tracing::info!("Shutdown complete");
        Ok(())
    }

    /// Register the connection and hand it to a new thread
    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        tracing::info!("Accepted connection from {}", peer);

        self.stats.add_connection(&peer.to_string());
        let guard = self.tracker.enter();
        let engine = Arc::clone(&self.engine);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let _guard = guard;
                let mut connection = match Connection::new(stream, engine) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!("Failed to set up connection from {}: {}", peer, e);
                        return;
                    }
                };
                if let Err(e) = connection.handle() {
                    tracing::warn!("Connection {} ended with error: {}", peer, e);
                }
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn handler for {}: {}", peer, e);
        }
    }
}
