//! End-to-end tests for the TCP server
//!
//! These tests verify:
//! - Every wire exchange from the protocol table
//! - Connections survive client errors
//! - Restart recovers state from the AOF
//! - Shutdown stops accepting, drains, and returns cleanly

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use shardkv::config::Config;
use shardkv::network::{Client, ConnectionTracker, Server, ShutdownHandle};
use shardkv::{Engine, KvError, Result, Statistics};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct RunningServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    tracker: Arc<ConnectionTracker>,
    stats: Arc<Statistics>,
    handle: JoinHandle<Result<()>>,
}

impl RunningServer {
    fn client(&self) -> Client {
        Client::connect(self.addr).unwrap()
    }

    fn stop(self) {
        self.shutdown.trigger();
        self.handle.join().unwrap().unwrap();
    }
}

fn config_for(dir: &Path) -> Config {
    Config::builder()
        .listen_addr("127.0.0.1:0")
        .aof_path(dir.join("AOF.txt"))
        .partition_count(3)
        .accept_poll_interval_ms(5)
        .build()
        .unwrap()
}

fn start_server(dir: &Path) -> RunningServer {
    let config = config_for(dir);
    let engine = Arc::new(Engine::open(&config).unwrap());
    let stats = Arc::new(Statistics::new());

    let server = Server::bind(config, engine, Arc::clone(&stats)).unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let tracker = server.tracker();
    let handle = thread::spawn(move || server.run());

    RunningServer {
        addr,
        shutdown,
        tracker,
        stats,
        handle,
    }
}

fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// =============================================================================
// Wire Scenarios
// =============================================================================

#[test]
fn test_set_then_get() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());
    let mut client = server.client();

    assert_eq!(client.request("SET a 1").unwrap(), "OK");
    assert_eq!(client.request("GET a").unwrap(), "1");

    drop(client);
    server.stop();
}

#[test]
fn test_get_missing() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());
    let mut client = server.client();

    assert_eq!(client.request("GET missing").unwrap(), "NOT FOUND");

    drop(client);
    server.stop();
}

#[test]
fn test_delete_sequence() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());
    let mut client = server.client();

    assert_eq!(client.request("DEL missing").unwrap(), "NOT FOUND");
    assert_eq!(client.request("SET x y").unwrap(), "OK");
    assert_eq!(client.request("DEL x").unwrap(), "KEY DELETED");
    assert_eq!(client.request("GET x").unwrap(), "NOT FOUND");

    drop(client);
    server.stop();
}

#[test]
fn test_unknown_command() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());
    let mut client = server.client();

    assert_eq!(client.request("FOO bar").unwrap(), "unknown command: FOO");

    drop(client);
    server.stop();
}

#[test]
fn test_single_token_is_invalid() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());
    let mut client = server.client();

    assert_eq!(client.request("SET").unwrap(), "invalid command");
    assert_eq!(client.request("SET lonely").unwrap(), "invalid command");
    // Connection is still usable afterwards
    assert_eq!(client.request("SET a 1").unwrap(), "OK");

    drop(client);
    server.stop();
}

#[test]
fn test_oversized_key() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());
    let mut client = server.client();
    let key = "k".repeat(129);

    assert_eq!(
        client.request(&format!("SET {} v", key)).unwrap(),
        "Key size is too large"
    );
    assert_eq!(client.request(&format!("GET {}", key)).unwrap(), "NOT FOUND");

    drop(client);
    server.stop();

    let aof = fs::read_to_string(temp.path().join("AOF.txt")).unwrap();
    assert!(!aof.contains(&key));
}

#[test]
fn test_restart_recovers_from_aof() {
    let temp = TempDir::new().unwrap();

    let server = start_server(temp.path());
    let mut client = server.client();
    client.set(b"k1", b"v1").unwrap();
    client.set(b"k2", b"v2").unwrap();
    client.set(b"k3", b"v3").unwrap();
    assert!(client.del(b"k2").unwrap());
    drop(client);
    server.stop();

    let server = start_server(temp.path());
    let mut client = server.client();
    assert_eq!(client.request("GET k1").unwrap(), "v1");
    assert_eq!(client.request("GET k2").unwrap(), "NOT FOUND");
    assert_eq!(client.request("GET k3").unwrap(), "v3");
    drop(client);
    server.stop();
}

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_pipelined_lines_get_one_reply_each() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());

    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.write_all(b"SET a 1\nGET a\nDEL a\nGET a\n").unwrap();

    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut replies = Vec::new();
    for _ in 0..4 {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        replies.push(line);
    }

    assert_eq!(replies, vec!["OK\n", "1\n", "KEY DELETED\n", "NOT FOUND\n"]);

    drop(reader);
    drop(stream);
    server.stop();
}

#[test]
fn test_crlf_lines_accepted() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());

    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.write_all(b"SET a 1\r\nGET a\r\n").unwrap();

    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut first = String::new();
    let mut second = String::new();
    reader.read_line(&mut first).unwrap();
    reader.read_line(&mut second).unwrap();

    assert_eq!(first, "OK\n");
    assert_eq!(second, "1\n");

    drop(reader);
    drop(stream);
    server.stop();
}

#[test]
fn test_client_helpers() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());
    let mut client = server.client();

    client.set(b"name", b"shardkv").unwrap();
    assert_eq!(client.get(b"name").unwrap(), Some(b"shardkv".to_vec()));
    assert!(client.del(b"name").unwrap());
    assert!(!client.del(b"name").unwrap());
    assert_eq!(client.get(b"name").unwrap(), None);

    let too_long = vec![b'x'; 200];
    assert!(matches!(client.set(&too_long, b"v"), Err(KvError::Protocol(_))));

    drop(client);
    server.stop();
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_clients() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());
    let addr = server.addr;

    let handles: Vec<_> = (0..8)
        .map(|t| {
            thread::spawn(move || {
                let mut client = Client::connect(addr).unwrap();
                for i in 0..25 {
                    let key = format!("c{}_{}", t, i);
                    client.set(key.as_bytes(), b"v").unwrap();
                    assert_eq!(client.get(key.as_bytes()).unwrap(), Some(b"v".to_vec()));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut client = server.client();
    assert_eq!(client.request("GET c7_24").unwrap(), "v");
    drop(client);

    // Every accepted connection is recorded, and never removed
    assert_eq!(server.stats.connection_count(), 9);
    server.stop();
}

// =============================================================================
// Shutdown Tests
// =============================================================================

#[test]
fn test_shutdown_waits_for_open_connections() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());

    let mut client = server.client();
    assert_eq!(client.request("SET a 1").unwrap(), "OK");
    assert_eq!(server.tracker.active(), 1);

    server.shutdown.trigger();
    thread::sleep(Duration::from_millis(100));

    // Still draining: the open connection keeps the server alive and usable
    assert!(!server.handle.is_finished());
    assert_eq!(client.request("GET a").unwrap(), "1");

    drop(client);
    assert!(wait_until(Duration::from_secs(5), || server.handle.is_finished()));
    server.handle.join().unwrap().unwrap();
}

#[test]
fn test_no_new_connections_after_shutdown() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());
    let addr = server.addr;

    server.stop();

    assert!(TcpStream::connect(addr).is_err());
}

#[test]
fn test_tracker_returns_to_zero() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());

    {
        let mut a = server.client();
        let mut b = server.client();
        a.request("GET x").unwrap();
        b.request("GET x").unwrap();
        assert_eq!(server.tracker.active(), 2);
    }

    assert!(server.tracker.wait_idle_timeout(Duration::from_secs(5)));
    assert_eq!(server.tracker.active(), 0);
    server.stop();
}

#[test]
fn test_bind_conflict_is_an_error() {
    let temp = TempDir::new().unwrap();
    let server = start_server(temp.path());

    let config = Config::builder()
        .listen_addr(server.addr.to_string())
        .aof_path(temp.path().join("other.txt"))
        .build()
        .unwrap();
    let engine = Arc::new(Engine::in_memory(3));
    let result = Server::bind(config, engine, Arc::new(Statistics::new()));

    assert!(matches!(result, Err(KvError::Bind { .. })));
    server.stop();
}
