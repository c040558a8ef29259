//! ShardKV Server Binary
//!
//! Replays the AOF, then serves the line protocol until SIGINT/SIGTERM.

use std::sync::Arc;

use clap::Parser;
use shardkv::config::{AofSyncStrategy, DEFAULT_PARTITION_COUNT};
use shardkv::network::Server;
use shardkv::{Config, Engine, Statistics};
use tracing_subscriber::{fmt, EnvFilter};

/// ShardKV Server
#[derive(Parser, Debug)]
#[command(name = "shardkv-server")]
#[command(about = "Partitioned in-memory key-value store with an append-only log")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:9090")]
    listen: String,

    /// Number of partitions
    #[arg(short, long, default_value_t = DEFAULT_PARTITION_COUNT)]
    partitions: usize,

    /// Path of the append-only file
    #[arg(short, long, default_value = "AOF.txt")]
    aof: String,

    /// fsync the AOF every N records instead of after every record
    #[arg(long)]
    sync_every: Option<usize>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shardkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("ShardKV Server v{}", shardkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);
    tracing::info!("Partitions: {}", args.partitions);

    let sync_strategy = match args.sync_every {
        Some(count) => AofSyncStrategy::EveryNEntries { count },
        None => AofSyncStrategy::EveryWrite,
    };

    let config = match Config::builder()
        .listen_addr(&args.listen)
        .partition_count(args.partitions)
        .aof_path(&args.aof)
        .aof_sync_strategy(sync_strategy)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // Open engine (replays the AOF before anything is accepted)
    let engine = match Engine::open(&config) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let stats = Arc::new(Statistics::new());

    let server = match Server::bind(config, engine, stats) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to listen: {}", e);
            std::process::exit(1);
        }
    };

    // SIGINT and SIGTERM both request a graceful shutdown
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received shutdown signal, draining connections...");
        shutdown.trigger();
    }) {
        tracing::error!("Failed to install signal handler: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
