//! ShardKV CLI Client
//!
//! Command-line interface for interacting with ShardKV.

use clap::{Parser, Subcommand};
use shardkv::network::Client;

/// ShardKV CLI
#[derive(Parser, Debug)]
#[command(name = "shardkv-cli")]
#[command(about = "CLI for the ShardKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:9090")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Send a raw protocol line and print the reply
    Raw {
        /// Tokens joined with single spaces
        #[arg(required = true, num_args = 1..)]
        tokens: Vec<String>,
    },
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let outcome = match &args.command {
        Commands::Get { key } => client.get(key.as_bytes()).map(|value| match value {
            Some(value) => String::from_utf8_lossy(&value).into_owned(),
            None => "NOT FOUND".to_string(),
        }),
        Commands::Set { key, value } => client
            .set(key.as_bytes(), value.as_bytes())
            .map(|()| "OK".to_string()),
        Commands::Del { key } => client.del(key.as_bytes()).map(|deleted| {
            let reply = if deleted { "KEY DELETED" } else { "NOT FOUND" };
            reply.to_string()
        }),
        Commands::Raw { tokens } => client.request(&tokens.join(" ")),
    };

    match outcome {
        Ok(reply) => println!("{}", reply),
        Err(e) => {
            eprintln!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}
