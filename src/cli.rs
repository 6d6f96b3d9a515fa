//! Command-line interface definitions.
//!
//! This module defines the CLI structure for the cache client using clap.

use clap::{Parser, Subcommand};
use serde_json::Value;

/// Default Redis endpoint.
pub const DEFAULT_URL: &str = "redis://127.0.0.1:6379";

/// Default TTL applied by the client, in seconds.
pub const DEFAULT_EXPIRE: u64 = 600;

/// Cache-aside client.
///
/// A CLI tool for reading and writing cached values in a Redis server.
#[derive(Parser, Debug)]
#[command(name = "cache-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Redis connection URL.
    #[arg(long, env = "REDIS_URL", default_value = DEFAULT_URL, global = true)]
    pub url: String,

    /// TTL in seconds applied on every write and hit.
    #[arg(long, default_value_t = DEFAULT_EXPIRE, global = true)]
    pub expire: u64,

    /// The command to execute.
    #[clap(subcommand)]
    pub command: ClientCommand,
}

/// Available client commands.
///
/// Values are parsed as JSON, falling back to a plain string.
#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Get a value by key.
    ///
    /// A hit resets the key's TTL.
    Get {
        /// The key to look up.
        key: String,
    },

    /// Set a key-value pair.
    Set {
        /// The key to store the value under.
        key: String,
        /// The value to store.
        value: String,
    },

    /// Delete one or more keys.
    Del {
        /// The keys to delete.
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Get a hash field.
    Hget {
        key: String,
        field: String,
    },

    /// Set a hash field.
    Hset {
        key: String,
        field: String,
        value: String,
    },

    /// Delete a hash field, or the whole key when no field is given.
    Hdel {
        key: String,
        field: Option<String>,
    },

    /// Increment an integer hash field.
    Hincrby {
        key: String,
        field: String,
        /// Amount to add.
        #[arg(default_value_t = 1, allow_negative_numbers = true)]
        delta: i64,
    },

    /// Add members to a set.
    Sadd {
        key: String,
        /// The members to add.
        #[arg(required = true)]
        members: Vec<String>,
    },

    /// List the members of a set.
    Smembers {
        key: String,
    },

    /// Remove every key in the database.
    Flushdb,
}

/// Parse a value given on the command line.
///
/// Valid JSON is taken as is; anything else becomes a JSON string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
