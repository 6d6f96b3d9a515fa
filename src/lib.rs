//! # Cache Aside
//!
//! A cache-aside access layer over a key/value, hash and set store, with
//! batched execution and sliding TTLs.
//!
//! ## Features
//!
//! - **Cache-aside reads**: `get_with`, `hget_with` and `smembers_with` run a
//!   producer on a miss and write its value back
//! - **Sliding expiry**: every write and every hit resets the key's TTL
//! - **Batching**: a [`Pipeline`] submits queued writes and deletes as one
//!   atomic round trip
//! - **Pluggable stores**: an in-process [`MemoryStore`] and, with the `redis`
//!   feature, a Redis-backed `RedisStore`
//! - **Statistics**: hits, misses, computes, writes and batches
//!
//! ## Quick Start
//!
//! ```rust
//! use cache_aside::{Cache, MemoryStore, Options};
//! use std::convert::Infallible;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), cache_aside::CacheError> {
//! let cache = Cache::new(MemoryStore::new());
//! let opts = Options::new().key(["user", "123"]).expire(300);
//!
//! // Computed on the first call, served from the store afterwards
//! let name: String = cache
//!     .get_with(&opts, || async { Ok::<_, Infallible>("Alice".to_string()) })
//!     .await?;
//! assert_eq!(name, "Alice");
//!
//! // Batch several writes into one round trip
//! let mut batch = cache.pipeline();
//! batch
//!     .hset(&Options::new().key("user:123").field("age").expire(300), &42)?
//!     .del(["session:abc"])?;
//! batch.run().await?;
//!
//! println!("Hit rate: {:.1}%", cache.stats().hit_rate);
//! # Ok(())
//! # }
//! ```
//!
//! ## Sharing
//!
//! Cloning a `Cache` creates a new handle to the same store and statistics,
//! so it can be moved into spawned tasks freely.

pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stats;

pub use cache::Cache;
pub use config::{CacheConfig, Populate};
pub use error::{BoxError, CacheError, CacheResult, StoreError, StoreResult};
pub use pipeline::Pipeline;
pub use stats::{CacheStats, StatsSnapshot};

pub mod codec;
pub mod command;
pub mod key;
pub mod options;
pub mod store;

pub use command::{Command, Reply};
pub use key::Key;
pub use options::Options;
pub use store::{MemoryStore, Store};

#[cfg(feature = "redis")]
pub use store::RedisStore;

// Translation of operations into store commands
pub(crate) mod plan;

pub mod cli;
pub use cli::{Cli, ClientCommand};
