//! The store boundary.
//!
//! The cache façade needs only a handful of atomic primitives from the
//! backing store, plus one way to submit an ordered list of commands as a
//! single atomic unit. Any key/value/hash/set engine that offers them can be
//! plugged in by implementing [`Store`].

use async_trait::async_trait;

use crate::command::{Command, Reply};
use crate::error::StoreResult;

pub(crate) mod entry;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// Atomic primitives required from a key/value/hash/set store.
///
/// Keys, fields and values arrive already normalized and encoded. Every call
/// is one round trip; [`Store::exec`] is one round trip for the whole batch.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Read a string value.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a string value, clearing any TTL on the key.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove keys, returning how many existed.
    async fn del(&self, keys: &[String]) -> StoreResult<u64>;

    /// Set a key's time-to-live. Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool>;

    /// Read a hash field.
    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    /// Write a hash field. Returns `true` if the field is new.
    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<bool>;

    /// Remove a hash field. Returns how many fields were removed.
    async fn hdel(&self, key: &str, field: &str) -> StoreResult<u64>;

    /// Add `delta` to an integer hash field, returning the new value.
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64>;

    /// Add members to a set. Returns how many were new.
    async fn sadd(&self, key: &str, members: &[String]) -> StoreResult<u64>;

    /// Read every member of a set. A missing key reads as an empty set.
    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Remove every key.
    async fn flushdb(&self) -> StoreResult<()>;

    /// Apply `commands` in order as one atomic batch.
    ///
    /// Either every command applies and one reply per command is returned,
    /// or the whole batch fails with a single error.
    async fn exec(&self, commands: &[Command]) -> StoreResult<Vec<Reply>>;
}

/// Issue one command through the matching single-command primitive.
pub(crate) async fn dispatch<S: Store + ?Sized>(
    store: &S,
    command: &Command,
) -> StoreResult<Reply> {
    Ok(match command {
        Command::Set { key, value } => {
            store.set(key, value).await?;
            Reply::Ok
        }
        Command::Del { key } => Reply::Int(store.del(std::slice::from_ref(key)).await? as i64),
        Command::HSet { key, field, value } => {
            Reply::Int(i64::from(store.hset(key, field, value).await?))
        }
        Command::HDel { key, field } => Reply::Int(store.hdel(key, field).await? as i64),
        Command::HIncrBy { key, field, delta } => {
            Reply::Int(store.hincrby(key, field, *delta).await?)
        }
        Command::SAdd { key, members } => Reply::Int(store.sadd(key, members).await? as i64),
        Command::Expire { key, seconds } => Reply::Int(i64::from(store.expire(key, *seconds).await?)),
        Command::FlushDb => {
            store.flushdb().await?;
            Reply::Ok
        }
    })
}

/// Issue `commands` one after another, each waiting for the previous one.
/// Returns the reply of the last command.
pub(crate) async fn dispatch_all<S: Store + ?Sized>(
    store: &S,
    commands: &[Command],
) -> StoreResult<Reply> {
    let mut last = Reply::Nil;
    for command in commands {
        last = dispatch(store, command).await?;
    }
    Ok(last)
}
