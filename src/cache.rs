//! The main cache interface.
//!
//! [`Cache`] executes every operation against the store right away. Reads
//! follow the cache-aside protocol: a hit refreshes the key's TTL and
//! returns the stored value, a miss optionally runs a producer, writes the
//! produced value back and returns it. Batched execution lives in
//! [`Pipeline`](crate::Pipeline), obtained through [`Cache::pipeline`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::codec;
use crate::command::{Command, Reply};
use crate::config::{CacheConfig, Populate};
use crate::error::{BoxError, CacheError, CacheResult, StoreError};
use crate::key::Key;
use crate::options::{Options, Resolved, HASH, SCALAR};
use crate::pipeline::Pipeline;
use crate::plan;
use crate::stats::{CacheStats, StatsSnapshot};
use crate::store::{dispatch_all, Store};

/// Cache-aside façade over a [`Store`].
///
/// Cloning a `Cache` creates a new handle to the same store and statistics.
///
/// # Example
/// ```
/// use cache_aside::{Cache, MemoryStore, Options};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), cache_aside::CacheError> {
/// let cache = Cache::new(MemoryStore::new());
/// let opts = Options::new().key(["user", "42"]).expire(600);
///
/// cache.set(&opts, "Alice").await?;
/// let name: Option<String> = cache.get(&opts).await?;
/// assert_eq!(name.as_deref(), Some("Alice"));
/// # Ok(())
/// # }
/// ```
pub struct Cache<S: Store> {
    /// Store handle, shared with clones and pipelines.
    store: Arc<S>,

    config: CacheConfig,

    stats: Arc<CacheStats>,
}

impl<S: Store> Cache<S> {
    /// Create a cache over `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store), CacheConfig::default())
    }

    /// Create a cache over `store` with the given configuration.
    pub fn with_config(store: S, config: CacheConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create a cache over a store handle the caller keeps as well.
    pub fn from_shared(store: Arc<S>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Start a batch.
    ///
    /// The returned pipeline shares this cache's store and queues every
    /// operation until [`Pipeline::run`] submits them as one atomic unit.
    pub fn pipeline(&self) -> Pipeline<S> {
        Pipeline::new(Arc::clone(&self.store), Arc::clone(&self.stats))
    }

    /// Remove every key in the store.
    pub async fn flushdb(&self) -> CacheResult<()> {
        self.store.flushdb().await?;
        Ok(())
    }

    /// Reset the TTL of `key`.
    async fn touch(&self, key: &str, expire: u64) -> CacheResult<bool> {
        Ok(self.store.expire(key, expire).await?)
    }

    /// Issue a write and its TTL refresh, in that order.
    async fn write(&self, commands: [Command; 2]) -> CacheResult<bool> {
        self.stats.record_write();
        let refreshed = dispatch_all(&*self.store, &commands).await?;
        Ok(refreshed.as_int() == Some(1))
    }

    // Scalar values

    /// Store `value` under `opts.key` and reset its TTL to `opts.expire`.
    ///
    /// Returns whether the TTL was applied.
    pub async fn set<T: Serialize + ?Sized>(&self, opts: &Options, value: &T) -> CacheResult<bool> {
        let target = opts.validate(&SCALAR)?;
        self.write(plan::set(&target, value)?).await
    }

    /// Read the value under `opts.key`.
    ///
    /// A hit resets the TTL. A miss returns `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(&self, opts: &Options) -> CacheResult<Option<T>> {
        let target = opts.validate(&SCALAR)?;
        let raw = self.store.get(&target.key).await?;
        self.hit_or_miss(&target, raw).await
    }

    /// Read the value under `opts.key`, computing and storing it on a miss.
    ///
    /// `producer` runs only on a miss. Its value is written back according to
    /// the configured [`Populate`] policy and returned.
    pub async fn get_with<T, F, Fut, E>(&self, opts: &Options, producer: F) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let target = opts.validate(&SCALAR)?;
        let raw = self.store.get(&target.key).await?;
        if let Some(value) = self.hit_or_miss(&target, raw).await? {
            return Ok(value);
        }

        let value = self.compute(&target.key, producer).await?;
        self.populate(&target.key, plan::set(&target, &value)?).await;
        Ok(value)
    }

    /// Remove keys, all in one atomic batch.
    ///
    /// Returns how many keys existed.
    pub async fn del<I, K>(&self, keys: I) -> CacheResult<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.delete(plan::del(keys)).await
    }

    // Hash fields

    /// Store `value` under `opts.key`/`opts.field` and reset the key's TTL.
    pub async fn hset<T: Serialize + ?Sized>(&self, opts: &Options, value: &T) -> CacheResult<bool> {
        let target = opts.validate(&HASH)?;
        self.write(plan::hset(&target, value)?).await
    }

    /// Read the value under `opts.key`/`opts.field`.
    pub async fn hget<T: DeserializeOwned>(&self, opts: &Options) -> CacheResult<Option<T>> {
        let target = opts.validate(&HASH)?;
        let raw = self
            .store
            .hget(&target.key, target.require_field()?)
            .await?;
        self.hit_or_miss(&target, raw).await
    }

    /// Read a hash field, computing and storing it on a miss.
    pub async fn hget_with<T, F, Fut, E>(&self, opts: &Options, producer: F) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let target = opts.validate(&HASH)?;
        let raw = self
            .store
            .hget(&target.key, target.require_field()?)
            .await?;
        if let Some(value) = self.hit_or_miss(&target, raw).await? {
            return Ok(value);
        }

        let value = self.compute(&target.key, producer).await?;
        self.populate(&target.key, plan::hset(&target, &value)?).await;
        Ok(value)
    }

    /// Remove hash fields, or whole keys for targets without a field, all in
    /// one atomic batch.
    ///
    /// Returns how many fields and keys were removed.
    pub async fn hdel<'a, I>(&self, targets: I) -> CacheResult<u64>
    where
        I: IntoIterator<Item = &'a Options>,
    {
        let commands = plan::hdel(targets)?;
        self.delete(commands).await
    }

    /// Add `delta` to the integer under `opts.key`/`opts.field`, then reset
    /// the key's TTL. Returns the new value.
    pub async fn hincrby(&self, opts: &Options, delta: i64) -> CacheResult<i64> {
        let target = opts.validate(&HASH)?;
        self.stats.record_write();
        let value = self
            .store
            .hincrby(&target.key, target.require_field()?, delta)
            .await?;
        self.touch(&target.key, target.expire).await?;
        Ok(value)
    }

    /// [`hincrby`](Self::hincrby) with a delta of 1.
    pub async fn hincr(&self, opts: &Options) -> CacheResult<i64> {
        self.hincrby(opts, 1).await
    }

    // Sets

    /// Add `members` to the set under `opts.key` and reset its TTL.
    ///
    /// Members are stored as text, see [`codec::member`].
    pub async fn sadd<I, M>(&self, opts: &Options, members: I) -> CacheResult<bool>
    where
        I: IntoIterator<Item = M>,
        M: Serialize,
    {
        let target = opts.validate(&SCALAR)?;
        self.write(plan::sadd(&target, codec::members(members)?)?)
            .await
    }

    /// Read every member of the set under `opts.key`.
    ///
    /// An empty or missing set is a miss and returns `Ok(None)`.
    pub async fn smembers(&self, opts: &Options) -> CacheResult<Option<Vec<String>>> {
        let target = opts.validate(&SCALAR)?;
        self.read_members(&target).await
    }

    /// Read a set, computing and storing its members on a miss.
    ///
    /// Produced members are returned in their stored text form.
    pub async fn smembers_with<I, M, F, Fut, E>(
        &self,
        opts: &Options,
        producer: F,
    ) -> CacheResult<Vec<String>>
    where
        I: IntoIterator<Item = M>,
        M: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<I, E>>,
        E: Into<BoxError>,
    {
        let target = opts.validate(&SCALAR)?;
        if let Some(members) = self.read_members(&target).await? {
            return Ok(members);
        }

        let produced = self.compute(&target.key, producer).await?;
        let members = codec::members(produced)?;
        // A set cannot hold zero members, so there is nothing to write back.
        if !members.is_empty() {
            self.populate(&target.key, plan::sadd(&target, members.clone())?)
                .await;
        }
        Ok(members)
    }

    // Internal helpers

    async fn hit_or_miss<T: DeserializeOwned>(
        &self,
        target: &Resolved,
        raw: Option<String>,
    ) -> CacheResult<Option<T>> {
        match raw {
            Some(raw) => {
                self.stats.record_hit();
                tracing::debug!("cache hit for '{}'", target.key);
                self.touch(&target.key, target.expire).await?;
                codec::decode(&raw).map(Some)
            }
            None => {
                self.stats.record_miss();
                tracing::debug!("cache miss for '{}'", target.key);
                Ok(None)
            }
        }
    }

    async fn read_members(&self, target: &Resolved) -> CacheResult<Option<Vec<String>>> {
        let members = self.store.smembers(&target.key).await?;
        if members.is_empty() {
            self.stats.record_miss();
            tracing::debug!("cache miss for set '{}'", target.key);
            return Ok(None);
        }

        self.stats.record_hit();
        tracing::debug!("cache hit for set '{}' ({} members)", target.key, members.len());
        self.touch(&target.key, target.expire).await?;
        Ok(Some(members))
    }

    async fn compute<V, F, Fut, E>(&self, key: &str, producer: F) -> CacheResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Into<BoxError>,
    {
        self.stats.record_compute();
        tracing::debug!("computing value for '{}'", key);
        producer()
            .await
            .map_err(|err| CacheError::Producer(err.into()))
    }

    /// Write back a value produced after a miss.
    ///
    /// Failures are logged and counted but never reach the caller, who
    /// already holds the produced value.
    async fn populate(&self, key: &str, commands: [Command; 2]) {
        self.stats.record_write();
        match self.config.populate {
            Populate::Awaited => {
                if let Err(err) = dispatch_all(&*self.store, &commands).await {
                    populate_failed(&self.stats, key, &err);
                }
            }
            Populate::Detached => {
                let store = Arc::clone(&self.store);
                let stats = Arc::clone(&self.stats);
                let key = key.to_string();
                tokio::spawn(async move {
                    if let Err(err) = dispatch_all(&*store, &commands).await {
                        populate_failed(&stats, &key, &err);
                    }
                });
            }
        }
    }

    /// Submit deletions as one atomic batch.
    async fn delete(&self, commands: Vec<Command>) -> CacheResult<u64> {
        if commands.is_empty() {
            return Ok(0);
        }

        self.stats.record_batch();
        let replies = self.store.exec(&commands).await?;
        self.stats.record_deletes(commands.len() as u64);
        Ok(replies
            .iter()
            .filter_map(Reply::as_int)
            .map(|n| n.max(0) as u64)
            .sum())
    }
}

fn populate_failed(stats: &CacheStats, key: &str, err: &StoreError) {
    stats.record_populate_failure();
    tracing::warn!("failed to write back '{}' after a miss: {}", key, err);
}

impl<S: Store> Clone for Cache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<S: Store> std::fmt::Debug for Cache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.config)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}
