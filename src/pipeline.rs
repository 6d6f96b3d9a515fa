//! Batched execution.
//!
//! A [`Pipeline`] queues commands locally and submits them to the store as
//! one atomic unit on [`Pipeline::run`]. Queued writes carry their TTL
//! refresh with them, so a batch leaves every written key with a fresh
//! expiry.
//!
//! Reads are not offered here: a value computed on a miss cannot be returned
//! before the batch runs, so cache-aside reads only exist on
//! [`Cache`](crate::Cache).

use serde::Serialize;
use std::sync::Arc;

use crate::codec;
use crate::command::{Command, Reply};
use crate::error::CacheResult;
use crate::key::Key;
use crate::options::{Options, HASH, SCALAR};
use crate::plan;
use crate::stats::CacheStats;
use crate::store::Store;

/// A queue of commands submitted in one round trip.
///
/// # Example
/// ```
/// use cache_aside::{Cache, MemoryStore, Options};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), cache_aside::CacheError> {
/// let cache = Cache::new(MemoryStore::new());
/// let opts = Options::new().key("counter").field("hits").expire(60);
///
/// let mut batch = cache.pipeline();
/// batch.hincrby(&opts, 1)?.hincrby(&opts, 2)?;
/// let replies = batch.run().await?;
///
/// assert_eq!(replies.len(), 4);
/// assert!(batch.is_empty());
/// # Ok(())
/// # }
/// ```
///
/// Reads with a producer are only available on [`Cache`](crate::Cache):
///
/// ```compile_fail
/// use cache_aside::{Cache, MemoryStore, Options};
///
/// # async fn demo() {
/// let cache = Cache::new(MemoryStore::new());
/// let mut batch = cache.pipeline();
/// let _ = batch.get_with(&Options::new(), || async {
///     Ok::<_, std::convert::Infallible>(1)
/// });
/// # }
/// ```
pub struct Pipeline<S: Store> {
    store: Arc<S>,

    stats: Arc<CacheStats>,

    /// Commands queued since the last successful run.
    tasks: Vec<Command>,
}

impl<S: Store> Pipeline<S> {
    pub(crate) fn new(store: Arc<S>, stats: Arc<CacheStats>) -> Self {
        Self {
            store,
            stats,
            tasks: Vec::new(),
        }
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The queued commands, in submission order.
    pub fn tasks(&self) -> &[Command] {
        &self.tasks
    }

    /// Queue a scalar write followed by its TTL refresh.
    pub fn set<T: Serialize + ?Sized>(&mut self, opts: &Options, value: &T) -> CacheResult<&mut Self> {
        let target = opts.validate(&SCALAR)?;
        self.tasks.extend(plan::set(&target, value)?);
        self.stats.record_write();
        Ok(self)
    }

    /// Queue a hash field write followed by its TTL refresh.
    pub fn hset<T: Serialize + ?Sized>(&mut self, opts: &Options, value: &T) -> CacheResult<&mut Self> {
        let target = opts.validate(&HASH)?;
        self.tasks.extend(plan::hset(&target, value)?);
        self.stats.record_write();
        Ok(self)
    }

    /// Queue a set insert followed by its TTL refresh.
    pub fn sadd<I, M>(&mut self, opts: &Options, members: I) -> CacheResult<&mut Self>
    where
        I: IntoIterator<Item = M>,
        M: Serialize,
    {
        let target = opts.validate(&SCALAR)?;
        self.tasks
            .extend(plan::sadd(&target, codec::members(members)?)?);
        self.stats.record_write();
        Ok(self)
    }

    /// Queue an increment followed by its TTL refresh.
    pub fn hincrby(&mut self, opts: &Options, delta: i64) -> CacheResult<&mut Self> {
        let target = opts.validate(&HASH)?;
        self.tasks.extend(plan::hincrby(&target, delta)?);
        self.stats.record_write();
        Ok(self)
    }

    /// [`hincrby`](Self::hincrby) with a delta of 1.
    pub fn hincr(&mut self, opts: &Options) -> CacheResult<&mut Self> {
        self.hincrby(opts, 1)
    }

    /// Queue key removals.
    pub fn del<I, K>(&mut self, keys: I) -> CacheResult<&mut Self>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.tasks.extend(plan::del(keys));
        Ok(self)
    }

    /// Queue hash field removals, or whole-key removals for targets without
    /// a field.
    ///
    /// Nothing is queued if any target is invalid.
    pub fn hdel<'a, I>(&mut self, targets: I) -> CacheResult<&mut Self>
    where
        I: IntoIterator<Item = &'a Options>,
    {
        let commands = plan::hdel(targets)?;
        self.tasks.extend(commands);
        Ok(self)
    }

    /// Queue removal of every key.
    pub fn flushdb(&mut self) -> &mut Self {
        self.tasks.push(Command::FlushDb);
        self
    }

    /// Submit the queued commands as one atomic batch.
    ///
    /// Returns one reply per queued command, in order. The queue is cleared
    /// only when the batch succeeds, so a failed batch can be retried as is.
    /// Running an empty pipeline does not touch the store.
    pub async fn run(&mut self) -> CacheResult<Vec<Reply>> {
        if self.tasks.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("running batch of {} commands", self.tasks.len());
        self.stats.record_batch();
        let replies = self.store.exec(&self.tasks).await?;

        let deletes = self
            .tasks
            .iter()
            .filter(|command| matches!(command, Command::Del { .. } | Command::HDel { .. }))
            .count();
        self.stats.record_deletes(deletes as u64);
        self.tasks.clear();
        Ok(replies)
    }
}

impl<S: Store> std::fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::store::MemoryStore;
    use std::collections::HashMap;

    fn pipeline() -> (Arc<MemoryStore>, Pipeline<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let pipeline = Pipeline::new(Arc::clone(&store), Arc::new(CacheStats::new()));
        (store, pipeline)
    }

    #[test]
    fn test_writes_queue_with_refresh() {
        let (_, mut batch) = pipeline();
        let opts = Options::new().key("k").expire(600);

        batch.set(&opts, "v").unwrap().del(["other"]).unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.tasks()[0].as_str(), "set");
        assert_eq!(batch.tasks()[1].as_str(), "expire");
        assert_eq!(batch.tasks()[2].as_str(), "del");
    }

    #[test]
    fn test_invalid_options_queue_nothing() {
        let (_, mut batch) = pipeline();
        let no_field = Options::new().key("h").expire(600);

        let err = batch.hset(&no_field, "v").unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));

        let valid = Options::new().key("h").field("f");
        let no_key = Options::new().field("f");
        assert!(batch.hdel([&valid, &no_key]).is_err());

        assert!(batch.is_empty());
    }

    #[test]
    fn test_unencodable_value_queues_nothing() {
        let (store, mut batch) = pipeline();
        let opts = Options::new().key("k").expire(600);

        // JSON object keys must be strings
        let mut value = HashMap::new();
        value.insert((1, 2), 3);

        let err = batch.set(&opts, &value).unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));

        assert!(batch.is_empty());
        assert_eq!(store.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_empty_run_does_no_io() {
        let (store, mut batch) = pipeline();

        let replies = batch.run().await.unwrap();

        assert!(replies.is_empty());
        assert_eq!(store.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_run_clears_on_success() {
        let (store, mut batch) = pipeline();
        let opts = Options::new().key("k").expire(600);

        batch.set(&opts, &42).unwrap();
        let replies = batch.run().await.unwrap();

        assert_eq!(replies, vec![Reply::Ok, Reply::Int(1)]);
        assert!(batch.is_empty());
        assert_eq!(store.round_trips(), 1);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_queue() {
        let (store, mut batch) = pipeline();
        let scalar = Options::new().key("k").expire(600);
        let hash = Options::new().key("k").field("f").expire(600);

        store.set("k", "\"text\"").await.unwrap();
        batch.hset(&hash, "v").unwrap().set(&scalar, "w").unwrap();

        assert!(batch.run().await.is_err());
        assert_eq!(batch.len(), 4);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("\"text\""));
    }
}
