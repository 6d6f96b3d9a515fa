//! In-process store.
//!
//! `MemoryStore` keeps the whole keyspace in an `IndexMap` behind one
//! read-write lock and follows the Redis semantics the cache façade relies
//! on: lazy TTL expiry, `SET` clearing the TTL, type errors across shapes,
//! and all-or-nothing batches. It is the store used by the test-suite and a
//! drop-in backend for single-process deployments.
//!
//! Batches are applied in place. Before each command the previous state of
//! the key it touches is saved, and a failing command replays those saves
//! in reverse, so a batch costs time in the keys it touches rather than in
//! the size of the keyspace.

use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};

use super::entry::{Entry, Value};
use super::Store;
use crate::command::{Command, Reply};
use crate::error::{StoreError, StoreResult};

type Keyspace = IndexMap<String, Entry>;

/// Thread-safe in-memory implementation of [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// The keyspace. Every command, single or batched, runs under the write
    /// lock, which makes each of them atomic.
    entries: RwLock<Keyspace>,

    /// Number of store calls served, one per command or batch.
    round_trips: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls served so far. A batch counts once.
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    /// Remaining time-to-live of `key`.
    ///
    /// Returns `None` if the key does not exist or has no TTL.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .and_then(|entry| entry.ttl_at(now))
    }

    /// Check if a key exists (and is not expired).
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        match self.entries.read() {
            Ok(entries) => entries
                .get(key)
                .is_some_and(|entry| !entry.is_expired_at(now)),
            Err(_) => false,
        }
    }

    /// Get the number of keys.
    ///
    /// Note: This may include expired entries that haven't been purged yet.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all expired entries, returning how many were dropped.
    ///
    /// Expired keys are otherwise only removed when they are next touched.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    /// Run `f` against the keyspace as one round trip.
    fn with_keyspace<T>(
        &self,
        f: impl FnOnce(&mut Keyspace, Instant) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.write_lock()?;
        f(&mut *entries, Instant::now())
    }

    fn write_lock(&self) -> StoreResult<RwLockWriteGuard<'_, Keyspace>> {
        self.entries
            .write()
            .map_err(|_| StoreError::Unavailable("keyspace lock poisoned".to_string()))
    }

    fn apply_one(&self, command: Command) -> StoreResult<Reply> {
        self.with_keyspace(|keyspace, now| apply(keyspace, &command, now))
    }
}

/// Drop `key` if its deadline has passed.
fn purge(keyspace: &mut Keyspace, key: &str, now: Instant) {
    if keyspace
        .get(key)
        .is_some_and(|entry| entry.is_expired_at(now))
    {
        keyspace.swap_remove(key);
    }
}

fn live<'a>(keyspace: &'a mut Keyspace, key: &str, now: Instant) -> Option<&'a mut Entry> {
    purge(keyspace, key, now);
    keyspace.get_mut(key)
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

fn hash_mut<'a>(
    keyspace: &'a mut Keyspace,
    key: &str,
    now: Instant,
) -> StoreResult<&'a mut IndexMap<String, String>> {
    purge(keyspace, key, now);
    let entry = keyspace
        .entry(key.to_string())
        .or_insert_with(|| Entry::new(Value::Hash(IndexMap::new())));
    match &mut entry.value {
        Value::Hash(hash) => Ok(hash),
        _ => Err(wrong_type(key)),
    }
}

fn set_mut<'a>(
    keyspace: &'a mut Keyspace,
    key: &str,
    now: Instant,
) -> StoreResult<&'a mut IndexSet<String>> {
    purge(keyspace, key, now);
    let entry = keyspace
        .entry(key.to_string())
        .or_insert_with(|| Entry::new(Value::Set(IndexSet::new())));
    match &mut entry.value {
        Value::Set(set) => Ok(set),
        _ => Err(wrong_type(key)),
    }
}

fn flag(b: bool) -> Reply {
    Reply::Int(i64::from(b))
}

/// Apply a single write command to the keyspace.
fn apply(keyspace: &mut Keyspace, command: &Command, now: Instant) -> StoreResult<Reply> {
    match command {
        Command::Set { key, value } => {
            keyspace.insert(key.clone(), Entry::new(Value::Str(value.clone())));
            Ok(Reply::Ok)
        }

        Command::Del { key } => {
            purge(keyspace, key, now);
            Ok(flag(keyspace.swap_remove(key).is_some()))
        }

        Command::HSet { key, field, value } => {
            let hash = hash_mut(keyspace, key, now)?;
            Ok(flag(hash.insert(field.clone(), value.clone()).is_none()))
        }

        Command::HDel { key, field } => {
            let Some(entry) = live(keyspace, key, now) else {
                return Ok(Reply::Int(0));
            };
            let Value::Hash(hash) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            let removed = hash.swap_remove(field).is_some();
            if hash.is_empty() {
                keyspace.swap_remove(key);
            }
            Ok(flag(removed))
        }

        Command::HIncrBy { key, field, delta } => {
            let hash = hash_mut(keyspace, key, now)?;
            let current = match hash.get(field) {
                Some(raw) => raw.parse::<i64>().map_err(|_| StoreError::NotAnInteger {
                    key: key.clone(),
                    field: field.clone(),
                })?,
                None => 0,
            };
            let next = current
                .checked_add(*delta)
                .ok_or_else(|| StoreError::Overflow {
                    key: key.clone(),
                    field: field.clone(),
                })?;
            hash.insert(field.clone(), next.to_string());
            Ok(Reply::Int(next))
        }

        Command::SAdd { key, members } => {
            if members.is_empty() {
                return Err(StoreError::EmptyMembers { key: key.clone() });
            }
            let set = set_mut(keyspace, key, now)?;
            let added = members
                .iter()
                .filter(|member| set.insert((*member).clone()))
                .count();
            Ok(Reply::Int(added as i64))
        }

        Command::Expire { key, seconds } => {
            let Some(entry) = live(keyspace, key, now) else {
                return Ok(Reply::Int(0));
            };
            if *seconds == 0 {
                keyspace.swap_remove(key);
            } else {
                entry.expire_after(now, Duration::from_secs(*seconds));
            }
            Ok(Reply::Int(1))
        }

        Command::FlushDb => {
            keyspace.clear();
            Ok(Reply::Ok)
        }
    }
}

/// State a batch command is about to overwrite.
enum Undo {
    /// The entry under one key, `None` if the key was absent.
    Key(String, Option<Entry>),
    /// The whole keyspace, saved before a flush.
    Keyspace(Keyspace),
}

fn save(keyspace: &mut Keyspace, command: &Command) -> Undo {
    match command.key() {
        Some(key) => Undo::Key(key.to_string(), keyspace.get(key).cloned()),
        // Flush is the only keyless command.
        None => Undo::Keyspace(std::mem::take(keyspace)),
    }
}

fn rollback(keyspace: &mut Keyspace, undo: Vec<Undo>) {
    for step in undo.into_iter().rev() {
        match step {
            Undo::Key(key, Some(entry)) => {
                keyspace.insert(key, entry);
            }
            Undo::Key(key, None) => {
                keyspace.swap_remove(&key);
            }
            Undo::Keyspace(saved) => *keyspace = saved,
        }
    }
}

fn count(reply: Reply) -> u64 {
    reply.as_int().map(|n| n.max(0) as u64).unwrap_or(0)
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_keyspace(|keyspace, now| match live(keyspace, key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Str(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.apply_one(Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        })
        .map(|_| ())
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        self.with_keyspace(|keyspace, now| {
            keys.iter().try_fold(0u64, |removed, key| -> StoreResult<u64> {
                let reply = apply(keyspace, &Command::Del { key: key.clone() }, now)?;
                Ok(removed + count(reply))
            })
        })
    }

    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool> {
        self.apply_one(Command::Expire {
            key: key.to_string(),
            seconds,
        })
        .map(|reply| count(reply) == 1)
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        self.with_keyspace(|keyspace, now| match live(keyspace, key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Hash(hash),
                ..
            }) => Ok(hash.get(field).cloned()),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        self.apply_one(Command::HSet {
            key: key.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        })
        .map(|reply| count(reply) == 1)
    }

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<u64> {
        self.apply_one(Command::HDel {
            key: key.to_string(),
            field: field.to_string(),
        })
        .map(count)
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64> {
        self.apply_one(Command::HIncrBy {
            key: key.to_string(),
            field: field.to_string(),
            delta,
        })
        .map(|reply| reply.as_int().unwrap_or_default())
    }

    async fn sadd(&self, key: &str, members: &[String]) -> StoreResult<u64> {
        self.apply_one(Command::SAdd {
            key: key.to_string(),
            members: members.to_vec(),
        })
        .map(count)
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        self.with_keyspace(|keyspace, now| match live(keyspace, key, now) {
            None => Ok(Vec::new()),
            Some(Entry {
                value: Value::Set(set),
                ..
            }) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn flushdb(&self) -> StoreResult<()> {
        self.apply_one(Command::FlushDb).map(|_| ())
    }

    async fn exec(&self, commands: &[Command]) -> StoreResult<Vec<Reply>> {
        self.with_keyspace(|keyspace, now| {
            let mut undo = Vec::with_capacity(commands.len());
            let mut replies = Vec::with_capacity(commands.len());
            for command in commands {
                undo.push(save(keyspace, command));
                match apply(keyspace, command, now) {
                    Ok(reply) => replies.push(reply),
                    Err(err) => {
                        rollback(keyspace, undo);
                        return Err(err);
                    }
                }
            }
            Ok(replies)
        })
    }
}
