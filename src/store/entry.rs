//! Stored entry with its data shape and expiration.

use indexmap::{IndexMap, IndexSet};
use std::time::{Duration, Instant};

/// The three data shapes a key can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Hash(IndexMap<String, String>),
    Set(IndexSet<String>),
}

/// A single keyspace entry: the value plus an optional deadline.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) value: Value,

    /// When this entry expires. `None` means no expiration.
    pub(crate) expires_at: Option<Instant>,
}

impl Entry {
    /// Create a new entry with no expiration.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Check if this entry has expired at a given time.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Expire `ttl` after `now`.
    pub fn expire_after(&mut self, now: Instant, ttl: Duration) {
        self.expires_at = Some(now + ttl);
    }

    /// Remaining time to live at `now`, if a deadline is set.
    pub fn ttl_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }
}
