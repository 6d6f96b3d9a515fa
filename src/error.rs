//! Error types for the cache-aside layer.
//!
//! Every failure is scoped to the operation that triggered it. Nothing here is
//! retried: argument and serialization problems surface before or instead of
//! I/O, and store failures are handed back to the caller as they were reported.

use thiserror::Error;

/// Boxed error returned by caller-supplied producers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A key, field or required option was malformed or missing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A value could not be encoded for storage, or a stored value could not
    /// be decoded into the requested type.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The underlying store reported a failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The producer invoked on a cache miss failed.
    #[error("producer failed: {0}")]
    Producer(#[source] BoxError),
}

impl CacheError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CacheError::InvalidArgument(reason.into())
    }
}

/// Failures reported by a [`Store`](crate::store::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key holds a different data shape than the command expects.
    #[error("WRONGTYPE operation against key '{key}' holding the wrong kind of value")]
    WrongType { key: String },

    /// `hincrby` was applied to a field that does not hold an integer.
    #[error("hash value at '{key}'/'{field}' is not an integer")]
    NotAnInteger { key: String, field: String },

    /// `hincrby` would overflow a signed 64-bit integer.
    #[error("increment at '{key}'/'{field}' would overflow")]
    Overflow { key: String, field: String },

    /// `sadd` was issued without any members.
    #[error("sadd on '{key}' requires at least one member")]
    EmptyMembers { key: String },

    /// The store could not serve the request at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "redis")]
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

/// A specialized Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// A specialized Result type for store primitives.
pub type StoreResult<T> = Result<T, StoreError>;
