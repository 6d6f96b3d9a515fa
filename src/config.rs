//! Configuration for the cache façade.
//!
//! This module provides a builder for the behaviour of [`Cache`](crate::Cache)
//! that is not tied to a single operation.

/// How a value computed on a cache miss is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Populate {
    /// Spawn the write on the runtime and return the computed value right
    /// away. A reader arriving immediately afterwards may still miss.
    #[default]
    Detached,
    /// Wait for the write to finish before returning the computed value.
    Awaited,
}

/// Configuration for creating a new cache façade.
///
/// ```
/// use cache_aside::{CacheConfig, Populate};
///
/// let config = CacheConfig::new().populate(Populate::Awaited).build();
/// assert_eq!(config.get_populate(), Populate::Awaited);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Write-back policy for values produced on a miss.
    pub(crate) populate: Populate,
}

impl CacheConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write-back policy for values produced on a miss.
    pub fn populate(mut self, populate: Populate) -> Self {
        self.populate = populate;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Self {
        self
    }

    /// Get the write-back policy.
    pub fn get_populate(&self) -> Populate {
        self.populate
    }
}
