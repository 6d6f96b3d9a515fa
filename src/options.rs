//! Per-operation options and their validation.
//!
//! Every cache operation takes an [`Options`] describing where the value
//! lives (`key`, optionally `field`) and how long it should live (`expire`).
//! Validation never touches the caller's options; it returns a [`Resolved`]
//! copy with the key and field already normalized.

use serde_json::Value;

use crate::error::{CacheError, CacheResult};
use crate::key::Key;

/// Options for a single cache operation.
///
/// ```
/// use cache_aside::Options;
///
/// let opts = Options::new().key(["user", "42"]).field("profile").expire(600);
/// let resolved = opts.validate(&cache_aside::options::HASH).unwrap();
/// assert_eq!(resolved.key, "user:42");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub(crate) key: Option<Key>,
    pub(crate) field: Option<Key>,
    pub(crate) expire: Option<u64>,
}

/// A property that an operation may require on its [`Options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prop {
    Key,
    Field,
    Expire,
}

impl Prop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prop::Key => "key",
            Prop::Field => "field",
            Prop::Expire => "expire",
        }
    }
}

/// Requirements for scalar and set operations.
pub const SCALAR: [Prop; 2] = [Prop::Key, Prop::Expire];

/// Requirements for hash-field operations.
pub const HASH: [Prop; 3] = [Prop::Key, Prop::Field, Prop::Expire];

/// Requirements for deletions.
pub const DELETE: [Prop; 1] = [Prop::Key];

/// Options after validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub key: String,
    pub field: Option<String>,
    pub expire: u64,
}

impl Resolved {
    /// The normalized field, required by hash operations.
    pub(crate) fn require_field(&self) -> CacheResult<&str> {
        self.field
            .as_deref()
            .ok_or_else(|| CacheError::invalid("missing required property `field`"))
    }
}

impl Options {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the hash field.
    pub fn field(mut self, field: impl Into<Key>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the time-to-live in seconds.
    pub fn expire(mut self, seconds: u64) -> Self {
        self.expire = Some(seconds);
        self
    }

    /// Build options from dynamically typed input such as a request body.
    ///
    /// A `key` or `field` that is neither a string nor an array of strings,
    /// or an `expire` that is not a non-negative integer, is rejected with
    /// [`CacheError::InvalidArgument`].
    pub fn from_json(value: Value) -> CacheResult<Self> {
        let Value::Object(map) = value else {
            return Err(CacheError::invalid("options must be an object"));
        };

        let key = map.get("key").map(Key::from_json).transpose()?;
        let field = map.get("field").map(Key::from_json).transpose()?;
        let expire = match map.get("expire") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_u64()
                    .ok_or_else(|| CacheError::invalid("expire must be a non-negative integer"))?,
            ),
        };

        Ok(Self { key, field, expire })
    }

    pub fn get_key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn get_field(&self) -> Option<&Key> {
        self.field.as_ref()
    }

    pub fn get_expire(&self) -> Option<u64> {
        self.expire
    }

    /// Check that every property in `required` is present and non-empty,
    /// then return a normalized copy.
    pub fn validate(&self, required: &[Prop]) -> CacheResult<Resolved> {
        let key = self.key.as_ref().map(Key::normalize);
        let field = self.field.as_ref().map(Key::normalize);

        for prop in required {
            let present = match prop {
                Prop::Key => key.as_deref().is_some_and(|k| !k.is_empty()),
                Prop::Field => field.as_deref().is_some_and(|f| !f.is_empty()),
                Prop::Expire => self.expire.is_some_and(|e| e > 0),
            };
            if !present {
                return Err(CacheError::invalid(format!(
                    "missing required property `{}`",
                    prop.as_str()
                )));
            }
        }

        Ok(Resolved {
            key: key.unwrap_or_default(),
            field: field.filter(|f| !f.is_empty()),
            expire: self.expire.unwrap_or_default(),
        })
    }
}
