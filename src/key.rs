//! Key representations and normalization.
//!
//! A key (or hash field) is either a single string or an ordered list of
//! segments. Segments are joined with [`KEY_SEPARATOR`] before they reach the
//! store, so `["user", "42"]` and `"user:42"` address the same entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CacheError, CacheResult};

/// Separator placed between key segments.
pub const KEY_SEPARATOR: &str = ":";

const KEY_SHAPE: &str = "key/field must be a string or sequence of strings";

/// A key or field as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// A complete key, used verbatim.
    Single(String),
    /// Segments joined with [`KEY_SEPARATOR`].
    Segments(Vec<String>),
}

impl Key {
    /// Return the canonical string form of this key.
    pub fn normalize(&self) -> String {
        match self {
            Key::Single(key) => key.clone(),
            Key::Segments(segments) => segments.join(KEY_SEPARATOR),
        }
    }

    /// Parse a key from dynamically typed input.
    ///
    /// Only a string or an array of strings is accepted; anything else is an
    /// [`CacheError::InvalidArgument`].
    pub fn from_json(value: &Value) -> CacheResult<Key> {
        match value {
            Value::String(key) => Ok(Key::Single(key.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(segment) => Ok(segment.clone()),
                    _ => Err(CacheError::invalid(KEY_SHAPE)),
                })
                .collect::<CacheResult<Vec<_>>>()
                .map(Key::Segments),
            _ => Err(CacheError::invalid(KEY_SHAPE)),
        }
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Key::Single(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key::Single(key)
    }
}

impl From<&String> for Key {
    fn from(key: &String) -> Self {
        Key::Single(key.clone())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<Vec<String>> for Key {
    fn from(segments: Vec<String>) -> Self {
        Key::Segments(segments)
    }
}

impl From<Vec<&str>> for Key {
    fn from(segments: Vec<&str>) -> Self {
        Key::Segments(segments.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Key {
    fn from(segments: &[&str]) -> Self {
        Key::Segments(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(segments: [&str; N]) -> Self {
        Key::Segments(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_single_passes_through() {
        assert_eq!(Key::from("test1").normalize(), "test1");
        assert_eq!(Key::from("a:b").normalize(), "a:b");
    }

    #[test]
    fn test_segments_are_joined() {
        assert_eq!(Key::from(["test", "3"]).normalize(), "test:3");
        assert_eq!(Key::from(vec!["a", "b", "c"]).normalize(), "a:b:c");
        assert_eq!(Key::Segments(vec![]).normalize(), "");
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Key::from_json(&json!("k")).unwrap(), Key::from("k"));
        assert_eq!(
            Key::from_json(&json!(["test", "3"])).unwrap().normalize(),
            "test:3"
        );
    }

    #[test]
    fn test_from_json_rejects_other_shapes() {
        for bad in [json!(1), json!(null), json!({"k": "v"}), json!(["a", 2])] {
            let err = Key::from_json(&bad).unwrap_err();
            assert!(matches!(err, CacheError::InvalidArgument(_)), "{bad}");
        }
    }

    #[test]
    fn test_untagged_deserialize() {
        let key: Key = serde_json::from_value(json!(["x", "y"])).unwrap();
        assert_eq!(key, Key::Segments(vec!["x".to_string(), "y".to_string()]));
        assert!(serde_json::from_value::<Key>(json!(1)).is_err());
    }

    proptest! {
        #[test]
        fn prop_segments_match_manual_join(segments in prop::collection::vec("[a-z0-9]{1,8}", 1..6)) {
            let expected = segments.join(":");
            let key = Key::Segments(segments.clone());
            prop_assert_eq!(key.normalize(), expected.clone());
            prop_assert_eq!(Key::Single(expected.clone()).normalize(), expected);
        }
    }
}
