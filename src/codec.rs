//! Value encoding at the store boundary.
//!
//! Scalar and hash values are stored as JSON text. Set members are stored as
//! plain text: a string member is kept as-is, and any other value is stored as
//! its JSON rendering. So `1` and `"1"` end up as the same member.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::CacheResult;

/// Encode a value as JSON text.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode JSON text into the requested type.
pub fn decode<T: DeserializeOwned>(raw: &str) -> CacheResult<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Encode a value as a set member.
pub fn member<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    Ok(match serde_json::to_value(value)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Encode every item of a collection as set members.
pub fn members<I, T>(items: I) -> CacheResult<Vec<String>>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    items.into_iter().map(|item| member(&item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_encode_decode_object() {
        let mut value = BTreeMap::new();
        value.insert("a", "I'm a");
        value.insert("b", "I'm b");

        let raw = encode(&value).unwrap();
        assert_eq!(raw, r#"{"a":"I'm a","b":"I'm b"}"#);

        let back: BTreeMap<String, String> = decode(&raw).unwrap();
        assert_eq!(back.get("a").map(String::as_str), Some("I'm a"));
    }

    #[test]
    fn test_strings_are_quoted() {
        assert_eq!(encode("value1").unwrap(), "\"value1\"");
    }

    #[test]
    fn test_decode_into_wrong_type_fails() {
        let err = decode::<u32>("\"text\"").unwrap_err();
        assert!(matches!(err, crate::CacheError::Serialization(_)));
    }

    #[test]
    fn test_members_are_plain_text() {
        let encoded = members([json!(1), json!("2"), json!(3)]).unwrap();
        assert_eq!(encoded, vec!["1", "2", "3"]);
        assert_eq!(member("plain").unwrap(), "plain");
        assert_eq!(member(&2.5).unwrap(), "2.5");
    }
}
