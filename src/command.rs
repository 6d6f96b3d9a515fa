//! Store commands that can be queued into an atomic batch.
//!
//! A [`Command`] carries fully normalized and encoded arguments, so a batch
//! can be handed to any [`Store`](crate::store::Store) without further
//! validation. Each command in a batch yields one [`Reply`].

/// A deferred store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a string value, clearing any previous TTL.
    Set { key: String, value: String },
    /// Remove a whole key of any shape.
    Del { key: String },
    /// Store a value under a hash field.
    HSet {
        key: String,
        field: String,
        value: String,
    },
    /// Remove a single hash field.
    HDel { key: String, field: String },
    /// Add `delta` to the integer stored in a hash field.
    HIncrBy {
        key: String,
        field: String,
        delta: i64,
    },
    /// Add members to a set.
    SAdd { key: String, members: Vec<String> },
    /// Set the time-to-live of a key in seconds.
    Expire { key: String, seconds: u64 },
    /// Remove every key in the database.
    FlushDb,
}

impl Command {
    /// Get the command name as the store knows it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Set { .. } => "set",
            Command::Del { .. } => "del",
            Command::HSet { .. } => "hset",
            Command::HDel { .. } => "hdel",
            Command::HIncrBy { .. } => "hincrby",
            Command::SAdd { .. } => "sadd",
            Command::Expire { .. } => "expire",
            Command::FlushDb => "flushdb",
        }
    }

    /// The key this command touches, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Command::Set { key, .. }
            | Command::Del { key }
            | Command::HSet { key, .. }
            | Command::HDel { key, .. }
            | Command::HIncrBy { key, .. }
            | Command::SAdd { key, .. }
            | Command::Expire { key, .. } => Some(key),
            Command::FlushDb => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.key() {
            Some(key) => write!(f, "{} {}", self.as_str(), key),
            None => write!(f, "{}", self.as_str()),
        }
    }
}

/// The result of one command in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// No value.
    Nil,
    /// Plain acknowledgement.
    Ok,
    /// An integer result, e.g. a count of removed keys or a new counter value.
    Int(i64),
    /// A string result.
    Bulk(String),
}

impl Reply {
    /// The integer carried by this reply, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(n) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str() {
        let set = Command::Set {
            key: "k".to_string(),
            value: "\"v\"".to_string(),
        };
        assert_eq!(set.as_str(), "set");
        assert_eq!(Command::FlushDb.as_str(), "flushdb");
    }

    #[test]
    fn test_display() {
        let expire = Command::Expire {
            key: "test:3".to_string(),
            seconds: 600,
        };
        assert_eq!(expire.to_string(), "expire test:3");
        assert_eq!(Command::FlushDb.to_string(), "flushdb");
    }

    #[test]
    fn test_reply_as_int() {
        assert_eq!(Reply::Int(2).as_int(), Some(2));
        assert_eq!(Reply::Ok.as_int(), None);
        assert_eq!(Reply::Nil.as_int(), None);
    }
}
