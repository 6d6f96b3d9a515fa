//! Translation of cache operations into store commands.
//!
//! Both façades go through these functions: [`Cache`](crate::Cache) issues
//! the returned commands one by one, [`Pipeline`](crate::Pipeline) queues
//! them. Every write is paired with a trailing `Expire` so the TTL is reset
//! on each write whichever way it is executed.

use serde::Serialize;

use crate::codec;
use crate::command::Command;
use crate::error::{CacheError, CacheResult};
use crate::key::Key;
use crate::options::{Options, Resolved, DELETE};

/// TTL refresh for `key`.
pub(crate) fn touch(key: &str, expire: u64) -> Command {
    Command::Expire {
        key: key.to_string(),
        seconds: expire,
    }
}

pub(crate) fn set<T: Serialize + ?Sized>(
    target: &Resolved,
    value: &T,
) -> CacheResult<[Command; 2]> {
    Ok([
        Command::Set {
            key: target.key.clone(),
            value: codec::encode(value)?,
        },
        touch(&target.key, target.expire),
    ])
}

pub(crate) fn hset<T: Serialize + ?Sized>(
    target: &Resolved,
    value: &T,
) -> CacheResult<[Command; 2]> {
    Ok([
        Command::HSet {
            key: target.key.clone(),
            field: target.require_field()?.to_string(),
            value: codec::encode(value)?,
        },
        touch(&target.key, target.expire),
    ])
}

pub(crate) fn sadd(target: &Resolved, members: Vec<String>) -> CacheResult<[Command; 2]> {
    if members.is_empty() {
        return Err(CacheError::invalid("sadd requires at least one member"));
    }
    Ok([
        Command::SAdd {
            key: target.key.clone(),
            members,
        },
        touch(&target.key, target.expire),
    ])
}

pub(crate) fn hincrby(target: &Resolved, delta: i64) -> CacheResult<[Command; 2]> {
    Ok([
        Command::HIncrBy {
            key: target.key.clone(),
            field: target.require_field()?.to_string(),
            delta,
        },
        touch(&target.key, target.expire),
    ])
}

/// One `Del` per key.
pub(crate) fn del<I, K>(keys: I) -> Vec<Command>
where
    I: IntoIterator<Item = K>,
    K: Into<Key>,
{
    keys.into_iter()
        .map(|key| Command::Del {
            key: key.into().normalize(),
        })
        .collect()
}

/// `HDel` for targets naming a field, `Del` of the whole key otherwise.
pub(crate) fn hdel<'a, I>(targets: I) -> CacheResult<Vec<Command>>
where
    I: IntoIterator<Item = &'a Options>,
{
    targets
        .into_iter()
        .map(|opts| -> CacheResult<Command> {
            let target = opts.validate(&DELETE)?;
            Ok(match target.field {
                Some(field) => Command::HDel {
                    key: target.key,
                    field,
                },
                None => Command::Del { key: target.key },
            })
        })
        .collect()
}
