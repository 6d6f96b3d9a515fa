//! Redis-backed store.
//!
//! One `ConnectionManager` is opened per `RedisStore` and cloned into every
//! call; the manager multiplexes requests over a single connection and
//! reconnects on its own. Batches are sent as `MULTI`/`EXEC` pipelines.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Cmd, Value as RedisValue};

use super::Store;
use crate::command::{Command, Reply};
use crate::error::StoreResult;

/// [`Store`] implementation over a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the server at `url`, e.g. `redis://127.0.0.1:6379/0`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::debug!("connected to redis at {}", url);
        Ok(Self { conn })
    }

    /// Wrap an existing connection manager.
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("conn", &"<redis::aio::ConnectionManager>")
            .finish()
    }
}

/// Translate a queued command into a Redis command.
fn to_cmd(command: &Command) -> Cmd {
    let mut cmd = redis::cmd(command.as_str());
    match command {
        Command::Set { key, value } => {
            cmd.arg(key).arg(value);
        }
        Command::Del { key } => {
            cmd.arg(key);
        }
        Command::HSet { key, field, value } => {
            cmd.arg(key).arg(field).arg(value);
        }
        Command::HDel { key, field } => {
            cmd.arg(key).arg(field);
        }
        Command::HIncrBy { key, field, delta } => {
            cmd.arg(key).arg(field).arg(*delta);
        }
        Command::SAdd { key, members } => {
            cmd.arg(key).arg(members);
        }
        Command::Expire { key, seconds } => {
            cmd.arg(key).arg(*seconds);
        }
        Command::FlushDb => {}
    }
    cmd
}

fn to_reply(value: RedisValue) -> Reply {
    match value {
        RedisValue::Nil => Reply::Nil,
        RedisValue::Okay => Reply::Ok,
        RedisValue::Int(n) => Reply::Int(n),
        RedisValue::BulkString(bytes) => Reply::Bulk(String::from_utf8_lossy(&bytes).into_owned()),
        RedisValue::SimpleString(s) => Reply::Bulk(s),
        other => Reply::Bulk(format!("{:?}", other)),
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        let removed: u64 = redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;
        Ok(removed)
    }

    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool> {
        let mut conn = self.conn();
        let set: bool = redis::cmd("EXPIRE")
            .arg(key)
            .arg(seconds)
            .query_async(&mut conn)
            .await?;
        Ok(set)
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn();
        let value: Option<String> = redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        let mut conn = self.conn();
        let added: bool = redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(added)
    }

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<u64> {
        let mut conn = self.conn();
        let removed: u64 = redis::cmd("HDEL")
            .arg(key)
            .arg(field)
            .query_async(&mut conn)
            .await?;
        Ok(removed)
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64> {
        let mut conn = self.conn();
        let value: i64 = redis::cmd("HINCRBY")
            .arg(key)
            .arg(field)
            .arg(delta)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> StoreResult<u64> {
        let mut conn = self.conn();
        let added: u64 = redis::cmd("SADD")
            .arg(key)
            .arg(members)
            .query_async(&mut conn)
            .await?;
        Ok(added)
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn();
        let members: Vec<String> = redis::cmd("SMEMBERS").arg(key).query_async(&mut conn).await?;
        Ok(members)
    }

    async fn flushdb(&self) -> StoreResult<()> {
        let mut conn = self.conn();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn exec(&self, commands: &[Command]) -> StoreResult<Vec<Reply>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in commands {
            pipe.add_command(to_cmd(command));
        }

        let mut conn = self.conn();
        let values: Vec<RedisValue> = pipe.query_async(&mut conn).await?;
        Ok(values.into_iter().map(to_reply).collect())
    }
}
