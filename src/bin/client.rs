//! Cache-aside client.
//!
//! This binary provides a CLI for reading and writing cached values in a
//! running Redis server.

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use cache_aside::cli::{parse_value, Cli, ClientCommand};
use cache_aside::{Cache, Options, RedisStore};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let store = match RedisStore::connect(&args.url).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to connect to redis at {}: {}", args.url, e);
            std::process::exit(1);
        }
    };
    let cache = Cache::new(store);
    let expire = args.expire;

    match args.command {
        ClientCommand::Get { key } => {
            let opts = Options::new().key(key.as_str()).expire(expire);
            match cache.get::<Value>(&opts).await? {
                Some(value) => println!("{}", value),
                None => println!("Key '{}' not found", key),
            }
        }

        ClientCommand::Set { key, value } => {
            let opts = Options::new().key(key.as_str()).expire(expire);
            cache.set(&opts, &parse_value(&value)).await?;
            println!("Set key '{}'", key);
        }

        ClientCommand::Del { keys } => {
            let removed = cache.del(&keys).await?;
            println!("Deleted {} key(s)", removed);
        }

        ClientCommand::Hget { key, field } => {
            let opts = Options::new()
                .key(key.as_str())
                .field(field.as_str())
                .expire(expire);
            match cache.hget::<Value>(&opts).await? {
                Some(value) => println!("{}", value),
                None => println!("Field '{}' of '{}' not found", field, key),
            }
        }

        ClientCommand::Hset { key, field, value } => {
            let opts = Options::new()
                .key(key.as_str())
                .field(field.as_str())
                .expire(expire);
            cache.hset(&opts, &parse_value(&value)).await?;
            println!("Set field '{}' of '{}'", field, key);
        }

        ClientCommand::Hdel { key, field } => {
            let mut opts = Options::new().key(key.as_str());
            if let Some(field) = &field {
                opts = opts.field(field.as_str());
            }
            let removed = cache.hdel([&opts]).await?;
            println!("Deleted {} item(s)", removed);
        }

        ClientCommand::Hincrby { key, field, delta } => {
            let opts = Options::new()
                .key(key.as_str())
                .field(field.as_str())
                .expire(expire);
            let value = cache.hincrby(&opts, delta).await?;
            println!("{}", value);
        }

        ClientCommand::Sadd { key, members } => {
            let opts = Options::new().key(key.as_str()).expire(expire);
            let members: Vec<Value> = members.iter().map(|m| parse_value(m)).collect();
            cache.sadd(&opts, members).await?;
            println!("Added to set '{}'", key);
        }

        ClientCommand::Smembers { key } => {
            let opts = Options::new().key(key.as_str()).expire(expire);
            match cache.smembers(&opts).await? {
                Some(members) => {
                    for member in members {
                        println!("{}", member);
                    }
                }
                None => println!("Set '{}' is empty", key),
            }
        }

        ClientCommand::Flushdb => {
            cache.flushdb().await?;
            println!("Flushed database");
        }
    }

    Ok(())
}
