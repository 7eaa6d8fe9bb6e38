//! # redlog
//!
//! Ships structured log records onto a Redis list used as a queue, across one
//! or more Redis endpoints.
//!
//! This facade re-exports the workspace crates:
//!
//! - [`redlog_core`]: raw settings, validated [`PoolConfig`], [`Message`] and [`Record`]
//! - [`redlog_redis`]: connection pools, random pool selection, pipelined publishing
//!
//! ```rust,no_run
//! use redlog_workspace::{Message, RawSettings, RedisClient};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RawSettings::from_env().validate()?;
//! let client = RedisClient::initialize(&config)?;
//! client.publish(&[Message::from(r#"{"level":"info"}"#)])?;
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

pub use redlog_core;
pub use redlog_redis;

pub use redlog_core::{ConfigError, Endpoint, Message, PoolConfig, RawSettings, Record};
pub use redlog_redis::{Delivery, PoolSettings, RedisClient, SinkError, SinkResult};
