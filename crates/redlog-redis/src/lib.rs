//! # redlog Redis backend
//!
//! Ships batches of serialized log records onto a Redis list used as a queue,
//! across one or more Redis endpoints.
//!
//! - [`RedisManager`] dials one endpoint: TLS, `AUTH`, `SELECT`, `PING` checks
//! - [`Pool`] keeps up to three idle connections per endpoint and evicts
//!   those idle for more than 240 seconds
//! - [`PoolSet`] owns one pool per endpoint and picks one uniformly at random per publish
//! - [`send_batch`] pipelines `RPUSH` commands and flushes them once
//! - [`RedisClient`] ties it together behind `initialize` / `publish` / `shutdown`
//!
//! ## Example
//!
//! ```rust,no_run
//! use redlog_core::{Message, RawSettings};
//! use redlog_redis::RedisClient;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RawSettings::from_env().validate()?;
//! let client = RedisClient::initialize(&config)?;
//!
//! client.publish(&[Message::from(r#"{"msg":"hello"}"#)])?;
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod connection;
pub mod error;
pub mod pool;
pub mod pool_set;
pub mod publisher;

pub use client::RedisClient;
pub use connection::{ConnectionManager, RedisConnection, RedisManager};
pub use error::{ConnectionError, Delivery, PoolError, SinkError, SinkResult};
pub use pool::{Pool, PoolSettings, PooledConnection};
pub use pool_set::{PoolSelector, PoolSet, RandomSelector, SeededSelector};
pub use publisher::{PushPipeline, send_batch};
