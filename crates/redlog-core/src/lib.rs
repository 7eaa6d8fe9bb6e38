//! # redlog core
//!
//! Configuration and payload types shared by the redlog crates.
//!
//! ## Contents
//!
//! - **[RawSettings]**: the six raw connection strings, sourced from the
//!   environment, a host lookup, or command line flags
//! - **[PoolConfig]**: the validated, typed configuration the pool layer is built from
//! - **[Message]**: an opaque, already serialized payload pushed onto the destination list
//! - **[Record]**: builds a JSON [Message] from a log record, a tag and a timestamp
//!
//! ## Example
//!
//! ```rust
//! use redlog_core::RawSettings;
//!
//! let config = RawSettings::default()
//!     .with_hosts("10.0.0.1:6380 10.0.0.2")
//!     .with_key("app-logs")
//!     .validate()
//!     .expect("valid configuration");
//!
//! assert_eq!(config.endpoints().len(), 2);
//! assert_eq!(config.endpoints()[1].port(), 6379);
//! assert_eq!(config.destination_key(), "app-logs");
//! ```

pub mod collections;
pub mod config;
pub mod error;
pub mod message;
pub mod record;
pub mod security;

pub use collections::{EmptyVecError, NonEmptyVec};
pub use config::{DEFAULT_HOSTS, DEFAULT_KEY, DEFAULT_PORT, Endpoint, PoolConfig, RawSettings};
pub use error::{ConfigError, ConfigResult};
pub use message::Message;
pub use record::{Record, RecordError};
pub use security::SecretString;
