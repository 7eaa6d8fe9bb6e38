//! Error types for pool and publish operations

use redis::RedisError;
use redlog_core::Endpoint;
use thiserror::Error;

/// Result type for pool and publish operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Failures while selecting or borrowing from a pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No pools are configured
    #[error("pool is empty")]
    Empty,

    /// The selector returned an index with no pool behind it
    #[error("selected pool {index} is out of range ({available} pools)")]
    Missing { index: usize, available: usize },

    /// The pool was closed by shutdown
    #[error("pool for {endpoint} is closed")]
    Closed { endpoint: Endpoint },
}

/// Failures while opening or checking a connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The endpoint could not be turned into a Redis client
    #[error("invalid endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: Endpoint,
        #[source]
        source: RedisError,
    },

    /// TCP connect or TLS negotiation failed
    #[error("failed to connect to {endpoint}: {source}")]
    Dial {
        endpoint: Endpoint,
        #[source]
        source: RedisError,
    },

    #[error("authentication against {endpoint} failed: {source}")]
    Auth {
        endpoint: Endpoint,
        #[source]
        source: RedisError,
    },

    #[error("selecting database {database} on {endpoint} failed: {source}")]
    SelectDatabase {
        endpoint: Endpoint,
        database: i64,
        #[source]
        source: RedisError,
    },

    /// PING on a reused connection failed
    #[error("health check against {endpoint} failed: {source}")]
    HealthCheck {
        endpoint: Endpoint,
        #[source]
        source: RedisError,
    },
}

/// Errors surfaced by [`RedisClient`](crate::RedisClient) and the pool layer.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A message could not be queued; nothing from the batch was sent
    #[error("error setting key {key} to {preview}: {source}")]
    Send {
        key: String,
        preview: String,
        #[source]
        source: RedisError,
    },

    /// The pipeline was queued completely but the flush failed
    #[error("error flushing {count} messages to key {key}: {source}")]
    Flush {
        key: String,
        count: usize,
        #[source]
        source: RedisError,
    },
}

/// What a caller should do with a batch that failed to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Transient failure; the batch may be retried later.
    ///
    /// A retry can duplicate list entries if the failed attempt was partially
    /// delivered.
    Retry,
    /// The client can never deliver this batch
    Drop,
}

impl SinkError {
    /// Classify the failure for the caller's retry policy.
    pub fn delivery(&self) -> Delivery {
        match self {
            SinkError::Pool(_) => Delivery::Drop,
            SinkError::Connection(ConnectionError::InvalidEndpoint { .. }) => Delivery::Drop,
            SinkError::Connection(_) | SinkError::Send { .. } | SinkError::Flush { .. } => {
                Delivery::Retry
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::ErrorKind;

    fn io_error() -> RedisError {
        RedisError::from((ErrorKind::IoError, "broken pipe"))
    }

    #[test]
    fn pool_errors_are_not_retried() {
        assert_eq!(SinkError::from(PoolError::Empty).delivery(), Delivery::Drop);
        let closed = PoolError::Closed {
            endpoint: Endpoint::new("a", 1),
        };
        assert_eq!(closed.to_string(), "pool for a:1 is closed");
        assert_eq!(SinkError::from(closed).delivery(), Delivery::Drop);
    }

    #[test]
    fn transport_errors_are_retried() {
        let dial = ConnectionError::Dial {
            endpoint: Endpoint::new("a", 1),
            source: io_error(),
        };
        assert_eq!(SinkError::from(dial).delivery(), Delivery::Retry);

        let send = SinkError::Send {
            key: "logstash".into(),
            preview: "failure".into(),
            source: io_error(),
        };
        assert_eq!(send.delivery(), Delivery::Retry);
        let message = send.to_string();
        assert!(message.starts_with("error setting key logstash"));
    }
}
