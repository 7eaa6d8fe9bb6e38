//! Configuration errors

use std::num::ParseIntError;

use thiserror::Error;

/// Result type for configuration parsing
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while turning raw settings into a [`PoolConfig`](crate::PoolConfig).
///
/// Validation stops at the first failure, checked in the order
/// hosts, db, usetls, tlsskipverify.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A host token contained more than one colon or an empty hostname
    #[error("hosts must be in the form host:port but is:{token}")]
    InvalidHostToken { token: String },

    /// The port part of a host token is not an integer
    #[error("port must be numeric: parsing {port:?}: {source}")]
    NonNumericPort {
        port: String,
        #[source]
        source: ParseIntError,
    },

    /// The port is an integer outside 0-65535
    #[error("port must between 0-65535 not:{port}")]
    PortOutOfRange { port: i64 },

    /// The database index is not an integer
    #[error("db must be a integer: parsing {value:?}: {source}")]
    InvalidDatabase {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// The database index is negative
    #[error("db must not be negative: {value}")]
    NegativeDatabase { value: i64 },

    /// A flag did not parse as a boolean
    #[error("{field} must be a bool: parsing {value:?}: invalid syntax")]
    InvalidBool { field: &'static str, value: String },
}

impl ConfigError {
    /// Name of the raw setting that failed validation
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::InvalidHostToken { .. }
            | ConfigError::NonNumericPort { .. }
            | ConfigError::PortOutOfRange { .. } => "hosts",
            ConfigError::InvalidDatabase { .. } | ConfigError::NegativeDatabase { .. } => "db",
            ConfigError::InvalidBool { field, .. } => field,
        }
    }
}
