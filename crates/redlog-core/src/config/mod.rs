//! Connection configuration
//!
//! Raw settings arrive as six strings ([`RawSettings`]) and are validated
//! once at startup into a [`PoolConfig`], which the pool layer reads but never
//! mutates. Empty inputs fall back to defaults:
//!
//! | setting | default |
//! |---|---|
//! | hosts | `127.0.0.1:6379` |
//! | db | `0` |
//! | usetls | `false` |
//! | tlsskipverify | `true` |
//! | key | `logstash` |
//! | password | empty |

mod endpoint;
mod raw;

pub use endpoint::Endpoint;
pub use raw::RawSettings;

use std::fmt;

use tracing::debug;

use crate::collections::NonEmptyVec;
use crate::error::{ConfigError, ConfigResult};
use crate::security::SecretString;

pub const DEFAULT_HOSTS: &str = "127.0.0.1:6379";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_KEY: &str = "logstash";

/// Validated configuration for a set of Redis pools.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    endpoints: NonEmptyVec<Endpoint>,
    database: i64,
    password: SecretString,
    use_tls: bool,
    tls_skip_verify: bool,
    destination_key: String,
}

impl PoolConfig {
    /// Endpoints in the order they were configured
    pub fn endpoints(&self) -> &NonEmptyVec<Endpoint> {
        &self.endpoints
    }

    /// Database index selected on every new connection, never negative
    pub fn database(&self) -> i64 {
        self.database
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    pub fn tls_skip_verify(&self) -> bool {
        self.tls_skip_verify
    }

    /// Name of the list every message is pushed onto
    pub fn destination_key(&self) -> &str {
        &self.destination_key
    }
}

impl fmt::Display for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hosts:{} db:{} usetls:{} tlsskipverify:{} key:{}",
            self.endpoints, self.database, self.use_tls, self.tls_skip_verify, self.destination_key
        )
    }
}

/// Validate raw settings, stopping at the first invalid field.
pub(crate) fn validate(raw: &RawSettings) -> ConfigResult<PoolConfig> {
    let hosts = or_default(&raw.hosts, DEFAULT_HOSTS);
    let endpoints = hosts
        .split_whitespace()
        .map(Endpoint::parse)
        .collect::<ConfigResult<Vec<_>>>()?;
    let endpoints = match NonEmptyVec::try_from(endpoints) {
        Ok(endpoints) => endpoints,
        // whitespace-only input
        Err(_) => NonEmptyVec::singleton(Endpoint::new("127.0.0.1", DEFAULT_PORT)),
    };

    let database = parse_database(&raw.db)?;
    let use_tls = parse_flag("usetls", &raw.use_tls, false)?;
    let tls_skip_verify = parse_flag("tlsskipverify", &raw.tls_skip_verify, true)?;
    let destination_key = or_default(&raw.key, DEFAULT_KEY).to_string();

    let config = PoolConfig {
        endpoints,
        database,
        password: SecretString::new(raw.password.clone()),
        use_tls,
        tls_skip_verify,
        destination_key,
    };
    debug!(config = %config, "Validated Redis configuration");
    Ok(config)
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

fn parse_database(raw: &str) -> ConfigResult<i64> {
    if raw.is_empty() {
        return Ok(0);
    }
    let value: i64 = raw.parse().map_err(|source| ConfigError::InvalidDatabase {
        value: raw.to_string(),
        source,
    })?;
    if value < 0 {
        return Err(ConfigError::NegativeDatabase { value });
    }
    Ok(value)
}

fn parse_flag(field: &'static str, raw: &str, default: bool) -> ConfigResult<bool> {
    match raw {
        "" => Ok(default),
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(ConfigError::InvalidBool {
            field,
            value: other.to_string(),
        }),
    }
}
