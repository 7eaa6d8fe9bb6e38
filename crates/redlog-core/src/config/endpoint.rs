//! Redis endpoint parsing

use std::fmt;

use super::DEFAULT_PORT;
use crate::error::{ConfigError, ConfigResult};

/// One Redis server address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    hostname: String,
    port: u16,
}

impl Endpoint {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parse a single host token, either `host` or `host:port`.
    ///
    /// A missing port defaults to 6379.
    ///
    /// ```
    /// use redlog_core::Endpoint;
    ///
    /// assert_eq!(Endpoint::parse("1.2.3.4:42").unwrap(), Endpoint::new("1.2.3.4", 42));
    /// assert_eq!(Endpoint::parse("1.2.3.4").unwrap(), Endpoint::new("1.2.3.4", 6379));
    /// assert!(Endpoint::parse("ahost:42:43").is_err());
    /// ```
    pub fn parse(token: &str) -> ConfigResult<Self> {
        let mut parts = token.split(':');
        let hostname = parts.next().unwrap_or_default();
        let port = parts.next();
        if parts.next().is_some() || hostname.is_empty() {
            return Err(ConfigError::InvalidHostToken {
                token: token.to_string(),
            });
        }

        let port = match port {
            Some(raw) => parse_port(raw)?,
            None => DEFAULT_PORT,
        };

        Ok(Self::new(hostname, port))
    }

    /// Connection URL understood by the `redis` crate.
    ///
    /// TLS endpoints use the `rediss` scheme; skipping certificate
    /// verification appends the `#insecure` fragment.
    pub fn connection_url(&self, use_tls: bool, tls_skip_verify: bool) -> String {
        match (use_tls, tls_skip_verify) {
            (false, _) => format!("redis://{}:{}", self.hostname, self.port),
            (true, false) => format!("rediss://{}:{}", self.hostname, self.port),
            (true, true) => format!("rediss://{}:{}/#insecure", self.hostname, self.port),
        }
    }
}

fn parse_port(raw: &str) -> ConfigResult<u16> {
    let port: i64 = raw.parse().map_err(|source| ConfigError::NonNumericPort {
        port: raw.to_string(),
        source,
    })?;
    u16::try_from(port).map_err(|_| ConfigError::PortOutOfRange { port })
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}
