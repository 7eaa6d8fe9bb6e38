//! Raw, unvalidated settings and where they come from

use super::PoolConfig;
use crate::error::ConfigResult;

/// The six raw connection settings, exactly as supplied.
///
/// Empty strings mean "use the default". Nothing is checked until
/// [`validate`](RawSettings::validate) is called.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RawSettings {
    pub hosts: String,
    pub password: String,
    pub db: String,
    pub use_tls: String,
    pub tls_skip_verify: String,
    pub key: String,
}

impl RawSettings {
    /// Environment variable names, in field order.
    pub const ENV_VARS: [&str; 6] = [
        "REDIS_HOSTS",
        "REDIS_PASSWORD",
        "REDIS_DB",
        "REDIS_USETLS",
        "REDIS_TLSSKIPVERIFY",
        "REDIS_KEY",
    ];

    /// Configuration key names used by log-forwarder host runtimes, in field order.
    pub const HOST_KEYS: [&str; 6] = ["Hosts", "Password", "DB", "UseTLS", "TLSSkipVerify", "Key"];

    /// Read settings from the `REDIS_*` environment variables.
    ///
    /// Unset or non-UTF-8 variables are treated as empty.
    pub fn from_env() -> Self {
        Self::from_keys(&Self::ENV_VARS, |name| std::env::var(name).ok())
    }

    /// Read settings through a host-supplied lookup keyed by
    /// `Hosts`, `Password`, `DB`, `UseTLS`, `TLSSkipVerify` and `Key`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        Self::from_keys(&Self::HOST_KEYS, lookup)
    }

    fn from_keys<F>(keys: &[&str; 6], mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |index: usize| lookup(keys[index]).unwrap_or_default();
        Self {
            hosts: get(0),
            password: get(1),
            db: get(2),
            use_tls: get(3),
            tls_skip_verify: get(4),
            key: get(5),
        }
    }

    /// Replace every field with the corresponding non-empty field of `other`.
    pub fn overlay(mut self, other: RawSettings) -> Self {
        fn take(slot: &mut String, value: String) {
            if !value.is_empty() {
                *slot = value;
            }
        }
        take(&mut self.hosts, other.hosts);
        take(&mut self.password, other.password);
        take(&mut self.db, other.db);
        take(&mut self.use_tls, other.use_tls);
        take(&mut self.tls_skip_verify, other.tls_skip_verify);
        take(&mut self.key, other.key);
        self
    }

    pub fn with_hosts(mut self, hosts: impl Into<String>) -> Self {
        self.hosts = hosts.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = db.into();
        self
    }

    pub fn with_use_tls(mut self, use_tls: impl Into<String>) -> Self {
        self.use_tls = use_tls.into();
        self
    }

    pub fn with_tls_skip_verify(mut self, skip: impl Into<String>) -> Self {
        self.tls_skip_verify = skip.into();
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Validate into a typed [`PoolConfig`].
    pub fn validate(&self) -> ConfigResult<PoolConfig> {
        super::validate(self)
    }
}

impl std::fmt::Debug for RawSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawSettings")
            .field("hosts", &self.hosts)
            .field("password", &"[REDACTED]")
            .field("db", &self.db)
            .field("use_tls", &self.use_tls)
            .field("tls_skip_verify", &self.tls_skip_verify)
            .field("key", &self.key)
            .finish()
    }
}
