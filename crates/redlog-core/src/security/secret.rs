//! Redacted password storage
//!
//! The Redis password travels from raw settings into every connection
//! handshake. [`SecretString`] keeps it out of `Debug`/`Display` output, so a
//! logged [`PoolConfig`](crate::PoolConfig) never leaks it, and zeroes the
//! buffer on drop.
//!
//! ```
//! use redlog_core::SecretString;
//!
//! let password = SecretString::new("geheim");
//! assert_eq!(format!("{:?}", password), "[REDACTED]");
//! assert_eq!(password.expose_secret(), "geheim");
//! ```

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string that redacts itself when formatted.
///
/// The value can only be read through [`expose_secret()`](SecretString::expose_secret).
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Expose the secret value.
    ///
    /// Never log or embed the returned value in error messages.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting_redacts() {
        let secret = SecretString::new("super-secret-password");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_expose_returns_value() {
        let secret = SecretString::from("mypasswd".to_string());
        assert_eq!(secret.expose_secret(), "mypasswd");
        assert!(!secret.is_empty());
        assert!(SecretString::default().is_empty());
    }
}
