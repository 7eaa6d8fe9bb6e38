//! Handling of credentials.

pub mod secret;

pub use secret::SecretString;
