//! Opaque queue payloads

use std::borrow::Cow;

/// An already serialized record, pushed verbatim onto the destination list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    data: Vec<u8>,
}

impl Message {
    /// Longest payload rendered in full by [`preview`](Message::preview).
    pub const PREVIEW_LIMIT: usize = 15;
    /// Bytes kept when a payload is truncated for display.
    pub const PREVIEW_PREFIX: usize = 12;

    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Short, lossy rendering of the payload for error messages.
    pub fn preview(&self) -> String {
        preview(&self.data)
    }
}

/// Render at most 15 bytes of `payload`; longer payloads are cut to 12 bytes plus `...`.
///
/// ```
/// use redlog_core::message::preview;
///
/// assert_eq!(preview(b"failure"), "failure");
/// assert_eq!(preview(b"a fairly long payload"), "a fairly lon...");
/// ```
pub fn preview(payload: &[u8]) -> String {
    if payload.len() > Message::PREVIEW_LIMIT {
        let head: Cow<'_, str> = String::from_utf8_lossy(&payload[..Message::PREVIEW_PREFIX]);
        format!("{head}...")
    } else {
        String::from_utf8_lossy(payload).into_owned()
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for Message {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl From<&str> for Message {
    fn from(data: &str) -> Self {
        Self::new(data.as_bytes())
    }
}

impl From<String> for Message {
    fn from(data: String) -> Self {
        Self::new(data.into_bytes())
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
