//! JSON log records
//!
//! A record is a flat map of fields stamped with `@timestamp` and `@tag`
//! before serialization, the shape Logstash expects when it reads the list.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::message::Message;

pub const TIMESTAMP_FIELD: &str = "@timestamp";
pub const TAG_FIELD: &str = "@tag";

#[derive(Error, Debug)]
pub enum RecordError {
    /// Input line was valid JSON but not an object
    #[error("record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One log record awaiting serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    timestamp: DateTime<Utc>,
    tag: String,
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(
        timestamp: DateTime<Utc>,
        tag: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            timestamp,
            tag: tag.into(),
            fields,
        }
    }

    /// Parse a JSON object line into a record.
    pub fn from_json_line(
        timestamp: DateTime<Utc>,
        tag: &str,
        line: &str,
    ) -> Result<Self, RecordError> {
        match serde_json::from_str::<Value>(line)? {
            Value::Object(fields) => Ok(Self::new(timestamp, tag, fields)),
            Value::Array(_) => Err(RecordError::NotAnObject("an array")),
            Value::String(_) => Err(RecordError::NotAnObject("a string")),
            Value::Number(_) => Err(RecordError::NotAnObject("a number")),
            Value::Bool(_) => Err(RecordError::NotAnObject("a boolean")),
            Value::Null => Err(RecordError::NotAnObject("null")),
        }
    }

    /// Serialize into a queue payload.
    ///
    /// `@timestamp` is RFC 3339 in UTC. A record field named `@timestamp` or
    /// `@tag` replaces the injected value.
    pub fn to_message(&self) -> Result<Message, RecordError> {
        let mut document = Map::with_capacity(self.fields.len() + 2);
        document.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
        document.insert(TAG_FIELD.to_string(), Value::String(self.tag.clone()));
        for (name, value) in &self.fields {
            document.insert(name.clone(), value.clone());
        }
        Ok(Message::new(serde_json::to_vec(&Value::Object(document))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap()
            + chrono::Duration::nanoseconds(999_999_999)
    }

    #[test]
    fn injects_timestamp_and_tag() {
        let fields = json!({"key": "value", "five": 5});
        let Value::Object(fields) = fields else {
            unreachable!()
        };

        let message = Record::new(timestamp(), "atag", fields)
            .to_message()
            .unwrap();
        let decoded: Value = serde_json::from_slice(message.as_bytes()).unwrap();

        assert_eq!(decoded["@timestamp"], "2006-01-02T22:04:05.999999999Z");
        assert_eq!(decoded["@tag"], "atag");
        assert_eq!(decoded["key"], "value");
        assert_eq!(decoded["five"], 5);
    }

    #[test]
    fn record_fields_override_injected_ones() {
        let record = Record::from_json_line(timestamp(), "atag", r#"{"@tag":"mine"}"#).unwrap();
        let message = record.to_message().unwrap();
        let decoded: Value = serde_json::from_slice(message.as_bytes()).unwrap();
        assert_eq!(decoded["@tag"], "mine");
    }

    #[test]
    fn rejects_non_object_lines() {
        let err = Record::from_json_line(timestamp(), "t", "[1,2]").unwrap_err();
        assert!(matches!(err, RecordError::NotAnObject("an array")));

        let err = Record::from_json_line(timestamp(), "t", "{nope").unwrap_err();
        assert!(matches!(err, RecordError::Json(_)));
    }
}
