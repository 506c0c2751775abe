use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Field the stores order listings by.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// A stored document: field name to value.
pub type Document = BTreeMap<String, DocValue>;

/// The store's native timestamp type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

const NANOS_PER_SECOND: i128 = 1_000_000_000;

impl Timestamp {
    pub fn to_datetime(self) -> anyhow::Result<OffsetDateTime> {
        let nanos = i128::from(self.seconds) * NANOS_PER_SECOND + i128::from(self.nanos);
        Ok(OffsetDateTime::from_unix_timestamp_nanos(nanos)?)
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(datetime: OffsetDateTime) -> Self {
        let nanos = datetime.unix_timestamp_nanos();
        Timestamp {
            seconds: nanos.div_euclid(NANOS_PER_SECOND) as i64,
            nanos: nanos.rem_euclid(NANOS_PER_SECOND) as u32,
        }
    }
}

/// JSON-like value with a distinguished timestamp variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Array(Vec<DocValue>),
    Map(BTreeMap<String, DocValue>),
    Timestamp(Timestamp),
}

impl DocValue {
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            DocValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for DocValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DocValue::Null,
            serde_json::Value::Bool(b) => DocValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => DocValue::Integer(i),
                None => DocValue::Double(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => DocValue::String(s),
            serde_json::Value::Array(items) => {
                DocValue::Array(items.into_iter().map(DocValue::from).collect())
            }
            serde_json::Value::Object(fields) => DocValue::Map(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, DocValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<DocValue> for serde_json::Value {
    fn from(value: DocValue) -> Self {
        match value {
            DocValue::Null => serde_json::Value::Null,
            DocValue::Bool(b) => serde_json::Value::Bool(b),
            DocValue::Integer(i) => serde_json::Value::from(i),
            DocValue::Double(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            DocValue::String(s) => serde_json::Value::String(s),
            DocValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            DocValue::Map(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::from(value)))
                    .collect(),
            ),
            // Timestamps outside a marshaled field degrade to a plain object.
            DocValue::Timestamp(ts) => serde_json::json!({
                "seconds": ts.seconds,
                "nanos": ts.nanos,
            }),
        }
    }
}

/// Reads the ordering timestamp of a document, if it carries one.
pub fn created_at(document: &Document) -> Option<Timestamp> {
    document.get(CREATED_AT_FIELD).and_then(DocValue::as_timestamp)
}
