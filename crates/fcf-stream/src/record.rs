//! The unit of data exchanged through an object stream.

use serde_json::{Map, Value};

use crate::error::{StreamError, StreamResult};

/// A map-rooted structured object. Deeper structure belongs to the consumer.
pub type Record = Map<String, Value>;

/// Short name of a JSON value's type, for diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accept `value` as a record, or report a corrupt stream named `name`.
pub(crate) fn into_record(name: &str, value: Value) -> StreamResult<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StreamError::corrupt(
            name,
            format!("want: object, got: {}", value_kind(&other)),
        )),
    }
}
