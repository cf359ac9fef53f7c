//! Conversions between domain fields and libSQL values

use libsql::{Row, Value};

use crate::error::{Error, Result};
use crate::models::AccountId;

/// Optional text column value (`NULL` when absent).
pub fn text_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

/// Optional real column value (`NULL` when absent).
pub fn real_or_null(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

/// Read a nullable text column.
pub fn optional_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(unexpected(idx, "text", &other)),
    }
}

/// Read a nullable real column (integers are widened).
#[allow(clippy::cast_precision_loss)]
pub fn optional_real(row: &Row, idx: i32) -> Result<Option<f64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Real(value) => Ok(Some(value)),
        Value::Integer(value) => Ok(Some(value as f64)),
        other => Err(unexpected(idx, "real", &other)),
    }
}

/// Read a non-null account id column.
pub fn account_id(row: &Row, idx: i32) -> Result<AccountId> {
    let raw: String = row.get(idx)?;
    AccountId::new(raw).map_err(|_| Error::Database(format!("column {idx} holds an empty account id")))
}

/// Decode a JSON string-list column.
pub fn string_list(row: &Row, idx: i32) -> Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    Ok(serde_json::from_str(&raw)?)
}

fn unexpected(idx: i32, expected: &str, value: &Value) -> Error {
    Error::Database(format!(
        "column {idx}: expected {expected}, found {value:?}"
    ))
}
