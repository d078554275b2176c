//! Document codec for the single `data` column

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{DanteError, Result};
use super::model::CollectionKind;

/// A free-form document
pub type Document = Map<String, Value>;

/// Encode a record as compact JSON text.
///
/// Timestamps go through chrono's serde support: `DateTime<Utc>` as
/// RFC 3339, `NaiveDate` as `YYYY-MM-DD`, `NaiveDateTime` as ISO-8601
/// without offset. The top-level value must be an object so that field
/// paths can address it.
pub fn encode<T: Serialize>(record: &T, kind: CollectionKind) -> Result<String> {
    let value = match (serde_json::to_value(record), kind) {
        (Ok(value), _) => value,
        (Err(source), CollectionKind::Typed(type_name)) => {
            return Err(DanteError::SchemaMismatch { type_name, source })
        }
        (Err(e), CollectionKind::FreeForm) => return Err(e.into()),
    };
    if !value.is_object() {
        return Err(DanteError::NotAnObject(json_type_name(&value)));
    }
    Ok(serde_json::to_string(&value)?)
}

/// Decode stored JSON text into a record.
///
/// For typed collections any shape the type rejects is a `SchemaMismatch`.
pub fn decode<T: DeserializeOwned>(text: &str, kind: CollectionKind) -> Result<T> {
    serde_json::from_str(text).map_err(|source| match kind {
        CollectionKind::Typed(type_name) => DanteError::SchemaMismatch { type_name, source },
        CollectionKind::FreeForm => DanteError::Json(source),
    })
}

/// Convert anything serializable into a value usable in criteria or `set`
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
