//! Criteria compiler
//!
//! Turns equality criteria over document field paths into a parameterized
//! SQLite `WHERE` clause against the `data` column. Field paths use `__` to
//! descend into nested objects: `a__b__c` addresses `data.a.b.c`.
//!
//! Comparisons are typed. The extracted value's `json_type` is checked
//! along with the value itself, so the string `"1"` never matches the
//! number `1`, `true` never matches `1`, and a missing key never matches
//! `null`.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use super::error::{DanteError, Result};

/// Separator between nested keys in a path string
pub const PATH_DELIMITER: &str = "__";

/// Name of the encoded document column
pub const DATA_COLUMN: &str = "data";

/// A path into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// Split on [`PATH_DELIMITER`] when compiled
    Delimited(String),
    /// Already split; segments are used verbatim, so a key that itself
    /// contains `__` can still be addressed
    Segments(Vec<String>),
}

impl FieldPath {
    pub fn segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldPath::Segments(segments.into_iter().map(Into::into).collect())
    }

    fn display(&self) -> String {
        match self {
            FieldPath::Delimited(path) => path.clone(),
            FieldPath::Segments(segments) => segments.join(PATH_DELIMITER),
        }
    }

    fn split(&self) -> Vec<&str> {
        match self {
            FieldPath::Delimited(path) => path.split(PATH_DELIMITER).collect(),
            FieldPath::Segments(segments) => segments.iter().map(String::as_str).collect(),
        }
    }

    /// Render as an SQLite JSON path, `$."a"."b"`
    pub fn to_json_path(&self) -> Result<String> {
        let segments = self.split();
        if segments.is_empty() {
            return Err(self.invalid("path is empty"));
        }

        let mut json_path = String::from("$");
        for segment in segments {
            if segment.is_empty() {
                return Err(self.invalid("path has an empty segment"));
            }
            // SQLite has no escape for a quote inside a quoted label
            if segment.contains('"') {
                return Err(self.invalid("segment contains a double quote"));
            }
            push_label(&mut json_path, segment);
        }
        Ok(json_path)
    }

    /// JSON paths of every enclosing value, outermost first.
    ///
    /// `a__b__c` gives `$."a"` and `$."a"."b"`; a top-level key gives none.
    pub fn parent_json_paths(&self) -> Result<Vec<String>> {
        self.to_json_path()?;
        let segments = self.split();
        let mut parents = Vec::with_capacity(segments.len().saturating_sub(1));
        let mut json_path = String::from("$");
        for segment in &segments[..segments.len() - 1] {
            push_label(&mut json_path, segment);
            parents.push(json_path.clone());
        }
        Ok(parents)
    }

    fn invalid(&self, reason: &'static str) -> DanteError {
        DanteError::InvalidPath { path: self.display(), reason }
    }
}

fn push_label(json_path: &mut String, segment: &str) {
    json_path.push_str(".\"");
    json_path.push_str(segment);
    json_path.push('"');
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath::Delimited(path.to_string())
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        FieldPath::Delimited(path)
    }
}

/// Equality criteria, implicitly AND-ed. Empty criteria matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub fields: Vec<(FieldPath, Value)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.fields.push((path.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Match every top-level field of an encoded document exactly
    pub fn from_document(doc: &serde_json::Map<String, Value>) -> Self {
        let fields = doc
            .iter()
            .map(|(key, value)| (FieldPath::segments([key.as_str()]), value.clone()))
            .collect();
        Self { fields }
    }
}

impl<P, V> FromIterator<(P, V)> for Criteria
where
    P: Into<FieldPath>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(p, v)| (p.into(), v.into())).collect(),
        }
    }
}

/// A compiled filter: a clause and its bound parameters in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    pub clause: String,
    pub params: Vec<SqlValue>,
}

impl CompiledFilter {
    /// ` WHERE ...`, or nothing when there is no restriction
    pub fn where_sql(&self) -> String {
        if self.clause.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clause)
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.clause.is_empty()
    }
}

/// Compile criteria into a filter over the `data` column
pub fn compile(criteria: &Criteria) -> Result<CompiledFilter> {
    let mut parts = Vec::with_capacity(criteria.len());
    let mut params = Vec::new();

    for (path, expected) in &criteria.fields {
        let json_path = path.to_json_path()?;
        parts.push(compile_one(json_path, expected, &mut params)?);
    }

    Ok(CompiledFilter {
        clause: parts.join(" AND "),
        params,
    })
}

fn compile_one(json_path: String, expected: &Value, params: &mut Vec<SqlValue>) -> Result<String> {
    let col = DATA_COLUMN;
    let clause = match expected {
        Value::Null => {
            params.push(SqlValue::Text(json_path));
            format!("json_type({col}, ?) = 'null'")
        }
        Value::Bool(b) => {
            params.push(SqlValue::Text(json_path));
            let json_type = if *b { "true" } else { "false" };
            format!("json_type({col}, ?) = '{json_type}'")
        }
        Value::Number(n) => {
            let bound = if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                // u64 above i64::MAX is stored by SQLite as real anyway
                SqlValue::Real(n.as_f64().unwrap_or(f64::NAN))
            };
            params.push(SqlValue::Text(json_path.clone()));
            params.push(SqlValue::Text(json_path));
            params.push(bound);
            format!("(json_type({col}, ?) IN ('integer', 'real') AND {col} ->> ? = ?)")
        }
        Value::String(s) => {
            params.push(SqlValue::Text(json_path.clone()));
            params.push(SqlValue::Text(json_path));
            params.push(SqlValue::Text(s.clone()));
            format!("(json_type({col}, ?) = 'text' AND {col} ->> ? = ?)")
        }
        Value::Array(_) | Value::Object(_) => {
            let json_type = if expected.is_array() { "array" } else { "object" };
            params.push(SqlValue::Text(json_path.clone()));
            params.push(SqlValue::Text(json_path));
            params.push(SqlValue::Text(serde_json::to_string(expected)?));
            format!("(json_type({col}, ?) = '{json_type}' AND {col} -> ? = json(?))")
        }
    };
    Ok(clause)
}
