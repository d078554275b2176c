//! Collection catalog
//!
//! `CollectionMeta` turns collection operations into `Statement`s;
//! `Catalog` caches one meta per (name, kind) and remembers which tables
//! were already created on the connection.

use rusqlite::types::Value as SqlValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::document::{self, Document};
use super::error::{DanteError, Result};
use super::model::CollectionKind;
use super::query::{self, Criteria, FieldPath, DATA_COLUMN};
use super::statement::{quote_ident, Statement, StatementKind};

/// A resolved collection: its name, quoted table and codec kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMeta {
    pub name: String,
    pub table: String,
    pub kind: CollectionKind,
}

impl CollectionMeta {
    pub fn new(name: &str, kind: CollectionKind) -> Result<Self> {
        validate_collection_name(name)?;
        Ok(Self {
            name: name.to_string(),
            table: quote_ident(name),
            kind,
        })
    }

    pub fn create_table(&self) -> Statement {
        Statement::new(
            format!(
                "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY, {DATA_COLUMN} TEXT NOT NULL)",
                self.table
            ),
            vec![],
            StatementKind::Schema,
        )
    }

    pub fn insert<T: Serialize>(&self, doc: &T) -> Result<Statement> {
        let text = document::encode(doc, self.kind)?;
        Ok(Statement::new(
            format!("INSERT INTO {} ({DATA_COLUMN}) VALUES (?)", self.table),
            vec![SqlValue::Text(text)],
            StatementKind::Mutation,
        ))
    }

    pub fn select(&self, criteria: &Criteria, limit: Option<usize>) -> Result<Statement> {
        let filter = query::compile(criteria)?;
        let mut sql = format!("SELECT {DATA_COLUMN} FROM {}{}", self.table, filter.where_sql());
        let mut params = filter.params;
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            params.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }
        Ok(Statement::new(sql, params, StatementKind::Query))
    }

    pub fn count(&self, criteria: &Criteria) -> Result<Statement> {
        let filter = query::compile(criteria)?;
        Ok(Statement::new(
            format!("SELECT COUNT(*) FROM {}{}", self.table, filter.where_sql()),
            filter.params,
            StatementKind::Query,
        ))
    }

    /// Overwrite every matching document with `doc`
    pub fn update<T: Serialize>(&self, doc: &T, criteria: &Criteria) -> Result<Statement> {
        if criteria.is_empty() {
            return Err(DanteError::MissingCriteria("update"));
        }
        let text = document::encode(doc, self.kind)?;
        let filter = query::compile(criteria)?;

        let sql = format!("UPDATE {} SET {DATA_COLUMN} = ?{}", self.table, filter.where_sql());
        let mut params = vec![SqlValue::Text(text)];
        params.extend(filter.params);
        Ok(Statement::new(sql, params, StatementKind::Mutation))
    }

    /// Patch fields of every matching document. Typed collections refuse this.
    ///
    /// A nested key only applies to documents whose enclosing values are
    /// objects or missing; a document with a scalar on the way is left out
    /// and not counted.
    pub fn set(&self, fields: &Document, criteria: &Criteria) -> Result<Statement> {
        if self.kind.is_typed() {
            return Err(DanteError::Unsupported {
                operation: "set",
                collection: self.name.clone(),
            });
        }
        if fields.is_empty() {
            return Err(DanteError::MissingFields);
        }
        if criteria.is_empty() {
            return Err(DanteError::MissingCriteria("set"));
        }

        let mut args = Vec::with_capacity(fields.len());
        let mut params = Vec::with_capacity(fields.len() * 2);
        let mut parents = Vec::new();
        for (key, value) in fields {
            let path = FieldPath::from(key.as_str());
            args.push("?, json(?)");
            params.push(SqlValue::Text(path.to_json_path()?));
            params.push(SqlValue::Text(serde_json::to_string(value)?));
            parents.extend(path.parent_json_paths()?);
        }
        parents.sort();
        parents.dedup();

        let filter = query::compile(criteria)?;
        let mut clauses = vec![filter.clause];
        clauses.extend(
            parents
                .iter()
                .map(|_| format!("COALESCE(json_type({DATA_COLUMN}, ?), 'object') = 'object'")),
        );
        let sql = format!(
            "UPDATE {} SET {DATA_COLUMN} = json_set({DATA_COLUMN}, {}) WHERE {}",
            self.table,
            args.join(", "),
            clauses.join(" AND ")
        );
        params.extend(filter.params);
        params.extend(parents.into_iter().map(SqlValue::Text));
        Ok(Statement::new(sql, params, StatementKind::Mutation))
    }

    /// Delete matching documents; empty criteria deletes all of them
    pub fn delete(&self, criteria: &Criteria) -> Result<Statement> {
        let filter = query::compile(criteria)?;
        Ok(Statement::new(
            format!("DELETE FROM {}{}", self.table, filter.where_sql()),
            filter.params,
            StatementKind::Mutation,
        ))
    }

    pub fn clear(&self) -> Statement {
        Statement::new(
            format!("DELETE FROM {}", self.table),
            vec![],
            StatementKind::Mutation,
        )
    }

    pub fn decode_rows<T: DeserializeOwned>(&self, rows: Vec<String>) -> Result<Vec<T>> {
        rows.iter()
            .map(|text| document::decode(text, self.kind))
            .collect()
    }
}

/// Validate collection name
fn validate_collection_name(name: &str) -> Result<()> {
    let invalid = |reason| DanteError::InvalidCollectionName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.contains('\0') {
        return Err(invalid("name cannot contain NUL"));
    }
    if name.to_ascii_lowercase().starts_with("sqlite_") {
        return Err(invalid("names starting with sqlite_ are reserved"));
    }
    Ok(())
}

/// Per-connection cache of collection handles
#[derive(Debug, Default)]
pub struct Catalog {
    handles: HashMap<(String, CollectionKind), Arc<CollectionMeta>>,
    tables: HashSet<String>,
}

impl Catalog {
    pub fn get(&self, name: &str, kind: CollectionKind) -> Option<Arc<CollectionMeta>> {
        self.handles.get(&(name.to_string(), kind)).cloned()
    }

    /// Whether the table still has to be created on this connection
    pub fn needs_table(&self, name: &str) -> bool {
        !self.tables.contains(name)
    }

    pub fn insert(&mut self, meta: CollectionMeta) -> Arc<CollectionMeta> {
        self.tables.insert(meta.name.clone());
        let meta = Arc::new(meta);
        self.handles
            .insert((meta.name.clone(), meta.kind), Arc::clone(&meta));
        meta
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
