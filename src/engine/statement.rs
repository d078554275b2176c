//! Statement issuing shared by the blocking and async handles
//!
//! Both façades build the same `Statement` values and run them against a
//! `rusqlite::Connection`; the async handle does so on tokio-rusqlite's
//! background thread. Commit policy lives here too.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Reads rows, never opens a transaction
    Query,
    /// Changes rows, subject to the commit policy
    Mutation,
    /// DDL
    Schema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(sql: String, params: Vec<SqlValue>, kind: StatementKind) -> Self {
        Self { sql, params, kind }
    }

    /// Run a `SELECT data ...` and collect the encoded documents
    pub fn query_rows(&self, conn: &Connection) -> rusqlite::Result<Vec<String>> {
        debug!(sql = %self.sql, params = self.params.len(), "query");
        let mut stmt = conn.prepare(&self.sql)?;
        let rows = stmt
            .query_map(params_from_iter(self.params.iter()), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Run a `SELECT COUNT(*) ...`
    pub fn query_count(&self, conn: &Connection) -> rusqlite::Result<usize> {
        debug!(sql = %self.sql, params = self.params.len(), "count");
        let count: i64 =
            conn.query_row(&self.sql, params_from_iter(self.params.iter()), |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Run a mutation or DDL statement, returning the number of rows changed.
    ///
    /// With `auto_commit` off a transaction is opened before the first
    /// mutation and stays open until `commit` is called.
    pub fn execute(&self, conn: &Connection, auto_commit: bool) -> rusqlite::Result<usize> {
        if self.kind == StatementKind::Mutation && !auto_commit && conn.is_autocommit() {
            debug!("BEGIN");
            conn.execute_batch("BEGIN")?;
        }
        debug!(sql = %self.sql, params = self.params.len(), "execute");
        conn.execute(&self.sql, params_from_iter(self.params.iter()))
    }
}

/// Commit the open transaction, if any
pub fn commit(conn: &Connection) -> rusqlite::Result<()> {
    if !conn.is_autocommit() {
        debug!("COMMIT");
        conn.execute_batch("COMMIT")?;
    }
    Ok(())
}

/// Quote an SQL identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
