//! Blocking collection handle

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::catalog::CollectionMeta;
use super::database::Dante;
use super::document::Document;
use super::error::Result;
use super::query::Criteria;

/// A collection of documents backed by one table.
///
/// `T` is `Document` for free-form collections and the model type for
/// collections obtained through [`Dante::model`].
pub struct Collection<T = Document> {
    db: Dante,
    meta: Arc<CollectionMeta>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            meta: Arc::clone(&self.meta),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    pub(crate) fn new(db: Dante, meta: Arc<CollectionMeta>) -> Self {
        Self {
            db,
            meta,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn is_typed(&self) -> bool {
        self.meta.kind.is_typed()
    }

    pub fn database(&self) -> &Dante {
        &self.db
    }

    /// Insert a document. Identical documents are stored as separate rows.
    pub fn insert(&self, doc: &T) -> Result<()> {
        let stmt = self.meta.insert(doc)?;
        self.db.with_conn(|conn| stmt.execute(conn, self.db.auto_commit()))?;
        Ok(())
    }

    /// Find a single matching document.
    ///
    /// If several match, which one is returned is up to SQLite.
    pub fn find_one(&self, criteria: &Criteria) -> Result<Option<T>> {
        Ok(self.find_many(Some(1), criteria)?.into_iter().next())
    }

    /// Find matching documents, at most `limit` of them
    pub fn find_many(&self, limit: Option<usize>, criteria: &Criteria) -> Result<Vec<T>> {
        let stmt = self.meta.select(criteria, limit)?;
        let rows = self.db.with_conn(|conn| stmt.query_rows(conn))?;
        self.meta.decode_rows(rows)
    }

    /// Every document in the collection
    pub fn all(&self) -> Result<Vec<T>> {
        self.find_many(None, &Criteria::new())
    }

    pub fn count(&self, criteria: &Criteria) -> Result<usize> {
        let stmt = self.meta.count(criteria)?;
        self.db.with_conn(|conn| stmt.query_count(conn))
    }

    /// Overwrite every matching document with `doc`.
    ///
    /// The new data must be a full document, not just the changed fields.
    /// Returns the number of documents replaced.
    pub fn update(&self, doc: &T, criteria: &Criteria) -> Result<usize> {
        let stmt = self.meta.update(doc, criteria)?;
        self.db.with_conn(|conn| stmt.execute(conn, self.db.auto_commit()))
    }

    /// Set individual fields on every matching document.
    ///
    /// Plain keys overwrite top-level fields; `a__b` style keys set nested
    /// ones, creating missing objects on the way. Documents where an
    /// enclosing value is not an object are skipped and not counted.
    /// Fails with `Unsupported` on typed collections.
    pub fn set(&self, fields: &Document, criteria: &Criteria) -> Result<usize> {
        let stmt = self.meta.set(fields, criteria)?;
        self.db.with_conn(|conn| stmt.execute(conn, self.db.auto_commit()))
    }

    /// Delete matching documents. Empty criteria deletes everything.
    pub fn delete(&self, criteria: &Criteria) -> Result<usize> {
        let stmt = self.meta.delete(criteria)?;
        self.db.with_conn(|conn| stmt.execute(conn, self.db.auto_commit()))
    }

    /// Delete all documents, returning how many there were
    pub fn clear(&self) -> Result<usize> {
        let stmt = self.meta.clear();
        self.db.with_conn(|conn| stmt.execute(conn, self.db.auto_commit()))
    }

    pub fn iter(&self) -> Result<std::vec::IntoIter<T>> {
        Ok(self.all()?.into_iter())
    }
}

impl<T> fmt::Display for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Collection(\"{}/{}\")",
            self.db.config().display_path(),
            self.meta.name
        )
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.meta.name)
            .field("kind", &self.meta.kind)
            .finish()
    }
}
