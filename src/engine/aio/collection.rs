//! Async collection handle

use futures_util::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::database::AsyncDante;
use crate::engine::catalog::CollectionMeta;
use crate::engine::document::Document;
use crate::engine::error::Result;
use crate::engine::query::Criteria;
use crate::engine::statement::Statement;

/// Async counterpart of [`crate::Collection`]
pub struct AsyncCollection<T = Document> {
    db: AsyncDante,
    meta: Arc<CollectionMeta>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for AsyncCollection<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            meta: Arc::clone(&self.meta),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> AsyncCollection<T> {
    pub(crate) fn new(db: AsyncDante, meta: Arc<CollectionMeta>) -> Self {
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

    pub fn database(&self) -> &AsyncDante {
        &self.db
    }

    pub async fn insert(&self, doc: &T) -> Result<()> {
        let stmt = self.meta.insert(doc)?;
        self.execute(stmt).await?;
        Ok(())
    }

    pub async fn find_one(&self, criteria: &Criteria) -> Result<Option<T>> {
        Ok(self.find_many(Some(1), criteria).await?.into_iter().next())
    }

    pub async fn find_many(&self, limit: Option<usize>, criteria: &Criteria) -> Result<Vec<T>> {
        let stmt = self.meta.select(criteria, limit)?;
        let rows = self.db.call(move |conn| stmt.query_rows(conn)).await?;
        self.meta.decode_rows(rows)
    }

    pub async fn all(&self) -> Result<Vec<T>> {
        self.find_many(None, &Criteria::new()).await
    }

    pub async fn count(&self, criteria: &Criteria) -> Result<usize> {
        let stmt = self.meta.count(criteria)?;
        self.db.call(move |conn| stmt.query_count(conn)).await
    }

    pub async fn update(&self, doc: &T, criteria: &Criteria) -> Result<usize> {
        let stmt = self.meta.update(doc, criteria)?;
        self.execute(stmt).await
    }

    /// See [`crate::Collection::set`]
    pub async fn set(&self, fields: &Document, criteria: &Criteria) -> Result<usize> {
        let stmt = self.meta.set(fields, criteria)?;
        self.execute(stmt).await
    }

    pub async fn delete(&self, criteria: &Criteria) -> Result<usize> {
        let stmt = self.meta.delete(criteria)?;
        self.execute(stmt).await
    }

    pub async fn clear(&self) -> Result<usize> {
        self.execute(self.meta.clear()).await
    }

    /// Stream every document in the collection.
    ///
    /// The rows are fetched up front; the stream only hands them out.
    pub async fn stream(&self) -> Result<impl Stream<Item = T>> {
        Ok(stream::iter(self.all().await?))
    }

    async fn execute(&self, stmt: Statement) -> Result<usize> {
        let auto_commit = self.db.auto_commit();
        self.db.call(move |conn| stmt.execute(conn, auto_commit)).await
    }
}

impl<T> fmt::Display for AsyncCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AsyncCollection(\"{}/{}\")",
            self.db.config().display_path(),
            self.meta.name
        )
    }
}

impl<T> fmt::Debug for AsyncCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCollection")
            .field("name", &self.meta.name)
            .field("kind", &self.meta.kind)
            .finish()
    }
}
