//! Async database handle

use parking_lot::Mutex;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::collection::AsyncCollection;
use crate::engine::catalog::{Catalog, CollectionMeta};
use crate::engine::config::Config;
use crate::engine::document::Document;
use crate::engine::error::{DanteError, Result};
use crate::engine::model::{CollectionKind, Model};
use crate::engine::statement;

/// An async Dante database.
///
/// All calls go through one `tokio_rusqlite::Connection`, which runs them
/// one at a time on its own thread. `check_same_thread` has no effect here.
/// Always finish with `close().await`.
#[derive(Clone)]
pub struct AsyncDante {
    inner: Arc<AsyncInner>,
}

struct AsyncInner {
    config: Config,
    conn: Mutex<Option<tokio_rusqlite::Connection>>,
    catalog: tokio::sync::Mutex<Catalog>,
}

impl AsyncDante {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(Config::file(path.as_ref())).await
    }

    pub async fn memory() -> Result<Self> {
        Self::with_config(Config::memory()).await
    }

    pub async fn with_config(config: Config) -> Result<Self> {
        let conn = match &config.path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio_rusqlite::Connection::open(path).await?
            }
            None => tokio_rusqlite::Connection::open_in_memory().await?,
        };
        info!(
            path = %config.display_path(),
            auto_commit = config.auto_commit,
            "opened async database"
        );

        Ok(Self {
            inner: Arc::new(AsyncInner {
                config,
                conn: Mutex::new(Some(conn)),
                catalog: tokio::sync::Mutex::new(Catalog::default()),
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn auto_commit(&self) -> bool {
        self.inner.config.auto_commit
    }

    /// Whether both handles share one connection
    pub fn ptr_eq(&self, other: &AsyncDante) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.conn.lock().is_none()
    }

    pub async fn collection(&self, name: &str) -> Result<AsyncCollection<Document>> {
        let meta = self.lookup(name, CollectionKind::FreeForm).await?;
        Ok(AsyncCollection::new(self.clone(), meta))
    }

    pub async fn model<M: Model>(&self) -> Result<AsyncCollection<M>> {
        let meta = self.lookup(&M::collection_name(), CollectionKind::of::<M>()).await?;
        Ok(AsyncCollection::new(self.clone(), meta))
    }

    async fn lookup(&self, name: &str, kind: CollectionKind) -> Result<Arc<CollectionMeta>> {
        // held across the create so concurrent first lookups agree
        let mut catalog = self.inner.catalog.lock().await;
        if let Some(meta) = catalog.get(name, kind) {
            if self.is_closed() {
                return Err(DanteError::Closed);
            }
            return Ok(meta);
        }

        let meta = CollectionMeta::new(name, kind)?;
        if catalog.needs_table(name) {
            let create = meta.create_table();
            let auto_commit = self.auto_commit();
            self.call(move |conn| create.execute(conn, auto_commit)).await?;
        }
        Ok(catalog.insert(meta))
    }

    pub async fn commit(&self) -> Result<()> {
        self.call(|conn| statement::commit(conn)).await?;
        info!(path = %self.inner.config.display_path(), "committed");
        Ok(())
    }

    /// Close the connection. Closing twice is fine.
    pub async fn close(&self) -> Result<()> {
        let conn = self.inner.conn.lock().take();
        if let Some(conn) = conn {
            conn.close().await?;
            info!(path = %self.inner.config.display_path(), "closed async database");
        }
        Ok(())
    }

    /// Run `f` on the driver thread
    pub(crate) async fn call<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
    {
        let conn = self.inner.conn.lock().clone().ok_or(DanteError::Closed)?;
        let result = conn
            .call(move |conn| f(conn).map_err(tokio_rusqlite::Error::from))
            .await?;
        Ok(result)
    }
}

impl fmt::Display for AsyncDante {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsyncDante(\"{}\")", self.inner.config.display_path())
    }
}

impl fmt::Debug for AsyncDante {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncDante")
            .field("config", &self.inner.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for AsyncInner {
    fn drop(&mut self) {
        if self.conn.get_mut().is_some() {
            warn!(
                path = %self.config.display_path(),
                "AsyncDante dropped without close(); the driver thread is left to shut down on its own"
            );
        }
    }
}
