//! Dante Database Module
//! Blocking handle over a single SQLite connection

use parking_lot::Mutex;
use rusqlite::Connection;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{info, warn};

use super::catalog::{Catalog, CollectionMeta};
use super::collection::Collection;
use super::config::Config;
use super::document::Document;
use super::error::{DanteError, Result};
use super::model::{CollectionKind, Model};
use super::statement;

/// A blocking Dante database.
///
/// Cloning is cheap and every clone shares one connection. The connection
/// is closed by `close()` or when the last clone is dropped; with
/// `auto_commit` off, anything not committed by then is rolled back.
///
/// ```no_run
/// use dante::{criteria, Dante};
/// use serde_json::json;
///
/// # fn main() -> dante::Result<()> {
/// let db = Dante::open("mydatabase.db")?;
/// let coll = db.collection("mycollection")?;
///
/// let doc = json!({"name": "Dante", "text": "Hello World!"});
/// coll.insert(doc.as_object().unwrap())?;
///
/// let found = coll.find_one(&criteria! { "name" => "Dante" })?;
/// assert_eq!(found.unwrap()["text"], "Hello World!");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dante {
    inner: Arc<DanteInner>,
}

struct DanteInner {
    config: Config,
    owner: ThreadId,
    conn: Mutex<Option<Connection>>,
    catalog: Mutex<Catalog>,
}

impl Dante {
    /// Open or create a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(Config::file(path.as_ref()))
    }

    /// Open a transient in-memory database
    pub fn memory() -> Result<Self> {
        Self::with_config(Config::memory())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let conn = match &config.path {
            Some(path) => {
                // Ensure parent directory exists
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
            None => Connection::open_in_memory()?,
        };
        info!(path = %config.display_path(), auto_commit = config.auto_commit, "opened database");

        Ok(Self {
            inner: Arc::new(DanteInner {
                config,
                owner: thread::current().id(),
                conn: Mutex::new(Some(conn)),
                catalog: Mutex::new(Catalog::default()),
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
    pub fn ptr_eq(&self, other: &Dante) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.conn.lock().is_none()
    }

    /// Free-form collection by name, created on first use
    pub fn collection(&self, name: &str) -> Result<Collection<Document>> {
        let meta = self.lookup(name, CollectionKind::FreeForm)?;
        Ok(Collection::new(self.clone(), meta))
    }

    /// Collection bound to a model type, stored in `M::collection_name()`
    pub fn model<M: Model>(&self) -> Result<Collection<M>> {
        let meta = self.lookup(&M::collection_name(), CollectionKind::of::<M>())?;
        Ok(Collection::new(self.clone(), meta))
    }

    fn lookup(&self, name: &str, kind: CollectionKind) -> Result<Arc<CollectionMeta>> {
        self.check_thread()?;
        let mut catalog = self.inner.catalog.lock();
        if let Some(meta) = catalog.get(name, kind) {
            return Ok(meta);
        }

        let meta = CollectionMeta::new(name, kind)?;
        if catalog.needs_table(name) {
            let create = meta.create_table();
            self.with_conn(|conn| create.execute(conn, self.auto_commit()))?;
        }
        Ok(catalog.insert(meta))
    }

    /// Commit pending changes. A no-op under auto-commit.
    pub fn commit(&self) -> Result<()> {
        self.with_conn(statement::commit)?;
        info!(path = %self.inner.config.display_path(), "committed");
        Ok(())
    }

    /// Close the connection. Closing twice is fine.
    pub fn close(&self) -> Result<()> {
        self.check_thread()?;
        let conn = self.inner.conn.lock().take();
        if let Some(conn) = conn {
            if !conn.is_autocommit() {
                warn!(
                    path = %self.inner.config.display_path(),
                    "closing with uncommitted changes, rolling back"
                );
            }
            conn.close().map_err(|(_, e)| DanteError::Storage(e))?;
            info!(path = %self.inner.config.display_path(), "closed database");
        }
        Ok(())
    }

    /// Run `f` against the live connection.
    ///
    /// Holds the connection lock for the duration of `f`, which serializes
    /// statements when the handle is shared across threads.
    pub(crate) fn with_conn<R>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<R>,
    ) -> Result<R> {
        self.check_thread()?;
        let guard = self.inner.conn.lock();
        let conn = guard.as_ref().ok_or(DanteError::Closed)?;
        Ok(f(conn)?)
    }

    fn check_thread(&self) -> Result<()> {
        if self.inner.config.check_same_thread && thread::current().id() != self.inner.owner {
            return Err(DanteError::ThreadAffinity);
        }
        Ok(())
    }
}

impl fmt::Display for Dante {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dante(\"{}\")", self.inner.config.display_path())
    }
}

impl fmt::Debug for Dante {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dante")
            .field("config", &self.inner.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for DanteInner {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.get_mut().take() {
            if !conn.is_autocommit() {
                warn!(
                    path = %self.config.display_path(),
                    "dropping with uncommitted changes, rolling back"
                );
            }
            let _ = conn.close();
        }
    }
}
