//! Model registry
//!
//! A process-wide map from model type to the database it lives in, so a
//! model can save and look itself up without a handle being passed
//! around. Nothing is registered until `init` or `bind` is called, and
//! `reset` forgets everything.
//!
//! Handles stored here are shared by every thread that touches the model,
//! so they should be opened with `check_same_thread(false)`;
//! `init_memory` does that.
//!
//! Async handles are kept in their own default and binding map and back
//! [`crate::engine::aio::AsyncActiveRecord`].

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use tracing::debug;

use super::aio::AsyncDante;
use super::collection::Collection;
use super::config::Config;
use super::database::Dante;
use super::document;
use super::error::{DanteError, Result};
use super::model::Model;
use super::query::Criteria;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// The process-wide registry used by [`ActiveRecord`]
pub fn registry() -> &'static Registry {
    &REGISTRY
}

#[derive(Default)]
pub struct Registry {
    default: RwLock<Option<Dante>>,
    bindings: RwLock<HashMap<TypeId, Dante>>,
    async_default: RwLock<Option<AsyncDante>>,
    async_bindings: RwLock<HashMap<TypeId, AsyncDante>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `db` for every model without its own binding
    pub fn init(&self, db: Dante) {
        debug!(db = %db, "registry default set");
        *self.default.write() = Some(db);
    }

    /// Use a fresh shared in-memory database as the default
    pub fn init_memory(&self) -> Result<Dante> {
        let db = Dante::with_config(Config::memory().check_same_thread(false))?;
        self.init(db.clone());
        Ok(db)
    }

    /// Use `db` for `M` only
    pub fn bind<M: Model>(&self, db: Dante) {
        debug!(model = type_name::<M>(), db = %db, "registry binding set");
        self.bindings.write().insert(TypeId::of::<M>(), db);
    }

    pub fn unbind<M: Model>(&self) -> Option<Dante> {
        self.bindings.write().remove(&TypeId::of::<M>())
    }

    /// Forget the defaults and every binding, blocking and async
    pub fn reset(&self) {
        *self.default.write() = None;
        self.bindings.write().clear();
        *self.async_default.write() = None;
        self.async_bindings.write().clear();
    }

    pub fn is_registered<M: Model>(&self) -> bool {
        self.bindings.read().contains_key(&TypeId::of::<M>()) || self.default.read().is_some()
    }

    /// The database for `M`: its own binding, else the default
    pub fn resolve<M: Model>(&self) -> Result<Dante> {
        if let Some(db) = self.bindings.read().get(&TypeId::of::<M>()) {
            return Ok(db.clone());
        }
        self.default
            .read()
            .clone()
            .ok_or(DanteError::NotRegistered(type_name::<M>()))
    }

    /// Use `db` for every async model without its own binding
    pub fn init_async(&self, db: AsyncDante) {
        debug!(db = %db, "registry async default set");
        *self.async_default.write() = Some(db);
    }

    pub async fn init_async_memory(&self) -> Result<AsyncDante> {
        let db = AsyncDante::memory().await?;
        self.init_async(db.clone());
        Ok(db)
    }

    pub fn bind_async<M: Model>(&self, db: AsyncDante) {
        debug!(model = type_name::<M>(), db = %db, "registry async binding set");
        self.async_bindings.write().insert(TypeId::of::<M>(), db);
    }

    pub fn unbind_async<M: Model>(&self) -> Option<AsyncDante> {
        self.async_bindings.write().remove(&TypeId::of::<M>())
    }

    pub fn is_registered_async<M: Model>(&self) -> bool {
        self.async_bindings.read().contains_key(&TypeId::of::<M>())
            || self.async_default.read().is_some()
    }

    pub fn resolve_async<M: Model>(&self) -> Result<AsyncDante> {
        if let Some(db) = self.async_bindings.read().get(&TypeId::of::<M>()) {
            return Ok(db.clone());
        }
        self.async_default
            .read()
            .clone()
            .ok_or(DanteError::NotRegistered(type_name::<M>()))
    }
}

/// Save/find/delete directly on model types, through [`registry()`].
///
/// Implemented for every `Model`.
pub trait ActiveRecord: Model {
    fn collection() -> Result<Collection<Self>> {
        registry().resolve::<Self>()?.model::<Self>()
    }

    /// Insert this record
    fn save(&self) -> Result<()> {
        Self::collection()?.insert(self)
    }

    /// Overwrite the records matching `criteria` with this one
    fn save_matching(&self, criteria: &Criteria) -> Result<usize> {
        Self::collection()?.update(self, criteria)
    }

    /// Delete every stored record equal to this one, field by field
    fn delete(&self) -> Result<usize> {
        let value = document::to_value(self)?;
        let criteria = match value.as_object() {
            Some(fields) => Criteria::from_document(fields),
            None => return Err(DanteError::NotAnObject(document::json_type_name(&value))),
        };
        Self::collection()?.delete(&criteria)
    }

    fn find_one(criteria: &Criteria) -> Result<Option<Self>> {
        Self::collection()?.find_one(criteria)
    }

    fn find_many(limit: Option<usize>, criteria: &Criteria) -> Result<Vec<Self>> {
        Self::collection()?.find_many(limit, criteria)
    }

    fn delete_many(criteria: &Criteria) -> Result<usize> {
        Self::collection()?.delete(criteria)
    }

    fn clear() -> Result<usize> {
        Self::collection()?.clear()
    }
}

impl<M: Model> ActiveRecord for M {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Alpha {
        a: i32,
    }
    impl Model for Alpha {}

    #[derive(Serialize, Deserialize)]
    struct Beta {
        b: i32,
    }
    impl Model for Beta {}

    #[test]
    fn test_unregistered() {
        let registry = Registry::new();
        assert!(!registry.is_registered::<Alpha>());
        assert!(matches!(
            registry.resolve::<Alpha>().unwrap_err(),
            DanteError::NotRegistered(_)
        ));
    }

    #[test]
    fn test_binding_wins_over_default() {
        let registry = Registry::new();
        let default = registry.init_memory().unwrap();
        let own = Dante::memory().unwrap();
        registry.bind::<Alpha>(own.clone());

        assert!(registry.resolve::<Alpha>().unwrap().ptr_eq(&own));
        assert!(registry.resolve::<Beta>().unwrap().ptr_eq(&default));

        assert!(registry.unbind::<Alpha>().is_some());
        assert!(registry.resolve::<Alpha>().unwrap().ptr_eq(&default));
    }

    #[tokio::test]
    async fn test_async_bindings_are_separate() {
        let registry = Registry::new();
        registry.init_memory().unwrap();
        assert!(!registry.is_registered_async::<Alpha>());

        let own = AsyncDante::memory().await.unwrap();
        registry.bind_async::<Alpha>(own.clone());
        assert!(registry.is_registered_async::<Alpha>());
        assert!(matches!(
            registry.resolve_async::<Beta>().unwrap_err(),
            DanteError::NotRegistered(_)
        ));

        let default = registry.init_async_memory().await.unwrap();
        assert!(registry.resolve_async::<Beta>().unwrap().ptr_eq(&default));
        assert!(registry.resolve_async::<Alpha>().unwrap().ptr_eq(&own));
        assert!(registry.unbind_async::<Alpha>().is_some());

        own.close().await.unwrap();
        default.close().await.unwrap();
    }

    #[test]
    fn test_reset() {
        let registry = Registry::new();
        registry.init_memory().unwrap();
        registry.bind::<Alpha>(Dante::memory().unwrap());
        registry.reset();
        assert!(!registry.is_registered::<Alpha>());
        assert!(!registry.is_registered::<Beta>());
    }
}
