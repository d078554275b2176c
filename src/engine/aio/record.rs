//! Async save/find/delete on model types

use std::future::Future;

use super::collection::AsyncCollection;
use crate::engine::document;
use crate::engine::error::{DanteError, Result};
use crate::engine::model::Model;
use crate::engine::query::Criteria;
use crate::engine::registry::registry;

/// Async counterpart of [`crate::ActiveRecord`], resolved through the
/// registry's async bindings (`bind_async`, `init_async`).
///
/// Implemented for every `Model`.
pub trait AsyncActiveRecord: Model {
    fn collection() -> impl Future<Output = Result<AsyncCollection<Self>>> + Send {
        async { registry().resolve_async::<Self>()?.model::<Self>().await }
    }

    /// Insert this record
    fn save(&self) -> impl Future<Output = Result<()>> + Send {
        async move { Self::collection().await?.insert(self).await }
    }

    /// Overwrite the records matching `criteria` with this one
    fn save_matching(&self, criteria: &Criteria) -> impl Future<Output = Result<usize>> + Send {
        async move { Self::collection().await?.update(self, criteria).await }
    }

    /// Delete every stored record equal to this one, field by field
    fn delete(&self) -> impl Future<Output = Result<usize>> + Send {
        async move {
            let value = document::to_value(self)?;
            let criteria = match value.as_object() {
                Some(fields) => Criteria::from_document(fields),
                None => return Err(DanteError::NotAnObject(document::json_type_name(&value))),
            };
            Self::collection().await?.delete(&criteria).await
        }
    }

    fn find_one(criteria: &Criteria) -> impl Future<Output = Result<Option<Self>>> + Send {
        async move { Self::collection().await?.find_one(criteria).await }
    }

    fn find_many(
        limit: Option<usize>,
        criteria: &Criteria,
    ) -> impl Future<Output = Result<Vec<Self>>> + Send {
        async move { Self::collection().await?.find_many(limit, criteria).await }
    }

    fn delete_many(criteria: &Criteria) -> impl Future<Output = Result<usize>> + Send {
        async move { Self::collection().await?.delete(criteria).await }
    }

    fn clear() -> impl Future<Output = Result<usize>> + Send {
        async { Self::collection().await?.clear().await }
    }
}

impl<M: Model> AsyncActiveRecord for M {}
