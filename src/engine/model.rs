//! Declared record types
//!
//! A `Model` is any serde-serializable struct that gets its own collection.
//! Validation is whatever the type's `Deserialize` impl enforces: missing or
//! mistyped fields, `#[serde(deny_unknown_fields)]`, `#[serde(try_from)]`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;

pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table backing this type.
    ///
    /// Defaults to the fully qualified type path (`app::models::Message`) so
    /// two types with the same short name in different modules never share
    /// a table. Override to pin a short or legacy name.
    fn collection_name() -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

/// Which codec a collection handle is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Free-form `Document` maps
    FreeForm,
    /// Instances of one `Model` type, identified by its type name
    Typed(&'static str),
}

impl CollectionKind {
    pub fn of<M: Model>() -> Self {
        CollectionKind::Typed(std::any::type_name::<M>())
    }

    pub fn is_typed(&self) -> bool {
        matches!(self, CollectionKind::Typed(_))
    }
}
