//! Dante - zero-setup document store on top of SQLite
//!
//! Each collection is one SQLite table holding one JSON document per row.
//! Documents are found by equality on field paths, with `__` separating
//! nested keys:
//!
//! ```
//! use dante::{criteria, Dante};
//! use serde_json::json;
//!
//! # fn main() -> dante::Result<()> {
//! let db = Dante::memory()?;
//! let coll = db.collection("mycollection")?;
//! coll.insert(json!({"a": {"b": 1}}).as_object().unwrap())?;
//!
//! assert!(coll.find_one(&criteria! { "a__b" => 1 })?.is_some());
//! assert!(coll.find_one(&criteria! { "a__b" => 2 })?.is_none());
//! # Ok(())
//! # }
//! ```
//!
//! [`Dante`] is the blocking handle, [`AsyncDante`] the async one. Typed
//! collections come from [`Dante::model`] with any [`Model`].

pub mod engine;

pub use engine::{
    registry, ActiveRecord, AsyncActiveRecord, AsyncCollection, AsyncDante, Collection,
    CollectionKind, Config, Criteria, Dante, DanteError, Document, FieldPath, Model, Registry,
    Result, PATH_DELIMITER,
};

/// Build [`Criteria`] from `path => value` pairs.
///
/// ```
/// let c = dante::criteria! { "name" => "Dante", "address__city" => "Florence" };
/// assert_eq!(c.len(), 2);
/// ```
#[macro_export]
macro_rules! criteria {
    () => {
        $crate::Criteria::new()
    };
    ($($path:expr => $value:expr),+ $(,)?) => {
        $crate::Criteria::new()$(.eq($path, $value))+
    };
}
