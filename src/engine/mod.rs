// Dante Engine - Core module structure
pub mod aio;
pub mod catalog;
pub mod cli;
pub mod collection;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod model;
pub mod query;
pub mod registry;
pub mod statement;

pub use aio::{AsyncActiveRecord, AsyncCollection, AsyncDante};
pub use collection::Collection;
pub use config::Config;
pub use database::Dante;
pub use document::Document;
pub use error::{DanteError, Result};
pub use model::{CollectionKind, Model};
pub use query::{Criteria, FieldPath, PATH_DELIMITER};
pub use registry::{registry, ActiveRecord, Registry};
