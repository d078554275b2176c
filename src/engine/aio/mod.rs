//! Async façade
//!
//! Same collections and semantics as the blocking handle, driven through
//! tokio-rusqlite. Every storage call suspends until the driver's
//! background thread has run the statement.
//!
//! There is no implicit cleanup: an `AsyncDante` must be closed with
//! `close().await`. Dropping it open leaves the driver thread to wind down
//! on its own, which may not happen before the runtime shuts down, and
//! uncommitted manual-commit work is lost either way.
//!
//! Nothing here is cancellable and there are no timeouts. Wrap a call in
//! `tokio::time::timeout` if one is needed; the statement itself still runs
//! to completion on the driver thread.

pub mod collection;
pub mod database;
pub mod record;

pub use collection::AsyncCollection;
pub use database::AsyncDante;
pub use record::AsyncActiveRecord;
