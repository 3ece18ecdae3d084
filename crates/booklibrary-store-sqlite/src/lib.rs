//! SQLite-backed document collection for the book library.
//!
//! Each book is one JSON document in a single collection table, keyed by a
//! 12-byte object id. Wraps [`tokio_rusqlite`] so all database access runs on
//! a dedicated thread without blocking the async runtime.

mod encode;
mod guard;
mod oid;
mod options;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use oid::ObjectId;
pub use options::StoreOptions;
pub use store::SqliteStore;
