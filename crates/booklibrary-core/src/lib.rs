//! Book catalog model, the storage contract and its error classification.
//!
//! No HTTP or database code lives here. Storage backends implement
//! [`store::CatalogStore`]; the REST layer depends on that trait only.

pub mod book;
pub mod context;
pub mod error;
pub mod store;

pub use book::{Book, Keyword};
pub use context::Context;
pub use error::{ErrorKind, StoreError};
pub use store::{CatalogStore, DEFAULT_LIMIT};
