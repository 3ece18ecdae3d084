//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `booklibrary-store-sqlite`). The REST layer depends on this abstraction,
//! not on any concrete backend.

use std::{future::Future, num::NonZeroUsize};

use crate::{book::Book, context::Context, error::StoreError};

/// The page size used when a caller does not ask for a valid one.
pub const DEFAULT_LIMIT: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// CRUD access to the book catalog.
///
/// Ids are opaque strings; their encoding is a backend detail. Malformed ids
/// fail with [`ErrorKind::InvalidId`](crate::ErrorKind::InvalidId), unknown
/// ones with [`ErrorKind::NotFound`](crate::ErrorKind::NotFound).
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: StoreError;

  /// Return at most `limit` books in a stable, backend-defined order.
  fn list(
    &self,
    ctx: Context,
    limit: NonZeroUsize,
  ) -> impl Future<Output = Result<Vec<Book>, Self::Error>> + Send + '_;

  fn get<'a>(
    &'a self,
    ctx: Context,
    id: &'a str,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + 'a;

  /// Persist a new book. Any id on the input is ignored; the returned book
  /// carries the store-assigned one.
  fn add(
    &self,
    ctx: Context,
    book: Book,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  /// Replace author, title, release date and keywords of the book with `id`
  /// and return the stored result. The id in `book` is ignored.
  fn update<'a>(
    &'a self,
    ctx: Context,
    id: &'a str,
    book: Book,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + 'a;

  /// Delete the book with `id` and return what was stored.
  fn remove<'a>(
    &'a self,
    ctx: Context,
    id: &'a str,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + 'a;

  /// Check that the backing store is reachable. Touches no records.
  fn ping(
    &self,
    ctx: Context,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
