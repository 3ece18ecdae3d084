//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].

use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use booklibrary_core::{Book, CatalogStore, Context};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, ObjectId, Result, StoreOptions,
  encode::{FieldUpdate, RawDocument, decode_id, encode_document},
  guard::CallLimit,
  schema::{PING, Statements},
};

/// Extra wait past a call's budget for its result to come back from the
/// connection thread. The connection-side limit is authoritative; this only
/// stops a caller from waiting forever behind a stuck queue.
const DELIVERY_GRACE: Duration = Duration::from_millis(250);

/// Selects the documents a find call returns.
enum Filter {
  All,
  Id(ObjectId),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A book collection backed by a single SQLite database.
///
/// Cloning is cheap; the inner connection is reference-counted, and all
/// clones share it. Concurrent calls are queued by the connection itself.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  sql:             Arc<Statements>,
  call_timeout:    Duration,
}

impl SqliteStore {
  /// Validate `options`, open the database, create the collection and ping
  /// it, all within the startup timeout. Nothing is returned unless every
  /// step succeeds.
  pub async fn open(options: StoreOptions) -> Result<Self> {
    if let Err(e) = options.validate() {
      tracing::error!(error = %e, ?options, "validating store options");
      return Err(e);
    }

    let startup = options.startup_timeout;
    match tokio::time::timeout(startup, Self::connect(options)).await {
      Ok(result) => result,
      Err(_) => {
        tracing::error!(timeout = ?startup, "opening store timed out");
        Err(Error::Timeout(startup))
      }
    }
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open(StoreOptions::in_memory("books")).await
  }

  async fn connect(options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(&options.path)
      .await
      .inspect_err(|e| tracing::error!(error = %e, path = ?options.path, "opening database"))?;

    let sql = Statements::for_collection(&options.collection);
    let create = sql.create.clone();
    conn
      .call(move |conn| Ok(conn.execute_batch(&create)?))
      .await
      .inspect_err(|e| tracing::error!(error = %e, "creating collection"))?;

    let store = Self {
      conn,
      sql: Arc::new(sql),
      call_timeout: options.call_timeout,
    };
    store
      .ping(Context::background())
      .await
      .inspect_err(|e| tracing::error!(error = %e, "pinging database"))?;

    tracing::debug!(
      path = ?options.path,
      collection = %options.collection,
      "store ready"
    );
    Ok(store)
  }

  /// Close the underlying connection. Calls on other clones fail afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Run `f` on the connection thread within the budget derived from `ctx`.
  ///
  /// The limit travels with the closure: a call still queued when its
  /// deadline passes, or whose caller went away, returns without executing,
  /// and a running statement is stopped by the progress handler. Other
  /// calls on the connection are never affected.
  pub(crate) async fn bounded<T, F>(&self, ctx: Context, op: &'static str, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    let budget = ctx.budget(self.call_timeout);
    let (limit, _cancel_on_drop) = CallLimit::new(ctx.child(self.call_timeout), budget);

    let call = self.conn.call(move |conn| Ok(limit.run(conn, f)));
    let result = match tokio::time::timeout(budget + DELIVERY_GRACE, call).await {
      Ok(Ok(result)) => result,
      Ok(Err(e)) => Err(Error::from(e)),
      Err(_) => Err(Error::Timeout(budget)),
    };
    if let Err(Error::Timeout(_)) = &result {
      tracing::warn!(op, ?budget, "database call timed out");
    }
    result
  }

  /// The single read primitive behind `list` and `get`. An empty match is an
  /// empty vector, never an error.
  async fn find(&self, ctx: Context, filter: Filter, limit: NonZeroUsize) -> Result<Vec<Book>> {
    let limit = i64::try_from(limit.get()).unwrap_or(i64::MAX);
    let sql = Arc::clone(&self.sql);

    let raws: Vec<RawDocument> = self
      .bounded(ctx, "find", move |conn| {
        let rows = match filter {
          Filter::All => {
            let mut stmt = conn.prepare(&sql.find_all)?;
            stmt
              .query_map(rusqlite::params![limit], RawDocument::from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?
          }
          Filter::Id(oid) => {
            let mut stmt = conn.prepare(&sql.find_by_id)?;
            stmt
              .query_map(
                rusqlite::params![oid.to_hex(), limit],
                RawDocument::from_row,
              )?
              .collect::<rusqlite::Result<Vec<_>>>()?
          }
        };
        Ok(rows)
      })
      .await
      .inspect_err(|e| tracing::error!(error = %e, "finding documents"))?;

    raws
      .into_iter()
      .map(RawDocument::into_book)
      .collect::<Result<_>>()
      .inspect_err(|e| tracing::error!(error = %e, "decoding document"))
  }

  async fn insert(&self, ctx: Context, book: Book) -> Result<Book> {
    let id = ObjectId::new().to_hex();
    let doc = encode_document(book.clone())?;
    let sql = Arc::clone(&self.sql);

    let id_param = id.clone();
    self
      .bounded(ctx, "add", move |conn| {
        conn.execute(&sql.insert, rusqlite::params![id_param, doc])?;
        Ok(())
      })
      .await
      .inspect_err(|e| tracing::error!(error = %e, "inserting document"))?;

    Ok(book.with_id(id))
  }

  async fn replace_fields(&self, ctx: Context, id: &str, book: Book) -> Result<Book> {
    let oid = parse_id(id)?;
    let fields = FieldUpdate::from_book(book)?;
    let sql = Arc::clone(&self.sql);

    let raw: Option<RawDocument> = self
      .bounded(ctx, "update", move |conn| {
        Ok(
          conn
            .query_row(
              &sql.update,
              rusqlite::params![
                oid.to_hex(),
                fields.author,
                fields.title,
                fields.release_date,
                fields.keywords,
              ],
              RawDocument::from_row,
            )
            .optional()?,
        )
      })
      .await
      .inspect_err(|e| tracing::error!(error = %e, id, "updating document"))?;

    match raw {
      Some(raw) => raw.into_book(),
      None => Err(Error::NotFound(id.to_owned())),
    }
  }

  async fn delete(&self, ctx: Context, id: &str) -> Result<Book> {
    let oid = parse_id(id)?;
    let sql = Arc::clone(&self.sql);

    let raw: Option<RawDocument> = self
      .bounded(ctx, "remove", move |conn| {
        Ok(
          conn
            .query_row(&sql.delete, rusqlite::params![oid.to_hex()], RawDocument::from_row)
            .optional()?,
        )
      })
      .await
      .inspect_err(|e| tracing::error!(error = %e, id, "deleting document"))?;

    match raw {
      Some(raw) => raw.into_book(),
      None => Err(Error::NotFound(id.to_owned())),
    }
  }
}

fn parse_id(id: &str) -> Result<ObjectId> {
  decode_id(id).inspect_err(|e| tracing::error!(error = %e, id, "parsing object id"))
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  async fn list(&self, ctx: Context, limit: NonZeroUsize) -> Result<Vec<Book>> {
    self.find(ctx, Filter::All, limit).await
  }

  async fn get(&self, ctx: Context, id: &str) -> Result<Book> {
    let oid = parse_id(id)?;
    let books = self.find(ctx, Filter::Id(oid), NonZeroUsize::MIN).await?;
    books
      .into_iter()
      .next()
      .ok_or_else(|| Error::NotFound(id.to_owned()))
  }

  async fn add(&self, ctx: Context, book: Book) -> Result<Book> {
    self.insert(ctx, book).await
  }

  async fn update(&self, ctx: Context, id: &str, book: Book) -> Result<Book> {
    self.replace_fields(ctx, id, book).await
  }

  async fn remove(&self, ctx: Context, id: &str) -> Result<Book> {
    self.delete(ctx, id).await
  }

  async fn ping(&self, ctx: Context) -> Result<()> {
    self
      .bounded(ctx, "ping", |conn| {
        conn.query_row(PING, [], |row| row.get::<_, i64>(0))?;
        Ok(())
      })
      .await
  }
}
