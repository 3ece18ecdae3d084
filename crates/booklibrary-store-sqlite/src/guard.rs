//! Per-call abort conditions, evaluated on the connection thread.
//!
//! A call is abandoned when its deadline passes or when the future that
//! queued it is dropped. The check runs once before the closure starts and
//! then from SQLite's progress handler while its statements execute, so an
//! expired call never touches the database and a running one is stopped
//! without disturbing any other call on the shared connection.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use booklibrary_core::Context;

use crate::{Error, Result};

/// SQLite VM instructions between two abort checks.
const PROGRESS_OPS: i32 = 1_000;

/// Connection-side view of one call.
#[derive(Clone)]
pub struct CallLimit {
  ctx:       Context,
  budget:    Duration,
  cancelled: Arc<AtomicBool>,
}

impl CallLimit {
  pub fn new(ctx: Context, budget: Duration) -> (Self, CancelOnDrop) {
    let cancelled = Arc::new(AtomicBool::new(false));
    let limit = Self { ctx, budget, cancelled: Arc::clone(&cancelled) };
    (limit, CancelOnDrop(cancelled))
  }

  fn abort_reason(&self) -> Option<Error> {
    if self.cancelled.load(Ordering::Acquire) {
      Some(Error::Cancelled)
    } else if self.ctx.is_expired() {
      Some(Error::Timeout(self.budget))
    } else {
      None
    }
  }

  /// Run `f` unless the call is already abandoned, with the progress
  /// handler armed for the duration of `f`.
  pub fn run<T, F>(self, conn: &mut rusqlite::Connection, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> Result<T>,
  {
    if let Some(reason) = self.abort_reason() {
      return Err(reason);
    }

    let watch = self.clone();
    conn.progress_handler(PROGRESS_OPS, Some(move || watch.abort_reason().is_some()));
    let result = f(conn);
    conn.progress_handler(0, None::<fn() -> bool>);

    match result {
      Err(Error::Sqlite(e)) if is_interrupted(&e) => {
        Err(self.abort_reason().unwrap_or(Error::Sqlite(e)))
      }
      other => other,
    }
  }
}

fn is_interrupted(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.code == rusqlite::ErrorCode::OperationInterrupted
  )
}

/// Marks the call abandoned when the caller's future goes away. Dropping it
/// after the call finished is harmless.
pub struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
  fn drop(&mut self) { self.0.store(true, Ordering::Release); }
}
