//! Caller-supplied deadline passed to every [`CatalogStore`] operation.
//!
//! Cancellation is expressed the Rust way: dropping the future returned by a
//! store method abandons the call. A [`Context`] only carries the deadline,
//! which backends combine with their own per-call budget via
//! [`Context::budget`].
//!
//! [`CatalogStore`]: crate::store::CatalogStore

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
  deadline: Option<Instant>,
}

impl Context {
  /// A context with no deadline.
  pub fn background() -> Self { Self::default() }

  /// A context that expires `timeout` from now.
  pub fn with_timeout(timeout: Duration) -> Self {
    Self { deadline: Instant::now().checked_add(timeout) }
  }

  pub fn with_deadline(deadline: Instant) -> Self {
    Self { deadline: Some(deadline) }
  }

  pub fn deadline(&self) -> Option<Instant> { self.deadline }

  /// Derive a context that expires after `timeout`, or earlier if `self`
  /// already does.
  pub fn child(&self, timeout: Duration) -> Self {
    let own = Self::with_timeout(timeout);
    match (self.deadline, own.deadline) {
      (Some(a), Some(b)) => Self::with_deadline(a.min(b)),
      (Some(a), None) => Self::with_deadline(a),
      (None, _) => own,
    }
  }

  /// Time left before the deadline; `None` when there is no deadline.
  pub fn remaining(&self) -> Option<Duration> {
    self
      .deadline
      .map(|d| d.saturating_duration_since(Instant::now()))
  }

  pub fn is_expired(&self) -> bool {
    self.remaining().is_some_and(|r| r.is_zero())
  }

  /// The time a single backend call may take: the smaller of the remaining
  /// deadline and `per_call`.
  pub fn budget(&self, per_call: Duration) -> Duration {
    match self.remaining() {
      Some(remaining) => remaining.min(per_call),
      None => per_call,
    }
  }
}
