//! The `Book` record and its nested `Keyword` value.
//!
//! The serde derives here define the wire format. Decoding is strict: any
//! unrecognised field is an error, at the top level and inside keywords.
//! `releaseDate` travels as whole seconds since the Unix epoch.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Keyword ─────────────────────────────────────────────────────────────────

/// A single topic tag. Rendered as `{"keyword": "<value>"}`, never as a bare
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Keyword {
  #[serde(rename = "keyword")]
  pub value: String,
}

impl Keyword {
  pub fn new(value: impl Into<String>) -> Self { Self { value: value.into() } }
}

impl fmt::Display for Keyword {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.value)
  }
}

impl From<&str> for Keyword {
  fn from(value: &str) -> Self { Self::new(value) }
}

// ─── Book ────────────────────────────────────────────────────────────────────

/// A book in the catalog.
///
/// `id` is `None` until the store has assigned one. Keywords are an ordered
/// list; duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Book {
  #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
  pub id:           Option<String>,
  pub author:       String,
  pub title:        String,
  /// Full resolution in memory and in the store; whole seconds on the wire.
  #[serde(with = "chrono::serde::ts_seconds")]
  pub release_date: DateTime<Utc>,
  #[serde(default)]
  pub keywords:     Vec<Keyword>,
}

impl Book {
  /// A book that has not been stored yet.
  pub fn new(
    author: impl Into<String>,
    title: impl Into<String>,
    release_date: DateTime<Utc>,
  ) -> Self {
    Self {
      id: None,
      author: author.into(),
      title: title.into(),
      release_date,
      keywords: Vec::new(),
    }
  }

  pub fn with_keywords<I, K>(mut self, keywords: I) -> Self
  where
    I: IntoIterator<Item = K>,
    K: Into<Keyword>,
  {
    self.keywords = keywords.into_iter().map(Into::into).collect();
    self
  }

  /// Return a copy carrying `id`.
  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }
}
