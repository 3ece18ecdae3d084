//! Encoding and decoding between [`Book`] and the stored JSON document.
//!
//! Unlike the wire format, documents keep `releaseDate` at full resolution as
//! an RFC 3339 string. The id lives in its own column, not in the document.

use booklibrary_core::{Book, Keyword};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, ObjectId, Result};

// ─── Document ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
  pub author:       String,
  pub title:        String,
  pub release_date: DateTime<Utc>,
  #[serde(default)]
  pub keywords:     Vec<Keyword>,
}

impl From<Book> for Document {
  fn from(b: Book) -> Self {
    Document {
      author:       b.author,
      title:        b.title,
      release_date: b.release_date,
      keywords:     b.keywords,
    }
  }
}

pub fn encode_document(book: Book) -> Result<String> {
  Ok(serde_json::to_string(&Document::from(book))?)
}

/// The four replaceable fields, pre-rendered as `json_set` arguments.
pub struct FieldUpdate {
  pub author:       String,
  pub title:        String,
  pub release_date: String,
  pub keywords:     String,
}

impl FieldUpdate {
  pub fn from_book(book: Book) -> Result<Self> {
    Ok(Self {
      author:       book.author,
      title:        book.title,
      release_date: encode_dt(book.release_date),
      keywords:     serde_json::to_string(&book.keywords)?,
    })
  }
}

// ─── ObjectId ────────────────────────────────────────────────────────────────

pub fn decode_id(id: &str) -> Result<ObjectId> {
  id.parse().map_err(|_| Error::InvalidId(id.to_owned()))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Must render exactly like the `DateTime` serde impl used by [`Document`].
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw strings read directly from a collection row.
pub struct RawDocument {
  pub id:  String,
  pub doc: String,
}

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, doc: row.get(1)? })
  }

  pub fn into_book(self) -> Result<Book> {
    let doc: Document = serde_json::from_str(&self.doc)?;
    Ok(Book {
      id:           Some(self.id),
      author:       doc.author,
      title:        doc.title,
      release_date: doc.release_date,
      keywords:     doc.keywords,
    })
  }
}
