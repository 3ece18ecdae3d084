//! SQL for a book collection.
//!
//! Every statement is rendered once per store from the (validated)
//! collection name. Documents live in a single JSON `doc` column; the
//! implicit `rowid` gives listing its stable insertion order.

pub struct Statements {
  pub create:     String,
  pub find_all:   String,
  pub find_by_id: String,
  pub insert:     String,
  pub update:     String,
  pub delete:     String,
}

impl Statements {
  pub fn for_collection(collection: &str) -> Self {
    Self {
      create:     format!(
        "PRAGMA journal_mode = WAL;
         CREATE TABLE IF NOT EXISTS {collection} (
             id  TEXT PRIMARY KEY,   -- 24 lowercase hex chars
             doc TEXT NOT NULL       -- JSON document without the id
         );"
      ),
      find_all:   format!(
        "SELECT id, doc FROM {collection} ORDER BY rowid LIMIT ?1"
      ),
      find_by_id: format!(
        "SELECT id, doc FROM {collection} WHERE id = ?1 ORDER BY rowid LIMIT ?2"
      ),
      insert:     format!("INSERT INTO {collection} (id, doc) VALUES (?1, ?2)"),
      // Field-level replace; the id column is never written.
      update:     format!(
        "UPDATE {collection}
            SET doc = json_set(doc,
                               '$.author',      ?2,
                               '$.title',       ?3,
                               '$.releaseDate', ?4,
                               '$.keywords',    json(?5))
          WHERE id = ?1
          RETURNING id, doc"
      ),
      delete:     format!(
        "DELETE FROM {collection} WHERE id = ?1 RETURNING id, doc"
      ),
    }
  }
}

/// Liveness query; reads no collection.
pub const PING: &str = "SELECT 1";
