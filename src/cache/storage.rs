//! SQLite implementation of the post cache.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::traits::PostStore;
use crate::posts::{Origin, Post};

/// Schema for the post cache.
///
/// `sort_key` fixes a post's position when it is first written: local posts get
/// `-id` (newest first, ahead of everything fetched), remote posts get `id`.
/// Upserts leave it alone so a confirmed local post does not jump around.
const CACHE_SCHEMA: &str = r#"
PRAGMA user_version = 1;

CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    origin TEXT NOT NULL CHECK (origin IN ('local', 'remote')),
    sort_key INTEGER NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_posts_sort ON posts(sort_key, id);
CREATE INDEX IF NOT EXISTS idx_posts_origin ON posts(origin);
"#;

const UPSERT_POST: &str = r#"
INSERT INTO posts (id, user_id, title, body, origin, sort_key, cached_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
ON CONFLICT(id) DO UPDATE SET
    user_id = excluded.user_id,
    title = excluded.title,
    body = excluded.body,
    origin = excluded.origin,
    cached_at = excluded.cached_at
"#;

const SELECT_POSTS: &str = "SELECT id, user_id, title, body, origin FROM posts";

/// SQLite-based post cache.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open or create the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// A throwaway cache that lives only as long as the value.
  #[cfg(test)]
  pub fn in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;

    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  fn run_migrations(&self) -> Result<()> {
    self
      .lock()?
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  fn upsert(conn: &Connection, post: &Post) -> Result<()> {
    let sort_key = match post.origin {
      Origin::Local => -post.id,
      Origin::Remote => post.id,
    };

    conn
      .execute(
        UPSERT_POST,
        params![
          post.id,
          post.user_id,
          post.title,
          post.body,
          post.origin.as_str(),
          sort_key
        ],
      )
      .map_err(|e| eyre!("Failed to store post {}: {}", post.id, e))?;

    Ok(())
  }

  fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Post>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare(sql)
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let posts = stmt
      .query_map(params, row_to_post)
      .map_err(|e| eyre!("Failed to query posts: {}", e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to read post row: {}", e))?;

    Ok(posts)
  }
}

impl PostStore for SqliteStorage {
  fn insert(&self, post: &Post) -> Result<()> {
    let conn = self.lock()?;
    Self::upsert(&conn, post)
  }

  fn insert_all(&self, posts: &[Post]) -> Result<()> {
    self.replace_page(posts, false)
  }

  fn replace_page(&self, posts: &[Post], clear_confirmed: bool) -> Result<()> {
    let mut conn = self.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    if clear_confirmed {
      tx.execute("DELETE FROM posts WHERE origin = 'remote'", [])
        .map_err(|e| eyre!("Failed to clear confirmed posts: {}", e))?;
    }

    for post in posts {
      Self::upsert(&tx, post)?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn delete_confirmed_only(&self) -> Result<usize> {
    let conn = self.lock()?;

    let removed = conn
      .execute("DELETE FROM posts WHERE origin = 'remote'", [])
      .map_err(|e| eyre!("Failed to clear confirmed posts: {}", e))?;

    Ok(removed)
  }

  fn read_all_once(&self) -> Result<Vec<Post>> {
    self.query(&format!("{SELECT_POSTS} ORDER BY sort_key, id"), [])
  }

  fn read_page(&self, offset: usize, limit: usize) -> Result<Vec<Post>> {
    self.query(
      &format!("{SELECT_POSTS} ORDER BY sort_key, id LIMIT ?1 OFFSET ?2"),
      params![limit as i64, offset as i64],
    )
  }

  fn get(&self, id: i64) -> Result<Option<Post>> {
    let conn = self.lock()?;

    conn
      .query_row(
        &format!("{SELECT_POSTS} WHERE id = ?1"),
        params![id],
        row_to_post,
      )
      .optional()
      .map_err(|e| eyre!("Failed to load post {}: {}", id, e))
  }

  fn count(&self) -> Result<usize> {
    let conn = self.lock()?;

    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to count posts: {}", e))?;

    Ok(count as usize)
  }
}

fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
  let origin: String = row.get(4)?;
  let origin = Origin::parse(&origin).ok_or_else(|| {
    rusqlite::Error::InvalidColumnType(4, "origin".to_string(), rusqlite::types::Type::Text)
  })?;

  Ok(Post {
    id: row.get(0)?,
    user_id: row.get(1)?,
    title: row.get(2)?,
    body: row.get(3)?,
    origin,
  })
}
