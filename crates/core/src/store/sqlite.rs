//! SQLite-backed book cache implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{BookRecord, BookStore, StoreError, StoreStats};

/// SQLite-backed book store with an FTS5 index for relevance search.
pub struct SqliteBookStore {
    conn: Mutex<Connection>,
}

impl SqliteBookStore {
    /// Create a new store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Cached book records (one row per title+author identity)
            CREATE TABLE IF NOT EXISTS books (
                identity_key TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                overview TEXT NOT NULL DEFAULT '',
                cover_url TEXT NOT NULL,
                isbn TEXT NOT NULL DEFAULT '',
                year TEXT NOT NULL DEFAULT '',
                genre TEXT NOT NULL DEFAULT '[]',
                pages TEXT NOT NULL DEFAULT '',
                publisher TEXT NOT NULL DEFAULT '',
                first_cached_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Canonical queries each book has been returned for (the tag set).
            -- The UNIQUE pair makes INSERT OR IGNORE an atomic add-to-set, so
            -- concurrent upserts for one identity cannot drop tags.
            CREATE TABLE IF NOT EXISTS book_query_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identity_key TEXT NOT NULL REFERENCES books(identity_key) ON DELETE CASCADE,
                query TEXT NOT NULL,
                tagged_at TEXT NOT NULL,
                UNIQUE(identity_key, query)
            );

            CREATE INDEX IF NOT EXISTS idx_book_query_tags_query ON book_query_tags(query);

            -- Cached download-link candidates per book.
            CREATE TABLE IF NOT EXISTS book_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identity_key TEXT NOT NULL REFERENCES books(identity_key) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                url TEXT NOT NULL,
                UNIQUE(identity_key, position)
            );

            -- Relevance index over the searchable fields, kept in sync
            -- manually on every upsert/delete.
            CREATE VIRTUAL TABLE IF NOT EXISTS books_fts USING fts5(
                title,
                author,
                overview,
                isbn,
                identity_key UNINDEXED,
                tokenize='porter'
            );
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// Load the tag set for a book, in tagging order.
    fn load_tags(conn: &Connection, identity_key: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = conn
            .prepare("SELECT query FROM book_query_tags WHERE identity_key = ? ORDER BY id")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![identity_key], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(tags)
    }

    /// Load the cached download links for a book.
    fn load_links(conn: &Connection, identity_key: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = conn
            .prepare("SELECT url FROM book_links WHERE identity_key = ? ORDER BY position")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![identity_key], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut links = Vec::new();
        for row in rows {
            links.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(links)
    }

    /// Convert a row to a BookRecord (without tags/links).
    fn row_to_book(row: &rusqlite::Row) -> rusqlite::Result<BookRecord> {
        let genre_json: String = row.get(7)?;
        let first_cached_str: String = row.get(10)?;
        let updated_str: String = row.get(11)?;

        let first_cached_at = DateTime::parse_from_rfc3339(&first_cached_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(BookRecord {
            identity_key: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            overview: row.get(3)?,
            cover_url: row.get(4)?,
            isbn: row.get(5)?,
            year: row.get(6)?,
            genre: serde_json::from_str(&genre_json).unwrap_or_default(),
            pages: row.get(8)?,
            publisher: row.get(9)?,
            download_links: Vec::new(), // Loaded separately
            cached_for_queries: Vec::new(),
            first_cached_at,
            updated_at,
        })
    }

    const BOOK_COLUMNS: &'static str = "identity_key, title, author, overview, cover_url, \
         isbn, year, genre, pages, publisher, first_cached_at, updated_at";

    /// Load one complete record (scalars + tags + links).
    fn load_book(conn: &Connection, identity_key: &str) -> Result<Option<BookRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM books WHERE identity_key = ?",
            Self::BOOK_COLUMNS
        );
        let result = conn.query_row(&sql, params![identity_key], Self::row_to_book);

        let mut book = match result {
            Ok(book) => book,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(StoreError::Database(e.to_string())),
        };

        book.cached_for_queries = Self::load_tags(conn, identity_key)?;
        book.download_links = Self::load_links(conn, identity_key)?;
        Ok(Some(book))
    }

    /// Overwrite the scalar columns for a record, inserting it if absent.
    /// Preserves first_cached_at, the tag set and the link cache.
    fn write_scalars(conn: &Connection, record: &BookRecord) -> Result<(), StoreError> {
        let now_str = Utc::now().to_rfc3339();
        let genre_json = serde_json::to_string(&record.genre)
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        conn.execute(
            "INSERT INTO books (identity_key, title, author, overview, cover_url, isbn, year, genre, pages, publisher, first_cached_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(identity_key) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                overview = excluded.overview,
                cover_url = excluded.cover_url,
                isbn = excluded.isbn,
                year = excluded.year,
                genre = excluded.genre,
                pages = excluded.pages,
                publisher = excluded.publisher,
                updated_at = excluded.updated_at",
            params![
                &record.identity_key,
                &record.title,
                &record.author,
                &record.overview,
                &record.cover_url,
                &record.isbn,
                &record.year,
                &genre_json,
                &record.pages,
                &record.publisher,
                &now_str,
                &now_str,
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// Replace the FTS row for a record.
    fn reindex(conn: &Connection, record: &BookRecord) -> Result<(), StoreError> {
        conn.execute(
            "DELETE FROM books_fts WHERE identity_key = ?",
            params![&record.identity_key],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO books_fts (title, author, overview, isbn, identity_key)
             VALUES (?, ?, ?, ?, ?)",
            params![
                &record.title,
                &record.author,
                &record.overview,
                &record.isbn,
                &record.identity_key,
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

/// Build an FTS5 MATCH expression from a canonical query.
///
/// Each token is double-quoted (no bareword syntax surprises) and tokens are
/// joined with OR: the text tier is recall-oriented and the orchestrator's
/// hit-count threshold decides whether the matches are trusted.
fn fts_match_expr(canonical_query: &str) -> Option<String> {
    let tokens: Vec<String> = canonical_query
        .split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "")))
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

impl BookStore for SqliteBookStore {
    fn get_by_identity(&self, key: &str) -> Result<Option<BookRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::load_book(&conn, key)
    }

    fn get_exact(&self, canonical_query: &str) -> Result<Vec<BookRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT b.identity_key FROM books b
                 JOIN book_query_tags t ON b.identity_key = t.identity_key
                 WHERE t.query = ?
                 ORDER BY b.rowid",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![canonical_query], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }

        let mut results = Vec::new();
        for key in keys {
            if let Some(book) = Self::load_book(&conn, &key)? {
                results.push(book);
            }
        }
        Ok(results)
    }

    fn search_text(
        &self,
        canonical_query: &str,
        limit: u32,
    ) -> Result<Vec<BookRecord>, StoreError> {
        let Some(match_expr) = fts_match_expr(canonical_query) else {
            return Ok(Vec::new());
        };

        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT identity_key FROM books_fts
                 WHERE books_fts MATCH ?1
                 ORDER BY rank
                 LIMIT ?2",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![&match_expr, limit as i64], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }

        let mut results = Vec::new();
        for key in keys {
            if let Some(book) = Self::load_book(&conn, &key)? {
                results.push(book);
            }
        }
        Ok(results)
    }

    fn upsert_with_tag(
        &self,
        record: &BookRecord,
        canonical_query: &str,
    ) -> Result<BookRecord, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let now_str = Utc::now().to_rfc3339();

        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Self::write_scalars(&tx, record)?;

        // Atomic add-to-set: re-adding an existing tag is a no-op.
        tx.execute(
            "INSERT OR IGNORE INTO book_query_tags (identity_key, query, tagged_at)
             VALUES (?, ?, ?)",
            params![&record.identity_key, canonical_query, &now_str],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Self::reindex(&tx, record)?;

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;

        Self::load_book(&conn, &record.identity_key)?.ok_or_else(|| {
            StoreError::Internal(format!(
                "record vanished after upsert: {}",
                record.identity_key
            ))
        })
    }

    fn insert_new(&self, record: &BookRecord) -> Result<BookRecord, StoreError> {
        let mut conn = self.conn.lock().unwrap();

        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM books WHERE identity_key = ?",
                params![&record.identity_key],
                |_| Ok(true),
            )
            .unwrap_or(false);

        if exists {
            return Err(StoreError::Conflict(record.identity_key.clone()));
        }

        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Self::write_scalars(&tx, record)?;
        Self::reindex(&tx, record)?;

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;

        Self::load_book(&conn, &record.identity_key)?.ok_or_else(|| {
            StoreError::Internal(format!(
                "record vanished after insert: {}",
                record.identity_key
            ))
        })
    }

    fn set_download_links(&self, key: &str, links: &[String]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();

        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM books WHERE identity_key = ?",
                params![key],
                |_| Ok(true),
            )
            .unwrap_or(false);

        // No-op for unknown identities.
        if !exists {
            return Ok(());
        }

        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute("DELETE FROM book_links WHERE identity_key = ?", params![key])
            .map_err(|e| StoreError::Database(e.to_string()))?;

        for (position, url) in links.iter().enumerate() {
            tx.execute(
                "INSERT INTO book_links (identity_key, position, url) VALUES (?, ?, ?)",
                params![key, position as i64, url],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete_by_identity(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute("DELETE FROM books_fts WHERE identity_key = ?", params![key])
            .map_err(|e| StoreError::Database(e.to_string()))?;

        // Tags and links cascade.
        let rows_affected = tx
            .execute("DELETE FROM books WHERE identity_key = ?", params![key])
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows_affected > 0)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn.lock().unwrap();

        let total_books: u64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let total_queries: u64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT query) FROM book_query_tags",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let books_with_links: u64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT identity_key) FROM book_links",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let oldest_entry: Option<DateTime<Utc>> = conn
            .query_row("SELECT MIN(first_cached_at) FROM books", [], |row| {
                let s: Option<String> = row.get(0)?;
                Ok(s)
            })
            .map_err(|e| StoreError::Database(e.to_string()))?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let newest_entry: Option<DateTime<Utc>> = conn
            .query_row("SELECT MAX(updated_at) FROM books", [], |row| {
                let s: Option<String> = row.get(0)?;
                Ok(s)
            })
            .map_err(|e| StoreError::Database(e.to_string()))?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(StoreStats {
            total_books,
            total_queries,
            books_with_links,
            oldest_entry,
            newest_entry,
        })
    }
}
