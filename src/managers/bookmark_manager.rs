//! Bookmark Manager.
//!
//! Implements `BookmarkManagerTrait`: saved reading positions inside an
//! article, backed by SQLite via `rusqlite`. Position lookups use a fixed
//! tolerance ([`BOOKMARK_TOLERANCE`]) so a bookmark at 40% is found again
//! when the reader sits at 41%.

use rusqlite::{params, Connection};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use uuid::Uuid;

use crate::types::bookmark::{Bookmark, BOOKMARK_TOLERANCE};
use crate::types::errors::BookmarkError;

/// Result of toggling a bookmark at the current position.
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkToggle {
    Added(String),
    Removed(String),
}

/// Trait defining bookmark management operations.
pub trait BookmarkManagerTrait {
    /// Returns the generated bookmark ID.
    fn add_bookmark(&mut self, article_id: &str, percentage: f64, label: &str) -> Result<String, BookmarkError>;
    fn delete_bookmark(&mut self, id: &str) -> Result<(), BookmarkError>;
    /// Bookmarks of one article, in reading order.
    fn list_bookmarks(&self, article_id: &str) -> Result<Vec<Bookmark>, BookmarkError>;
    /// Closest bookmark within tolerance of `percentage`, if any.
    fn find_bookmark(&self, article_id: &str, percentage: f64) -> Result<Option<Bookmark>, BookmarkError>;
    /// Removes the bookmark at `percentage` if one exists, adds one otherwise.
    fn toggle_bookmark(&mut self, article_id: &str, percentage: f64, label: &str) -> Result<BookmarkToggle, BookmarkError>;
}

/// Bookmark manager backed by a SQLite connection.
pub struct BookmarkManager<'a> {
    conn: &'a Connection,
}

impl<'a> BookmarkManager<'a> {
    /// Creates a new `BookmarkManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn article_exists(&self, article_id: &str) -> Result<bool, BookmarkError> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM articles WHERE id = ?1",
                params![article_id],
                |row| row.get(0),
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        Ok(count > 0)
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            article_id: row.get(1)?,
            percentage: row.get(2)?,
            label: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn default_label(percentage: f64) -> String {
        format!("{}%", percentage.round() as i64)
    }
}

impl<'a> BookmarkManagerTrait for BookmarkManager<'a> {
    fn add_bookmark(&mut self, article_id: &str, percentage: f64, label: &str) -> Result<String, BookmarkError> {
        if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
            return Err(BookmarkError::InvalidPercentage(percentage));
        }
        if !self.article_exists(article_id)? {
            return Err(BookmarkError::ArticleNotFound(article_id.to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let label = match label.trim() {
            "" => Self::default_label(percentage),
            l => l.to_string(),
        };

        self.conn
            .execute(
                "INSERT INTO bookmarks (id, article_id, percentage, label, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, article_id, percentage, label, Self::now()],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        info!(id = %id, article_id, percentage, "bookmark added");
        Ok(id)
    }

    fn delete_bookmark(&mut self, id: &str) -> Result<(), BookmarkError> {
        let affected = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?1", params![id])
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(BookmarkError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_bookmarks(&self, article_id: &str) -> Result<Vec<Bookmark>, BookmarkError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, article_id, percentage, label, created_at \
                 FROM bookmarks WHERE article_id = ?1 ORDER BY percentage, created_at",
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(params![article_id], Self::row_to_bookmark)
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| BookmarkError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    fn find_bookmark(&self, article_id: &str, percentage: f64) -> Result<Option<Bookmark>, BookmarkError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, article_id, percentage, label, created_at \
                 FROM bookmarks WHERE article_id = ?1 AND ABS(percentage - ?2) <= ?3 \
                 ORDER BY ABS(percentage - ?2), created_at LIMIT 1",
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![article_id, percentage, BOOKMARK_TOLERANCE], Self::row_to_bookmark)
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(|e| BookmarkError::DatabaseError(e.to_string()))?)),
            None => Ok(None),
        }
    }

    fn toggle_bookmark(&mut self, article_id: &str, percentage: f64, label: &str) -> Result<BookmarkToggle, BookmarkError> {
        match self.find_bookmark(article_id, percentage)? {
            Some(existing) => {
                self.delete_bookmark(&existing.id)?;
                Ok(BookmarkToggle::Removed(existing.id))
            }
            None => self
                .add_bookmark(article_id, percentage, label)
                .map(BookmarkToggle::Added),
        }
    }
}
