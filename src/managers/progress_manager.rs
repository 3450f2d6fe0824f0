//! Reading progress persistence.
//!
//! One `reading_progress` row per article, overwritten on every save. The
//! article row's `progress` column mirrors the latest percentage so the
//! library list doesn't need a join.

use rusqlite::{params, Connection, OptionalExtension};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::types::errors::ProgressError;
use crate::types::progress::{ProgressSave, ReadingProgress};

/// Trait defining progress persistence operations.
pub trait ProgressManagerTrait {
    /// Overwrites the stored position of `article_id`.
    fn save_progress(&mut self, article_id: &str, offset: f64, percentage: u8) -> Result<(), ProgressError>;
    fn get_progress(&self, article_id: &str) -> Result<Option<ReadingProgress>, ProgressError>;
    /// Writes a debounced save from the progress tracker, including the read flag.
    fn apply_save(&mut self, save: &ProgressSave) -> Result<(), ProgressError>;
}

pub struct ProgressManager<'a> {
    conn: &'a Connection,
}

impl<'a> ProgressManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn write(conn: &Connection, article_id: &str, offset: f64, percentage: u8) -> Result<(), ProgressError> {
        let percentage = percentage.min(100);
        let now = Self::now();

        let affected = conn
            .execute(
                "UPDATE articles SET progress = ?1 WHERE id = ?2",
                params![percentage, article_id],
            )
            .map_err(|e| ProgressError::DatabaseError(e.to_string()))?;
        if affected == 0 {
            return Err(ProgressError::ArticleNotFound(article_id.to_string()));
        }

        conn.execute(
            "INSERT INTO reading_progress (article_id, scroll_offset, percentage, updated_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(article_id) DO UPDATE SET \
             scroll_offset = excluded.scroll_offset, \
             percentage = excluded.percentage, \
             updated_at = excluded.updated_at",
            params![article_id, offset.max(0.0), percentage, now],
        )
        .map_err(|e| ProgressError::DatabaseError(e.to_string()))?;

        debug!(article_id, percentage, offset, "progress saved");
        Ok(())
    }
}

impl<'a> ProgressManagerTrait for ProgressManager<'a> {
    fn save_progress(&mut self, article_id: &str, offset: f64, percentage: u8) -> Result<(), ProgressError> {
        Self::write(self.conn, article_id, offset, percentage)
    }

    fn get_progress(&self, article_id: &str) -> Result<Option<ReadingProgress>, ProgressError> {
        self.conn
            .query_row(
                "SELECT article_id, scroll_offset, percentage, updated_at \
                 FROM reading_progress WHERE article_id = ?1",
                params![article_id],
                |row| {
                    Ok(ReadingProgress {
                        article_id: row.get(0)?,
                        offset: row.get(1)?,
                        percentage: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(|e| ProgressError::DatabaseError(e.to_string()))
    }

    fn apply_save(&mut self, save: &ProgressSave) -> Result<(), ProgressError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| ProgressError::DatabaseError(e.to_string()))?;

        Self::write(&tx, &save.article_id, save.offset, save.percentage)?;
        if save.mark_read {
            tx.execute(
                "UPDATE articles SET is_read = 1 WHERE id = ?1",
                params![save.article_id],
            )
            .map_err(|e| ProgressError::DatabaseError(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| ProgressError::DatabaseError(e.to_string()))
    }
}
