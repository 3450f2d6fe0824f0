//! Highlight Manager.
//!
//! Passages kept from long-press selections. Highlights belong to an
//! article and disappear with it.

use rusqlite::{params, Connection};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use uuid::Uuid;

use crate::types::errors::HighlightError;
use crate::types::highlight::{Highlight, HighlightColor};

pub trait HighlightManagerTrait {
    fn add_highlight(
        &mut self,
        article_id: &str,
        text: &str,
        color: HighlightColor,
        note: Option<&str>,
        percentage: f64,
    ) -> Result<String, HighlightError>;
    fn update_note(&mut self, id: &str, note: Option<&str>) -> Result<(), HighlightError>;
    fn delete_highlight(&mut self, id: &str) -> Result<(), HighlightError>;
    fn list_highlights(&self, article_id: &str) -> Result<Vec<Highlight>, HighlightError>;
}

pub struct HighlightManager<'a> {
    conn: &'a Connection,
}

impl<'a> HighlightManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn row_to_highlight(row: &rusqlite::Row) -> rusqlite::Result<Highlight> {
        let color: String = row.get(3)?;
        Ok(Highlight {
            id: row.get(0)?,
            article_id: row.get(1)?,
            text: row.get(2)?,
            color: HighlightColor::parse(&color).unwrap_or_default(),
            note: row.get(4)?,
            percentage: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl<'a> HighlightManagerTrait for HighlightManager<'a> {
    fn add_highlight(
        &mut self,
        article_id: &str,
        text: &str,
        color: HighlightColor,
        note: Option<&str>,
        percentage: f64,
    ) -> Result<String, HighlightError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(HighlightError::EmptyText);
        }

        let exists: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM articles WHERE id = ?1",
                params![article_id],
                |row| row.get(0),
            )
            .map_err(|e| HighlightError::DatabaseError(e.to_string()))?;
        if exists == 0 {
            return Err(HighlightError::ArticleNotFound(article_id.to_string()));
        }

        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO highlights (id, article_id, text, color, note, percentage, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    article_id,
                    text,
                    color.as_str(),
                    note,
                    percentage.clamp(0.0, 100.0),
                    Self::now()
                ],
            )
            .map_err(|e| HighlightError::DatabaseError(e.to_string()))?;

        info!(id = %id, article_id, "highlight added");
        Ok(id)
    }

    fn update_note(&mut self, id: &str, note: Option<&str>) -> Result<(), HighlightError> {
        let affected = self
            .conn
            .execute(
                "UPDATE highlights SET note = ?1 WHERE id = ?2",
                params![note, id],
            )
            .map_err(|e| HighlightError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(HighlightError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete_highlight(&mut self, id: &str) -> Result<(), HighlightError> {
        let affected = self
            .conn
            .execute("DELETE FROM highlights WHERE id = ?1", params![id])
            .map_err(|e| HighlightError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(HighlightError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_highlights(&self, article_id: &str) -> Result<Vec<Highlight>, HighlightError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, article_id, text, color, note, percentage, created_at \
                 FROM highlights WHERE article_id = ?1 ORDER BY percentage, created_at",
            )
            .map_err(|e| HighlightError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(params![article_id], Self::row_to_highlight)
            .map_err(|e| HighlightError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| HighlightError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }
}
