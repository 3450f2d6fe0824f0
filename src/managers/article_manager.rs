//! Article Manager.
//!
//! Implements `ArticleManagerTrait`: the article side of the storage
//! collaborator. Metadata lives in SQLite, bodies in a [`ContentStore`].
//! Deleting an article cascades to its progress record, bookmarks and
//! highlights through foreign keys, then removes the content blob.

use rusqlite::{params, Connection, OptionalExtension};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::ContentStore;
use crate::services::markdown_renderer::count_words;
use crate::types::article::{Article, NewArticle, StoredArticle};
use crate::types::errors::ArticleError;

const ARTICLE_COLUMNS: &str = "id, url, title, author, site_name, excerpt, published_time, \
     word_count, added_at, last_read_at, is_read, progress";

/// Trait defining article storage operations.
pub trait ArticleManagerTrait {
    fn create_article(&mut self, meta: &NewArticle, content: &str) -> Result<String, ArticleError>;
    /// Loads metadata and content, stamping the last-read time.
    fn get_article(&mut self, id: &str) -> Result<StoredArticle, ArticleError>;
    /// Metadata only, without side effects.
    fn get_metadata(&self, id: &str) -> Result<Article, ArticleError>;
    /// Deletes the article and everything it owns. Returns the deleted metadata.
    fn delete_article(&mut self, id: &str) -> Result<Article, ArticleError>;
    /// Most recently added first.
    fn list_articles(&self) -> Result<Vec<Article>, ArticleError>;
    /// Sets the read flag. There is no operation that clears it.
    fn mark_read(&mut self, id: &str) -> Result<(), ArticleError>;
}

/// Article manager backed by a SQLite connection and a content store.
pub struct ArticleManager<'a> {
    conn: &'a Connection,
    content: &'a dyn ContentStore,
}

impl<'a> ArticleManager<'a> {
    pub fn new(conn: &'a Connection, content: &'a dyn ContentStore) -> Self {
        Self { conn, content }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn row_to_article(row: &rusqlite::Row) -> rusqlite::Result<Article> {
        Ok(Article {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            author: row.get(3)?,
            site_name: row.get(4)?,
            excerpt: row.get(5)?,
            published_time: row.get(6)?,
            word_count: row.get(7)?,
            added_at: row.get(8)?,
            last_read_at: row.get(9)?,
            is_read: row.get(10)?,
            progress: row.get(11)?,
        })
    }

    fn find(&self, id: &str) -> Result<Option<Article>, ArticleError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM articles WHERE id = ?1", ARTICLE_COLUMNS),
                params![id],
                Self::row_to_article,
            )
            .optional()
            .map_err(|e| ArticleError::DatabaseError(e.to_string()))
    }
}

impl<'a> ArticleManagerTrait for ArticleManager<'a> {
    /// Stores the content blob, then the metadata row. Returns the new article ID.
    fn create_article(&mut self, meta: &NewArticle, content: &str) -> Result<String, ArticleError> {
        let id = Uuid::new_v4().to_string();
        let now = Self::now();
        let word_count = count_words(content) as i64;

        self.content
            .put(&id, content)
            .map_err(|e| ArticleError::ContentStoreError(e.to_string()))?;

        let inserted = self.conn.execute(
            "INSERT INTO articles (id, url, title, author, site_name, excerpt, published_time, \
             word_count, added_at, last_read_at, is_read, progress) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, 0, 0)",
            params![
                id,
                meta.url,
                meta.title,
                meta.author,
                meta.site_name,
                meta.excerpt,
                meta.published_time,
                word_count,
                now
            ],
        );

        if let Err(e) = inserted {
            // Don't leave an orphan blob behind a failed insert.
            if let Err(cleanup) = self.content.delete(&id) {
                warn!(id = %id, error = %cleanup, "failed to remove orphaned content blob");
            }
            return Err(ArticleError::DatabaseError(e.to_string()));
        }

        info!(id = %id, url = %meta.url, word_count, "article saved");
        Ok(id)
    }

    fn get_article(&mut self, id: &str) -> Result<StoredArticle, ArticleError> {
        let mut article = self
            .find(id)?
            .ok_or_else(|| ArticleError::NotFound(id.to_string()))?;

        let content = self
            .content
            .get(id)
            .map_err(|e| ArticleError::ContentStoreError(e.to_string()))?
            .ok_or_else(|| {
                warn!(id, "article metadata has no content blob");
                ArticleError::MissingContent(id.to_string())
            })?;

        let now = Self::now();
        self.conn
            .execute(
                "UPDATE articles SET last_read_at = ?1 WHERE id = ?2",
                params![now, id],
            )
            .map_err(|e| ArticleError::DatabaseError(e.to_string()))?;
        article.last_read_at = Some(now);

        Ok(StoredArticle { article, content })
    }

    fn get_metadata(&self, id: &str) -> Result<Article, ArticleError> {
        self.find(id)?
            .ok_or_else(|| ArticleError::NotFound(id.to_string()))
    }

    fn delete_article(&mut self, id: &str) -> Result<Article, ArticleError> {
        let article = self.get_metadata(id)?;

        self.conn
            .execute("DELETE FROM articles WHERE id = ?1", params![id])
            .map_err(|e| ArticleError::DatabaseError(e.to_string()))?;

        self.content
            .delete(id)
            .map_err(|e| ArticleError::ContentStoreError(e.to_string()))?;

        info!(id, title = %article.title, "article deleted");
        Ok(article)
    }

    fn list_articles(&self) -> Result<Vec<Article>, ArticleError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM articles ORDER BY added_at DESC, rowid DESC",
                ARTICLE_COLUMNS
            ))
            .map_err(|e| ArticleError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_article)
            .map_err(|e| ArticleError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| ArticleError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    fn mark_read(&mut self, id: &str) -> Result<(), ArticleError> {
        let affected = self
            .conn
            .execute("UPDATE articles SET is_read = 1 WHERE id = ?1", params![id])
            .map_err(|e| ArticleError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(ArticleError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
