use thiserror::Error;

// === ArticleError ===

/// Errors of the article store (metadata rows + content blobs).
#[derive(Debug, Error)]
pub enum ArticleError {
    /// No article with the given ID.
    #[error("Article not found: {0}")]
    NotFound(String),
    /// Metadata exists but its content blob is gone.
    #[error("Content missing for article: {0}")]
    MissingContent(String),
    /// Reading or writing a content blob failed.
    #[error("Content store error: {0}")]
    ContentStoreError(String),
    /// An underlying database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

// === BookmarkError ===

/// Errors related to bookmark operations.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("Bookmark not found: {0}")]
    NotFound(String),
    #[error("Article not found: {0}")]
    ArticleNotFound(String),
    #[error("Invalid bookmark percentage: {0}")]
    InvalidPercentage(f64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

// === HighlightError ===

/// Errors related to highlight operations.
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("Highlight not found: {0}")]
    NotFound(String),
    #[error("Article not found: {0}")]
    ArticleNotFound(String),
    #[error("Highlight text cannot be empty")]
    EmptyText,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

// === ProgressError ===

/// Errors related to reading-progress persistence.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Article not found: {0}")]
    ArticleNotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings IO error: {0}")]
    IoError(String),
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === ExtractionError ===

/// Failures of the remote extraction call. Nothing is persisted when one occurs.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    #[error("No readable content found")]
    NoContent,
    #[error("Unexpected extraction error: {0}")]
    Unexpected(String),
}

impl ExtractionError {
    /// Message shown to the reader; one per failure kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExtractionError::InvalidUrl(_) => {
                "That doesn't look like a valid web address. Check the URL and try again."
            }
            ExtractionError::FetchFailed(_) => {
                "Couldn't reach that page. Check your connection or try again later."
            }
            ExtractionError::NoContent => {
                "No readable article was found on that page."
            }
            ExtractionError::Unexpected(_) => {
                "Something went wrong while saving the article."
            }
        }
    }
}

// === AppError ===

/// Error type of the application shell, wrapping every domain error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Article(#[from] ArticleError),
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),
    #[error(transparent)]
    Highlight(#[from] HighlightError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("No article is open")]
    NoArticleOpen,
}

impl AppError {
    /// Message suitable for the view layer's error banner.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Extraction(e) => e.user_message().to_string(),
            AppError::Article(ArticleError::NotFound(_)) => {
                "That article is no longer in your library.".to_string()
            }
            other => format!("Something went wrong: {}", other),
        }
    }
}
