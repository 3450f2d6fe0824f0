use serde::{Deserialize, Serialize};

/// Persisted reading position of one article (one row per article, overwritten).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingProgress {
    pub article_id: String,
    /// Scroll offset in pixels.
    pub offset: f64,
    pub percentage: u8,
    pub updated_at: i64,
}

/// Geometry of the scrollable reading region at one instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ScrollMetrics {
    pub offset: f64,
    pub content_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    pub fn new(offset: f64, content_height: f64, viewport_height: f64) -> Self {
        Self {
            offset,
            content_height,
            viewport_height,
        }
    }

    /// Largest reachable scroll offset; zero or negative when everything fits on screen.
    pub fn max_scroll(&self) -> f64 {
        self.content_height - self.viewport_height
    }

    /// Layout is complete once the content has a measurable height.
    pub fn is_measurable(&self) -> bool {
        self.content_height > 0.0
    }
}

/// A save the progress tracker wants written through to storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressSave {
    pub article_id: String,
    pub offset: f64,
    pub percentage: u8,
    /// Set once the article crossed the read threshold.
    pub mark_read: bool,
}

/// Synchronous result of one scroll event, for the live indicator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percentage: u8,
    pub is_read: bool,
    /// True only on the event that crossed the read threshold.
    pub became_read: bool,
}
