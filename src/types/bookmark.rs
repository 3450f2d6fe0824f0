use serde::{Deserialize, Serialize};

/// Two bookmarks closer than this many percentage points mark the same position.
pub const BOOKMARK_TOLERANCE: f64 = 2.0;

/// A saved reading position inside an article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    pub id: String,
    pub article_id: String,
    /// Scroll percentage, 0–100.
    pub percentage: f64,
    pub label: String,
    pub created_at: i64,
}

impl Bookmark {
    /// Whether `percentage` falls within [`BOOKMARK_TOLERANCE`] of this bookmark.
    pub fn matches_position(&self, percentage: f64) -> bool {
        (self.percentage - percentage).abs() <= BOOKMARK_TOLERANCE
    }
}
