// ReadLater state managers
// Managers handle persisted library state: articles, reading progress, bookmarks, highlights.

pub mod article_manager;
pub mod bookmark_manager;
pub mod highlight_manager;
pub mod progress_manager;
