//! Unit tests for the ArticleManager and ProgressManager public APIs, using an
//! in-memory SQLite database and a temporary content directory.

use tempfile::TempDir;

use readlater::database::{ContentStore, Database, FsContentStore};
use readlater::managers::article_manager::{ArticleManager, ArticleManagerTrait};
use readlater::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use readlater::managers::progress_manager::{ProgressManager, ProgressManagerTrait};
use readlater::types::article::NewArticle;
use readlater::types::errors::{ArticleError, ProgressError};
use readlater::types::progress::ProgressSave;

fn setup() -> (Database, FsContentStore, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let store = FsContentStore::new(tmp.path().join("content")).unwrap();
    (db, store, tmp)
}

fn meta(title: &str) -> NewArticle {
    NewArticle {
        url: format!("https://example.com/{}", title.to_lowercase()),
        title: title.to_string(),
        author: Some("Ada".into()),
        ..NewArticle::default()
    }
}

#[test]
fn test_create_and_get_article() {
    let (db, store, _tmp) = setup();
    let mut mgr = ArticleManager::new(db.connection(), &store);

    let id = mgr.create_article(&meta("First"), "# First\n\none two three").unwrap();
    let stored = mgr.get_article(&id).unwrap();

    assert_eq!(stored.article.title, "First");
    assert_eq!(stored.article.author.as_deref(), Some("Ada"));
    assert_eq!(stored.content, "# First\n\none two three");
    assert_eq!(stored.article.word_count, 4);
    assert!(!stored.article.is_read);
    assert_eq!(stored.article.progress, 0);
    assert!(stored.article.last_read_at.is_some());
}

#[test]
fn test_get_metadata_has_no_side_effects() {
    let (db, store, _tmp) = setup();
    let mut mgr = ArticleManager::new(db.connection(), &store);
    let id = mgr.create_article(&meta("Quiet"), "body").unwrap();
    assert!(mgr.get_metadata(&id).unwrap().last_read_at.is_none());
}

#[test]
fn test_get_unknown_article_is_not_found() {
    let (db, store, _tmp) = setup();
    let mut mgr = ArticleManager::new(db.connection(), &store);
    assert!(matches!(mgr.get_article("nope"), Err(ArticleError::NotFound(_))));
}

#[test]
fn test_missing_blob_is_reported() {
    let (db, store, _tmp) = setup();
    let mut mgr = ArticleManager::new(db.connection(), &store);
    let id = mgr.create_article(&meta("Lost"), "body").unwrap();
    store.delete(&id).unwrap();
    assert!(matches!(mgr.get_article(&id), Err(ArticleError::MissingContent(_))));
}

#[test]
fn test_list_articles_newest_first() {
    let (db, store, _tmp) = setup();
    let mut mgr = ArticleManager::new(db.connection(), &store);
    let a = mgr.create_article(&meta("A"), "a").unwrap();
    let b = mgr.create_article(&meta("B"), "b").unwrap();

    let ids: Vec<String> = mgr.list_articles().unwrap().into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![b, a]);
}

#[test]
fn test_delete_removes_everything_and_returns_title() {
    let (db, store, _tmp) = setup();
    let mut mgr = ArticleManager::new(db.connection(), &store);
    let id = mgr.create_article(&meta("Doomed"), "body").unwrap();

    ProgressManager::new(db.connection()).save_progress(&id, 100.0, 20).unwrap();
    BookmarkManager::new(db.connection()).add_bookmark(&id, 20.0, "").unwrap();

    let deleted = mgr.delete_article(&id).unwrap();
    assert_eq!(deleted.title, "Doomed");

    assert!(matches!(mgr.get_metadata(&id), Err(ArticleError::NotFound(_))));
    assert_eq!(store.get(&id).unwrap(), None);
    assert_eq!(ProgressManager::new(db.connection()).get_progress(&id).unwrap(), None);
    assert!(BookmarkManager::new(db.connection()).list_bookmarks(&id).unwrap().is_empty());
}

#[test]
fn test_delete_unknown_article_is_not_found() {
    let (db, store, _tmp) = setup();
    let mut mgr = ArticleManager::new(db.connection(), &store);
    assert!(matches!(mgr.delete_article("nope"), Err(ArticleError::NotFound(_))));
}

#[test]
fn test_mark_read() {
    let (db, store, _tmp) = setup();
    let mut mgr = ArticleManager::new(db.connection(), &store);
    let id = mgr.create_article(&meta("Read me"), "body").unwrap();
    mgr.mark_read(&id).unwrap();
    assert!(mgr.get_metadata(&id).unwrap().is_read);
    assert!(mgr.mark_read("nope").is_err());
}

#[test]
fn test_progress_overwrites_single_record() {
    let (db, store, _tmp) = setup();
    let id = ArticleManager::new(db.connection(), &store)
        .create_article(&meta("P"), "body")
        .unwrap();
    let mut progress = ProgressManager::new(db.connection());

    progress.save_progress(&id, 100.0, 10).unwrap();
    progress.save_progress(&id, 480.0, 48).unwrap();

    let saved = progress.get_progress(&id).unwrap().unwrap();
    assert_eq!(saved.percentage, 48);
    assert_eq!(saved.offset, 480.0);

    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM reading_progress", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);

    let article = ArticleManager::new(db.connection(), &store).get_metadata(&id).unwrap();
    assert_eq!(article.progress, 48);
}

#[test]
fn test_apply_save_sets_read_flag() {
    let (db, store, _tmp) = setup();
    let id = ArticleManager::new(db.connection(), &store)
        .create_article(&meta("Done"), "body")
        .unwrap();

    ProgressManager::new(db.connection())
        .apply_save(&ProgressSave {
            article_id: id.clone(),
            offset: 950.0,
            percentage: 95,
            mark_read: true,
        })
        .unwrap();

    let article = ArticleManager::new(db.connection(), &store).get_metadata(&id).unwrap();
    assert!(article.is_read);
    assert_eq!(article.progress, 95);
}

#[test]
fn test_progress_for_unknown_article_fails() {
    let (db, _store, _tmp) = setup();
    let result = ProgressManager::new(db.connection()).save_progress("nope", 0.0, 10);
    assert!(matches!(result, Err(ProgressError::ArticleNotFound(_))));
}
