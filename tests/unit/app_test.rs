//! Tests of the wired-up `App`: library, reader session, progress
//! persistence, gestures and settings, with a stub extractor in place of
//! the HTTP client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use readlater::app::App;
use readlater::database::{ContentStore, Database, FsContentStore};
use readlater::managers::article_manager::{ArticleManager, ArticleManagerTrait};
use readlater::managers::bookmark_manager::BookmarkToggle;
use readlater::managers::progress_manager::{ProgressManager, ProgressManagerTrait};
use readlater::services::extraction_client::Extractor;
use readlater::services::settings_engine::SettingsEngine;
use readlater::types::article::ExtractedArticle;
use readlater::types::document::EscapePolicy;
use readlater::types::errors::{AppError, ExtractionError};
use readlater::types::gesture::{ElementInfo, Gesture, GestureEvent, TouchPoint};
use readlater::types::highlight::HighlightColor;
use readlater::types::progress::ScrollMetrics;
use readlater::types::ui::{Panel, View};

const CONTENT: &str = "# Hello\n\nSome words to read.\n\n## Part two\n\nMore words.";

#[derive(Clone, Copy)]
enum Reply {
    Article,
    NoContent,
}

struct StubExtractor {
    reply: Reply,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract(&self, _url: &str) -> Result<ExtractedArticle, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Article => Ok(ExtractedArticle {
                title: "Hello".to_string(),
                author: Some("Ada".to_string()),
                site_name: None,
                excerpt: None,
                content: CONTENT.to_string(),
                published_time: None,
            }),
            Reply::NoContent => Err(ExtractionError::NoContent),
        }
    }
}

struct Fixture {
    app: App,
    calls: Arc<AtomicUsize>,
    _tmp: TempDir,
}

fn setup_with(reply: Reply) -> Fixture {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let db = Arc::new(Database::open_in_memory().unwrap());
    let content = FsContentStore::new(tmp.path().join("content")).unwrap();
    let settings = SettingsEngine::new(Some(
        tmp.path().join("settings.json").to_string_lossy().to_string(),
    ));
    let calls = Arc::new(AtomicUsize::new(0));
    let extractor = StubExtractor {
        reply,
        calls: Arc::clone(&calls),
    };
    let app = App::with_parts(db, Box::new(content), settings, Box::new(extractor));
    Fixture { app, calls, _tmp: tmp }
}

fn setup() -> Fixture {
    setup_with(Reply::Article)
}

/// 1000 px of scrollable content.
fn at(offset: f64) -> ScrollMetrics {
    ScrollMetrics::new(offset, 2000.0, 1000.0)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test]
async fn test_add_then_open_renders_article() {
    let mut fx = setup();
    let article = fx.app.add_article("  https://example.com/post ").await.unwrap();
    assert_eq!(article.title, "Hello");
    assert_eq!(article.url, "https://example.com/post");
    assert!(!fx.app.ui.state().loading);
    assert_eq!(fx.app.list_articles().unwrap().len(), 1);

    let opened = fx.app.open_article(&article.id).unwrap();
    assert!(opened.document.html.starts_with("<h1 id=\"hello\">Hello</h1>"));
    let slugs: Vec<&str> = opened.document.headings.iter().map(|h| h.slug.as_str()).collect();
    assert_eq!(slugs, vec!["hello", "part-two"]);
    assert_eq!(opened.document.reading_minutes, 1);
    assert_eq!(opened.restore_percentage, None);

    let state = fx.app.ui.state();
    assert_eq!(state.view, View::Reader);
    assert_eq!(state.current_article_id.as_deref(), Some(article.id.as_str()));
    assert_eq!(fx.app.current_article_id(), Some(article.id.as_str()));

    let page = fx.app.reader_page(&opened);
    assert!(page.contains("<nav class=\"toc\">"));
}

#[tokio::test]
async fn test_failed_extraction_stores_nothing() {
    let mut fx = setup_with(Reply::NoContent);
    let result = fx.app.add_article("https://example.com/empty").await;
    assert!(matches!(result, Err(AppError::Extraction(ExtractionError::NoContent))));

    let state = fx.app.ui.state();
    assert!(!state.loading);
    assert_eq!(
        state.error.as_deref(),
        Some(ExtractionError::NoContent.user_message())
    );
    assert!(fx.app.list_articles().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_url_never_calls_extractor() {
    let mut fx = setup();
    let result = fx.app.add_article("not a url").await;
    assert!(matches!(result, Err(AppError::Extraction(ExtractionError::InvalidUrl(_)))));
    assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
    assert!(fx.app.ui.state().error.is_some());
}

/// Scrolling is saved once after the quiet period, and the saved position is
/// restored on reopen once layout is measurable.
#[tokio::test]
async fn test_progress_saved_after_quiet_period_and_restored() {
    let mut fx = setup();
    let id = fx.app.add_article("https://example.com/post").await.unwrap().id;
    fx.app.open_article(&id).unwrap();

    let t0 = Instant::now();
    assert_eq!(fx.app.on_scroll(&at(300.0), t0).unwrap().percentage, 30);
    assert_eq!(fx.app.on_scroll(&at(500.0), t0 + ms(200)).unwrap().percentage, 50);
    assert_eq!(fx.app.next_deadline(), Some(t0 + ms(700)));

    assert!(fx.app.flush_due_progress(t0 + ms(600)).unwrap().is_none());
    let save = fx.app.flush_due_progress(t0 + ms(700)).unwrap().unwrap();
    assert_eq!(save.percentage, 50);
    assert!(fx.app.flush_due_progress(t0 + ms(2000)).unwrap().is_none());

    let stored = ProgressManager::new(fx.app.db.connection())
        .get_progress(&id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.percentage, 50);
    assert_eq!(stored.offset, 500.0);

    fx.app.close_reader().unwrap();
    let reopened = fx.app.open_article(&id).unwrap();
    assert_eq!(reopened.restore_percentage, Some(50));

    // Layout not measured yet: the restore waits.
    assert_eq!(fx.app.on_layout(&ScrollMetrics::new(0.0, 0.0, 1000.0)).unwrap(), None);
    let offset = fx.app.on_layout(&ScrollMetrics::new(0.0, 3000.0, 1000.0)).unwrap().unwrap();
    assert!((offset - 1000.0).abs() < 20.0);
    assert_eq!(fx.app.on_layout(&ScrollMetrics::new(0.0, 3000.0, 1000.0)).unwrap(), None);
}

#[tokio::test]
async fn test_close_flushes_pending_save_and_marks_read() {
    let mut fx = setup();
    let id = fx.app.add_article("https://example.com/post").await.unwrap().id;
    fx.app.open_article(&id).unwrap();

    let update = fx.app.on_scroll(&at(950.0), Instant::now()).unwrap();
    assert!(update.became_read);

    let save = fx.app.close_reader().unwrap().unwrap();
    assert!(save.mark_read);
    assert_eq!(fx.app.ui.state().view, View::Library);
    assert!(fx.app.tracker().is_none());

    let article = ArticleManager::new(fx.app.db.connection(), fx.app.content.as_ref())
        .get_metadata(&id)
        .unwrap();
    assert!(article.is_read);
    assert_eq!(article.progress, 95);
}

#[tokio::test]
async fn test_delete_open_article_drops_session() {
    let mut fx = setup();
    let id = fx.app.add_article("https://example.com/post").await.unwrap().id;
    fx.app.open_article(&id).unwrap();
    let t0 = Instant::now();
    fx.app.on_scroll(&at(400.0), t0).unwrap();

    let deleted = fx.app.delete_article(&id).unwrap();
    assert_eq!(deleted.title, "Hello");
    assert!(fx.app.tracker().is_none());
    assert_eq!(fx.app.ui.state().view, View::Library);
    assert!(fx.app.flush_due_progress(t0 + ms(1000)).unwrap().is_none());
    assert!(fx.app.list_articles().unwrap().is_empty());
    assert_eq!(fx.app.content.get(&id).unwrap(), None);
}

#[tokio::test]
async fn test_gestures_drive_immersive_ui() {
    let mut fx = setup();
    let id = fx.app.add_article("https://example.com/post").await.unwrap().id;
    fx.app.open_article(&id).unwrap();
    let now = Instant::now();

    fx.app.touch_start(TouchPoint::new(100.0, 100.0, 0), &[], now);
    let event = fx.app.touch_end(TouchPoint::new(102.0, 101.0, 120));
    assert_eq!(event, Some(GestureEvent::Gesture(Gesture::Tap)));
    assert!(fx.app.ui.state().chrome_hidden);

    // A click on a link is left to the link.
    assert_eq!(fx.app.click(&[ElementInfo::new("A")]), None);
    assert!(fx.app.ui.state().chrome_hidden);

    assert!(fx.app.open_panel(Panel::Toc));
    assert!(!fx.app.ui.state().chrome_hidden);

    fx.app.touch_start(TouchPoint::new(100.0, 300.0, 1000), &[], now);
    let event = fx.app.touch_end(TouchPoint::new(100.0, 200.0, 1100));
    assert_eq!(event, Some(GestureEvent::Gesture(Gesture::SwipeUp)));
    let state = fx.app.ui.state();
    assert!(state.chrome_hidden);
    assert_eq!(state.panel, None);
}

#[tokio::test]
async fn test_long_press_timer_then_highlight() {
    let mut fx = setup();
    let id = fx.app.add_article("https://example.com/post").await.unwrap().id;
    fx.app.open_article(&id).unwrap();
    let t0 = Instant::now();
    fx.app.on_scroll(&at(200.0), t0).unwrap();

    fx.app.touch_start(TouchPoint::new(50.0, 50.0, 10_000), &[], t0);
    assert_eq!(fx.app.next_deadline(), Some(t0 + ms(400)));

    let (save, gesture) = fx.app.run_timers(t0 + ms(450)).unwrap();
    assert_eq!(gesture, Some(GestureEvent::SelectionStart));
    assert!(save.is_none());
    assert_eq!(
        fx.app.touch_end(TouchPoint::new(50.0, 50.0, 10_600)),
        Some(GestureEvent::SelectionEnd)
    );

    fx.app
        .highlight_selection("Some words", HighlightColor::Blue, Some("why"))
        .unwrap();
    let (save, _) = fx.app.run_timers(t0 + ms(500)).unwrap();
    assert_eq!(save.map(|s| s.percentage), Some(20));

    fx.app.close_reader().unwrap();
    let reopened = fx.app.open_article(&id).unwrap();
    assert_eq!(reopened.highlights.len(), 1);
    assert_eq!(reopened.highlights[0].percentage, 20.0);
}

#[tokio::test]
async fn test_bookmark_toggle_at_current_position() {
    let mut fx = setup();
    assert!(matches!(
        fx.app.toggle_bookmark_here(""),
        Err(AppError::NoArticleOpen)
    ));

    let id = fx.app.add_article("https://example.com/post").await.unwrap().id;
    fx.app.open_article(&id).unwrap();
    fx.app.on_scroll(&at(400.0), Instant::now()).unwrap();

    let added = fx.app.toggle_bookmark_here("").unwrap();
    assert!(matches!(added, BookmarkToggle::Added(_)));
    let reopened = fx.app.open_article(&id).unwrap();
    assert_eq!(reopened.bookmarks[0].label, "40%");

    fx.app.on_scroll(&at(410.0), Instant::now()).unwrap();
    assert!(matches!(
        fx.app.toggle_bookmark_here("").unwrap(),
        BookmarkToggle::Removed(_)
    ));
}

#[tokio::test]
async fn test_settings_apply_to_live_components() {
    let mut fx = setup();
    fx.app
        .update_setting("renderer.escape_policy", json!("escape_all"))
        .unwrap();
    assert!(fx.app.renderer.render("<a href=\"x\">y</a>").contains("&lt;a"));
    assert_eq!(fx.app.renderer.escape_policy(), EscapePolicy::EscapeAll);

    fx.app
        .update_setting("gestures.swipe_threshold_px", json!(200.0))
        .unwrap();
    assert_eq!(fx.app.gestures.config().swipe_threshold_px, 200.0);

    assert!(fx.app.update_setting("reader.nope", json!(1)).is_err());

    fx.app.reset_settings().unwrap();
    assert_eq!(fx.app.gestures.config().swipe_threshold_px, 50.0);
}

#[tokio::test]
async fn test_reader_operations_need_an_open_article() {
    let mut fx = setup();
    assert!(matches!(
        fx.app.on_scroll(&at(0.0), Instant::now()),
        Err(AppError::NoArticleOpen)
    ));
    assert!(matches!(
        fx.app.highlight_selection("x", HighlightColor::Yellow, None),
        Err(AppError::NoArticleOpen)
    ));
    assert_eq!(fx.app.close_reader().unwrap(), None);
}

#[tokio::test]
async fn test_shutdown_writes_pending_progress() {
    let mut fx = setup();
    let id = fx.app.add_article("https://example.com/post").await.unwrap().id;
    fx.app.open_article(&id).unwrap();
    fx.app.on_scroll(&at(600.0), Instant::now()).unwrap();

    fx.app.shutdown();
    let stored = ProgressManager::new(fx.app.db.connection())
        .get_progress(&id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.percentage, 60);
}
