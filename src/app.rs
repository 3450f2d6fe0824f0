//! App Core for ReadLater.
//!
//! Central struct holding storage, services and the reader session, and the
//! place where the core pieces are wired together: extraction feeds the
//! article store, the renderer feeds the reader, scroll events feed the
//! progress tracker, and recognized gestures feed the UI state machine.
//!
//! Managers borrow the connection with a lifetime, so they are created on
//! demand from `db.connection()` like everywhere else in the crate.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::database::{ContentStore, Database, FsContentStore};
use crate::managers::article_manager::{ArticleManager, ArticleManagerTrait};
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait, BookmarkToggle};
use crate::managers::highlight_manager::{HighlightManager, HighlightManagerTrait};
use crate::managers::progress_manager::{ProgressManager, ProgressManagerTrait};
use crate::services::extraction_client::{validate_url, Extractor, HttpExtractor};
use crate::services::gesture_recognizer::{GestureCallbacks, GestureRecognizer};
use crate::services::immersive_ui::UiStore;
use crate::services::markdown_renderer::MarkdownRenderer;
use crate::services::progress_tracker::{ProgressTracker, TrackerConfig};
use crate::services::reader_view::{ReaderView, ReaderViewTrait};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::article::Article;
use crate::types::bookmark::Bookmark;
use crate::types::document::RenderedDocument;
use crate::types::errors::{AppError, ArticleError};
use crate::types::gesture::{ElementInfo, GestureEvent, TouchPoint};
use crate::types::highlight::{Highlight, HighlightColor};
use crate::types::progress::{ProgressSave, ProgressUpdate, ScrollMetrics};
use crate::types::ui::{Panel, UiEvent};

pub const DATABASE_FILE: &str = "readlater.db";
pub const CONTENT_DIR: &str = "content";

/// Everything the view needs to show an article that was just opened.
#[derive(Debug, Clone, Serialize)]
pub struct OpenedArticle {
    pub article: Article,
    pub document: RenderedDocument,
    /// Saved position, applied once layout is measurable.
    pub restore_percentage: Option<u8>,
    pub bookmarks: Vec<Bookmark>,
    pub highlights: Vec<Highlight>,
}

/// Central application struct.
pub struct App {
    pub db: Arc<Database>,
    pub content: Box<dyn ContentStore>,
    pub settings_engine: SettingsEngine,
    pub renderer: MarkdownRenderer,
    pub reader_view: ReaderView,
    pub gestures: GestureRecognizer,
    pub ui: UiStore,
    extractor: Box<dyn Extractor>,
    tracker: Option<ProgressTracker>,
    /// Caller timestamp and local instant of the last touch start, to turn
    /// the recognizer's long-press deadline into a wall-clock deadline.
    gesture_clock: Option<(u64, Instant)>,
}

impl App {
    /// Opens (or creates) the library under `data_dir` and loads settings.
    ///
    /// A settings file that can't be read leaves the defaults in place.
    pub fn new(data_dir: &Path, settings_path: Option<String>) -> Result<Self, AppError> {
        fs::create_dir_all(data_dir).map_err(|e| {
            ArticleError::ContentStoreError(format!("Failed to create data directory: {}", e))
        })?;

        let db = Arc::new(Database::open(data_dir.join(DATABASE_FILE))?);
        let content = FsContentStore::new(data_dir.join(CONTENT_DIR))
            .map_err(|e| ArticleError::ContentStoreError(e.to_string()))?;

        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(e) = settings_engine.load() {
            warn!(error = %e, path = settings_engine.get_config_path(), "using default settings");
        }

        let extractor = HttpExtractor::from_settings(&settings_engine.get_settings().extraction)?;
        info!(data_dir = %data_dir.display(), endpoint = extractor.endpoint(), "library opened");

        Ok(Self::with_parts(
            db,
            Box::new(content),
            settings_engine,
            Box::new(extractor),
        ))
    }

    /// Assembles an app from already constructed parts.
    pub fn with_parts(
        db: Arc<Database>,
        content: Box<dyn ContentStore>,
        settings_engine: SettingsEngine,
        extractor: Box<dyn Extractor>,
    ) -> Self {
        let settings = settings_engine.get_settings().clone();
        Self {
            db,
            content,
            renderer: MarkdownRenderer::new(settings.renderer.escape_policy),
            reader_view: ReaderView::new(settings.reader),
            gestures: GestureRecognizer::new(settings.gestures),
            ui: UiStore::new(),
            settings_engine,
            extractor,
            tracker: None,
            gesture_clock: None,
        }
    }

    fn fail<T>(&mut self, err: AppError) -> Result<T, AppError> {
        self.ui.dispatch(UiEvent::Failed(err.user_message()));
        Err(err)
    }

    fn articles(&self) -> ArticleManager<'_> {
        ArticleManager::new(self.db.connection(), self.content.as_ref())
    }

    // ─── Library ───

    /// Extracts `url` and stores the result. Nothing is stored on failure.
    pub async fn add_article(&mut self, url: &str) -> Result<Article, AppError> {
        if let Err(e) = validate_url(url) {
            return self.fail(e.into());
        }
        let url = url.trim();

        self.ui.dispatch(UiEvent::LoadingStarted);
        let result = self.extractor.extract(url).await;
        let extracted = match result {
            Ok(extracted) => extracted,
            Err(e) => return self.fail(e.into()),
        };

        let (meta, content) = extracted.into_parts(url);
        let stored = self
            .articles()
            .create_article(&meta, &content)
            .and_then(|id| self.articles().get_metadata(&id));
        match stored {
            Ok(article) => {
                self.ui.dispatch(UiEvent::LoadingFinished);
                Ok(article)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    pub fn list_articles(&self) -> Result<Vec<Article>, AppError> {
        Ok(self.articles().list_articles()?)
    }

    /// Deletes an article and everything it owns. If it is open in the
    /// reader, the pending save is dropped and the view returns to the library.
    pub fn delete_article(&mut self, id: &str) -> Result<Article, AppError> {
        if self.current_article_id() == Some(id) {
            if let Some(mut tracker) = self.tracker.take() {
                tracker.teardown();
            }
            self.gestures.touch_cancel();
            self.ui.dispatch(UiEvent::ShowLibrary);
        }
        Ok(self.articles().delete_article(id)?)
    }

    // ─── Reader session ───

    pub fn current_article_id(&self) -> Option<&str> {
        self.tracker.as_ref().map(|t| t.article_id())
    }

    pub fn tracker(&self) -> Option<&ProgressTracker> {
        self.tracker.as_ref()
    }

    fn tracker_mut(&mut self) -> Result<&mut ProgressTracker, AppError> {
        self.tracker.as_mut().ok_or(AppError::NoArticleOpen)
    }

    /// Writes any pending save of the open article and ends its session.
    fn release_tracker(&mut self) -> Result<Option<ProgressSave>, AppError> {
        let Some(mut tracker) = self.tracker.take() else {
            return Ok(None);
        };
        let save = tracker.flush();
        tracker.teardown();
        if let Some(save) = &save {
            ProgressManager::new(self.db.connection()).apply_save(save)?;
        }
        Ok(save)
    }

    /// Loads, renders and starts tracking an article.
    pub fn open_article(&mut self, id: &str) -> Result<OpenedArticle, AppError> {
        self.release_tracker()?;
        self.gestures.touch_cancel();

        let result = self.articles().get_article(id);
        let stored = match result {
            Ok(stored) => stored,
            Err(e) => return self.fail(e.into()),
        };

        let reading = self.settings_engine.get_settings().reading.clone();
        let document = self
            .renderer
            .render_document(&stored.content, reading.words_per_minute);

        let conn = self.db.connection();
        let saved = ProgressManager::new(conn).get_progress(id)?;
        let bookmarks = BookmarkManager::new(conn).list_bookmarks(id)?;
        let highlights = HighlightManager::new(conn).list_highlights(id)?;

        let tracker = ProgressTracker::new(id, TrackerConfig::from(&reading))
            .with_saved(saved.as_ref(), stored.article.is_read);
        let restore_percentage = tracker.pending_restore();
        self.tracker = Some(tracker);

        self.ui.dispatch(UiEvent::OpenArticle(id.to_string()));
        debug!(id, headings = document.headings.len(), minutes = document.reading_minutes, "article opened");

        Ok(OpenedArticle {
            article: stored.article,
            document,
            restore_percentage,
            bookmarks,
            highlights,
        })
    }

    /// Standalone reader page for an opened article.
    pub fn reader_page(&self, opened: &OpenedArticle) -> String {
        self.reader_view
            .format_for_display(&opened.article, &opened.document)
    }

    /// Leaves the reader, writing the latest position right away.
    pub fn close_reader(&mut self) -> Result<Option<ProgressSave>, AppError> {
        let saved = self.release_tracker();
        self.gestures.touch_cancel();
        self.gesture_clock = None;
        self.ui.dispatch(UiEvent::ShowLibrary);
        saved
    }

    pub fn on_scroll(&mut self, metrics: &ScrollMetrics, now: Instant) -> Result<ProgressUpdate, AppError> {
        Ok(self.tracker_mut()?.on_scroll(metrics, now))
    }

    /// Layout changed. Returns the offset to scroll to if a saved position
    /// was waiting for measurable content.
    pub fn on_layout(&mut self, metrics: &ScrollMetrics) -> Result<Option<f64>, AppError> {
        Ok(self.tracker_mut()?.try_restore(metrics))
    }

    /// Offset for jumping to `percentage` of the open article.
    pub fn navigate(&mut self, percentage: f64, metrics: &ScrollMetrics) -> Result<f64, AppError> {
        Ok(self.tracker_mut()?.offset_for(percentage, metrics))
    }

    /// Persists the debounced save if its quiet period is over.
    pub fn flush_due_progress(&mut self, now: Instant) -> Result<Option<ProgressSave>, AppError> {
        let Some(save) = self.tracker.as_mut().and_then(|t| t.take_due_save(now)) else {
            return Ok(None);
        };
        ProgressManager::new(self.db.connection()).apply_save(&save)?;
        Ok(Some(save))
    }

    /// Earliest pending timer: the progress save or the long press.
    pub fn next_deadline(&self) -> Option<Instant> {
        let save = self.tracker.as_ref().and_then(|t| t.next_deadline());
        match (save, self.long_press_instant()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Runs every timer that is due at `now`.
    pub fn run_timers(&mut self, now: Instant) -> Result<(Option<ProgressSave>, Option<GestureEvent>), AppError> {
        let gesture = self.fire_gesture_timer(now);
        let save = self.flush_due_progress(now)?;
        Ok((save, gesture))
    }

    // ─── Gestures ───

    fn long_press_instant(&self) -> Option<Instant> {
        let deadline = self.gestures.long_press_deadline()?;
        let (t0, started) = self.gesture_clock?;
        Some(started + Duration::from_millis(deadline.saturating_sub(t0)))
    }

    fn route_gesture(&mut self, event: Option<GestureEvent>) -> Option<GestureEvent> {
        if let Some(GestureEvent::Gesture(gesture)) = event {
            self.ui.dispatch(UiEvent::Gesture(gesture));
        }
        event
    }

    pub fn set_gesture_callbacks(&mut self, callbacks: GestureCallbacks) {
        self.gestures.set_callbacks(callbacks);
    }

    pub fn touch_start(&mut self, point: TouchPoint, path: &[ElementInfo], now: Instant) {
        self.gesture_clock = Some((point.t, now));
        self.gestures.touch_start(point, path);
    }

    pub fn touch_move(&mut self, point: TouchPoint) -> Option<GestureEvent> {
        let event = self.gestures.touch_move(point);
        self.route_gesture(event)
    }

    pub fn touch_end(&mut self, point: TouchPoint) -> Option<GestureEvent> {
        let event = self.gestures.touch_end(point);
        self.route_gesture(event)
    }

    pub fn click(&mut self, path: &[ElementInfo]) -> Option<GestureEvent> {
        let event = self.gestures.click(path);
        self.route_gesture(event)
    }

    /// Fires the long-press timer if it is due at `now`.
    pub fn fire_gesture_timer(&mut self, now: Instant) -> Option<GestureEvent> {
        let (t0, started) = self.gesture_clock?;
        let elapsed = now.saturating_duration_since(started).as_millis() as u64;
        let event = self.gestures.poll(t0.saturating_add(elapsed));
        self.route_gesture(event)
    }

    // ─── Panels ───

    pub fn open_panel(&mut self, panel: Panel) -> bool {
        self.ui.dispatch(UiEvent::OpenPanel(panel))
    }

    pub fn close_panel(&mut self) -> bool {
        self.ui.dispatch(UiEvent::ClosePanel)
    }

    // ─── Annotations at the current position ───

    /// Adds a bookmark at the current position, or removes the one already there.
    pub fn toggle_bookmark_here(&mut self, label: &str) -> Result<BookmarkToggle, AppError> {
        let tracker = self.tracker.as_ref().ok_or(AppError::NoArticleOpen)?;
        let toggle = BookmarkManager::new(self.db.connection()).toggle_bookmark(
            tracker.article_id(),
            tracker.percentage() as f64,
            label,
        )?;
        Ok(toggle)
    }

    /// Keeps the current text selection as a highlight at the current position.
    pub fn highlight_selection(
        &mut self,
        text: &str,
        color: HighlightColor,
        note: Option<&str>,
    ) -> Result<String, AppError> {
        let tracker = self.tracker.as_ref().ok_or(AppError::NoArticleOpen)?;
        let id = HighlightManager::new(self.db.connection()).add_highlight(
            tracker.article_id(),
            text,
            color,
            note,
            tracker.percentage() as f64,
        )?;
        Ok(id)
    }

    // ─── Settings ───

    /// Changes one setting and applies it to the live components.
    ///
    /// Reading thresholds take effect on the next opened article; the
    /// extraction endpoint on the next start.
    pub fn update_setting(&mut self, key: &str, value: serde_json::Value) -> Result<(), AppError> {
        self.settings_engine.set_value(key, value)?;
        self.apply_settings();
        Ok(())
    }

    pub fn reset_settings(&mut self) -> Result<(), AppError> {
        self.settings_engine.reset()?;
        self.apply_settings();
        Ok(())
    }

    fn apply_settings(&mut self) {
        let settings = self.settings_engine.get_settings().clone();
        self.renderer = MarkdownRenderer::new(settings.renderer.escape_policy);
        self.reader_view.update_settings(settings.reader);
        self.gestures.set_config(settings.gestures);
    }

    /// Writes pending progress and tears down timers before exit.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.release_tracker() {
            warn!(error = %e, "failed to save reading progress on shutdown");
        }
        self.gestures.teardown();
        self.gesture_clock = None;
        info!("shutdown complete");
    }
}
