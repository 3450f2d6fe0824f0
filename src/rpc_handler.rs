//! RPC method handler for the ReadLater JSON protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches one method call to the `App` and the
//! managers it owns.

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::app::App;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait, BookmarkToggle};
use crate::managers::highlight_manager::{HighlightManager, HighlightManagerTrait};
use crate::services::markdown_renderer::{extract_headings, estimate_minutes};
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::gesture::{ElementInfo, TouchPoint};
use crate::types::highlight::HighlightColor;
use crate::types::progress::ScrollMetrics;
use crate::types::ui::Panel;

/// Touch, click and reader events: every sample matters, so these never
/// count against the request budget.
pub fn is_input_method(method: &str) -> bool {
    method == "click" || method.starts_with("touch.") || method.starts_with("reader.")
}

/// Per-second budget for command requests. Input events pass unconditionally.
pub struct RateLimiter {
    window_start: Option<Instant>,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    pub fn new(max_per_second: u32) -> Self {
        Self { window_start: None, request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    pub fn check(&mut self, method: &str, now: Instant) -> bool {
        if is_input_method(method) {
            return true;
        }
        let expired = self
            .window_start
            .map_or(true, |start| now.saturating_duration_since(start) >= Duration::from_secs(1));
        if expired {
            self.window_start = Some(now);
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn f64_param(params: &Value, key: &str) -> Result<f64, String> {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| format!("missing {}", key))
}

/// Deserializes `params[key]`, or the whole params object when `key` is empty.
fn typed_param<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, String> {
    let raw = if key.is_empty() {
        params.clone()
    } else {
        params.get(key).cloned().ok_or_else(|| format!("missing {}", key))?
    };
    serde_json::from_value(raw).map_err(|e| format!("invalid {}: {}", if key.is_empty() { "params" } else { key }, e))
}

fn path_param(params: &Value) -> Result<Vec<ElementInfo>, String> {
    match params.get("path") {
        Some(_) => typed_param(params, "path"),
        None => Ok(Vec::new()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Dispatch a method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &mut App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Library ───
        "article.add" => {
            let url = str_param(params, "url")?;
            let article = app.add_article(url).await.map_err(|e| e.to_string())?;
            to_json(&article)
        }
        "article.list" => {
            let articles = app.list_articles().map_err(|e| e.to_string())?;
            to_json(&articles)
        }
        "article.open" => {
            let id = str_param(params, "id")?;
            let standalone = params.get("standalone").and_then(|v| v.as_bool()).unwrap_or(false);
            let opened = app.open_article(id).map_err(|e| e.to_string())?;
            let mut result = to_json(&opened)?;
            if standalone {
                result["page"] = Value::String(app.reader_page(&opened));
            }
            Ok(result)
        }
        "article.close" => {
            let saved = app.close_reader().map_err(|e| e.to_string())?;
            Ok(json!({"saved": saved}))
        }
        "article.delete" => {
            let id = str_param(params, "id")?;
            let article = app.delete_article(id).map_err(|e| e.to_string())?;
            Ok(json!({"id": article.id, "title": article.title}))
        }

        // ─── Reader ───
        "reader.scroll" => {
            let metrics: ScrollMetrics = typed_param(params, "")?;
            let update = app.on_scroll(&metrics, Instant::now()).map_err(|e| e.to_string())?;
            to_json(&update)
        }
        "reader.layout" => {
            let metrics: ScrollMetrics = typed_param(params, "")?;
            let offset = app.on_layout(&metrics).map_err(|e| e.to_string())?;
            Ok(json!({"restore_offset": offset}))
        }
        "reader.navigate" => {
            let percentage = f64_param(params, "percentage")?;
            let metrics: ScrollMetrics = typed_param(params, "metrics")?;
            let offset = app.navigate(percentage, &metrics).map_err(|e| e.to_string())?;
            Ok(json!({"percentage": percentage, "offset": offset}))
        }

        // ─── Gestures ───
        "touch.start" => {
            let point: TouchPoint = typed_param(params, "point")?;
            let path = path_param(params)?;
            app.touch_start(point, &path, Instant::now());
            Ok(json!({"ok": true}))
        }
        "touch.move" => {
            let point: TouchPoint = typed_param(params, "point")?;
            Ok(json!({"event": app.touch_move(point)}))
        }
        "touch.end" => {
            let point: TouchPoint = typed_param(params, "point")?;
            Ok(json!({"event": app.touch_end(point)}))
        }
        "touch.cancel" => {
            app.gestures.touch_cancel();
            Ok(json!({"ok": true}))
        }
        "click" => {
            let path = path_param(params)?;
            Ok(json!({"event": app.click(&path)}))
        }

        // ─── UI ───
        "ui.state" => to_json(app.ui.state()),
        "ui.open_panel" => {
            let panel: Panel = typed_param(params, "panel")?;
            app.open_panel(panel);
            to_json(app.ui.state())
        }
        "ui.close_panel" => {
            app.close_panel();
            to_json(app.ui.state())
        }
        "ui.dismiss_error" => {
            app.ui.dispatch(crate::types::ui::UiEvent::DismissError);
            to_json(app.ui.state())
        }

        // ─── Bookmarks ───
        "bookmark.add" => {
            let article_id = str_param(params, "article_id")?;
            let percentage = f64_param(params, "percentage")?;
            let label = params.get("label").and_then(|v| v.as_str()).unwrap_or("");
            let mut mgr = BookmarkManager::new(app.db.connection());
            let id = mgr.add_bookmark(article_id, percentage, label).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "bookmark.list" => {
            let article_id = str_param(params, "article_id")?;
            let mgr = BookmarkManager::new(app.db.connection());
            let bookmarks = mgr.list_bookmarks(article_id).map_err(|e| e.to_string())?;
            to_json(&bookmarks)
        }
        "bookmark.find" => {
            let article_id = str_param(params, "article_id")?;
            let percentage = f64_param(params, "percentage")?;
            let mgr = BookmarkManager::new(app.db.connection());
            let bookmark = mgr.find_bookmark(article_id, percentage).map_err(|e| e.to_string())?;
            to_json(&bookmark)
        }
        "bookmark.delete" => {
            let id = str_param(params, "id")?;
            let mut mgr = BookmarkManager::new(app.db.connection());
            mgr.delete_bookmark(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "bookmark.toggle" => {
            let label = params.get("label").and_then(|v| v.as_str()).unwrap_or("");
            let toggle = app.toggle_bookmark_here(label).map_err(|e| e.to_string())?;
            Ok(match toggle {
                BookmarkToggle::Added(id) => json!({"added": id}),
                BookmarkToggle::Removed(id) => json!({"removed": id}),
            })
        }

        // ─── Highlights ───
        "highlight.add" => {
            let text = str_param(params, "text")?;
            let color: HighlightColor = match params.get("color") {
                Some(_) => typed_param(params, "color")?,
                None => HighlightColor::default(),
            };
            let note = params.get("note").and_then(|v| v.as_str());
            let id = app.highlight_selection(text, color, note).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "highlight.list" => {
            let article_id = str_param(params, "article_id")?;
            let mgr = HighlightManager::new(app.db.connection());
            let highlights = mgr.list_highlights(article_id).map_err(|e| e.to_string())?;
            to_json(&highlights)
        }
        "highlight.note" => {
            let id = str_param(params, "id")?;
            let note = params.get("note").and_then(|v| v.as_str());
            let mut mgr = HighlightManager::new(app.db.connection());
            mgr.update_note(id, note).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "highlight.delete" => {
            let id = str_param(params, "id")?;
            let mut mgr = HighlightManager::new(app.db.connection());
            mgr.delete_highlight(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => match params.get("key").and_then(|v| v.as_str()) {
            Some(key) => app.settings_engine.get_value(key).map_err(|e| e.to_string()),
            None => to_json(app.settings_engine.get_settings()),
        },
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            app.update_setting(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "settings.reset" => {
            app.reset_settings().map_err(|e| e.to_string())?;
            to_json(app.settings_engine.get_settings())
        }

        // ─── Rendering ───
        "render" => {
            let markdown = str_param(params, "markdown")?;
            let wpm = app.settings_engine.get_settings().reading.words_per_minute;
            Ok(json!({
                "html": app.renderer.render(markdown),
                "headings": extract_headings(markdown),
                "reading_minutes": estimate_minutes(markdown, wpm),
            }))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
