//! Reading progress model.
//!
//! Turns scroll geometry into a 0–100 percentage, keeps the live value for
//! the on-screen indicator, and decides when a position should be written
//! through to storage. Writes are debounced: every scroll restarts the quiet
//! period and at most one save comes out per period.
//!
//! The tracker never touches storage itself. The owner drains
//! [`ProgressTracker::take_due_save`] from its event loop and persists what
//! comes out.

use std::time::{Duration, Instant};

use tracing::debug;

use super::debouncer::Debouncer;
use crate::types::progress::{ProgressSave, ProgressUpdate, ReadingProgress, ScrollMetrics};
use crate::types::settings::ReadingSettings;

/// Clamps any percentage-like value into `0..=100`, rounding to the nearest integer.
pub fn clamp_percentage(percentage: f64) -> u8 {
    if !percentage.is_finite() {
        return if percentage == f64::INFINITY { 100 } else { 0 };
    }
    percentage.round().clamp(0.0, 100.0) as u8
}

/// Percentage read for the given geometry.
///
/// Content that fits inside the viewport counts as fully read.
pub fn percentage_from_scroll(metrics: &ScrollMetrics) -> u8 {
    let max_scroll = metrics.max_scroll();
    if max_scroll <= 0.0 {
        return 100;
    }
    clamp_percentage(metrics.offset / max_scroll.max(1.0) * 100.0)
}

/// Scroll offset for `percentage`, using the same max-scroll formula as
/// [`percentage_from_scroll`].
pub fn offset_for_percentage(percentage: f64, metrics: &ScrollMetrics) -> f64 {
    let max_scroll = metrics.max_scroll();
    if max_scroll <= 0.0 {
        return 0.0;
    }
    let fraction = if percentage.is_finite() {
        percentage.clamp(0.0, 100.0) / 100.0
    } else {
        0.0
    };
    fraction * max_scroll.max(1.0)
}

/// Tunables of the tracker, normally taken from [`ReadingSettings`].
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub mark_read_threshold: u8,
    pub save_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            mark_read_threshold: 90,
            save_delay: Duration::from_millis(500),
        }
    }
}

impl From<&ReadingSettings> for TrackerConfig {
    fn from(settings: &ReadingSettings) -> Self {
        Self {
            mark_read_threshold: settings.mark_read_threshold,
            save_delay: Duration::from_millis(settings.save_debounce_ms),
        }
    }
}

/// Progress state of the article currently open in the reader.
#[derive(Debug)]
pub struct ProgressTracker {
    article_id: String,
    percentage: u8,
    offset: f64,
    is_read: bool,
    config: TrackerConfig,
    debouncer: Debouncer,
    pending_restore: Option<u8>,
}

impl ProgressTracker {
    pub fn new(article_id: &str, config: TrackerConfig) -> Self {
        Self {
            article_id: article_id.to_string(),
            percentage: 0,
            offset: 0.0,
            is_read: false,
            config,
            debouncer: Debouncer::new(config.save_delay),
            pending_restore: None,
        }
    }

    /// Seeds the tracker with what storage knows about the article.
    ///
    /// A saved position becomes a pending restore, applied by
    /// [`try_restore`](Self::try_restore) once layout is measurable.
    pub fn with_saved(mut self, saved: Option<&ReadingProgress>, is_read: bool) -> Self {
        self.is_read = is_read;
        if let Some(saved) = saved {
            self.percentage = saved.percentage.min(100);
            self.offset = saved.offset;
            if saved.percentage > 0 {
                self.pending_restore = Some(self.percentage);
            }
        }
        self
    }

    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn pending_restore(&self) -> Option<u8> {
        self.pending_restore
    }

    /// When the pending save becomes due, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Handles one scroll event. The returned value is for the live
    /// indicator; persistence is deferred to the end of the quiet period.
    pub fn on_scroll(&mut self, metrics: &ScrollMetrics, now: Instant) -> ProgressUpdate {
        self.offset = metrics.offset.max(0.0);
        let percentage = percentage_from_scroll(metrics);
        self.set_percentage(percentage, now)
    }

    /// Sets the percentage directly, clamped to `0..=100`.
    pub fn update_progress(&mut self, percentage: f64, now: Instant) -> ProgressUpdate {
        self.set_percentage(clamp_percentage(percentage), now)
    }

    fn set_percentage(&mut self, percentage: u8, now: Instant) -> ProgressUpdate {
        self.percentage = percentage;
        // The user moved before layout settled; their position wins.
        self.pending_restore = None;

        let became_read = !self.is_read && percentage > self.config.mark_read_threshold;
        if became_read {
            self.is_read = true;
            debug!(article_id = %self.article_id, percentage, "article crossed read threshold");
        }

        self.debouncer.trigger(now);

        ProgressUpdate {
            percentage,
            is_read: self.is_read,
            became_read,
        }
    }

    fn snapshot(&self) -> ProgressSave {
        ProgressSave {
            article_id: self.article_id.clone(),
            offset: self.offset,
            percentage: self.percentage,
            mark_read: self.is_read,
        }
    }

    /// The save to persist if the quiet period has elapsed at `now`.
    pub fn take_due_save(&mut self, now: Instant) -> Option<ProgressSave> {
        if self.debouncer.fire_if_due(now) {
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Pending save right away, for when the reader is closing.
    pub fn flush(&mut self) -> Option<ProgressSave> {
        if self.debouncer.cancel() {
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Drops any pending save and restore.
    pub fn teardown(&mut self) {
        if self.debouncer.cancel() {
            debug!(article_id = %self.article_id, "discarded pending progress save");
        }
        self.pending_restore = None;
    }

    /// Applies a pending restore once content height is measurable.
    ///
    /// Returns the offset to scroll to, or `None` when nothing is pending or
    /// layout is not complete yet (the restore then stays pending).
    pub fn try_restore(&mut self, metrics: &ScrollMetrics) -> Option<f64> {
        let percentage = self.pending_restore?;
        if !metrics.is_measurable() {
            return None;
        }
        self.pending_restore = None;
        let offset = offset_for_percentage(percentage as f64, metrics);
        self.offset = offset;
        Some(offset)
    }

    /// Offset for jumping to `percentage` (TOC entry, bookmark).
    pub fn offset_for(&self, percentage: f64, metrics: &ScrollMetrics) -> f64 {
        offset_for_percentage(percentage, metrics)
    }
}
