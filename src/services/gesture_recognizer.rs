//! Touch gesture recognizer.
//!
//! Turns touch and mouse sequences into taps and four-directional swipes,
//! and detects long presses as the start of a text selection. The
//! recognizer is clock-driven: every sample carries its own timestamp, and
//! the long-press timer is advanced with [`GestureRecognizer::poll`], so the
//! whole state machine can be exercised without a real UI.
//!
//! Classification itself is the pure [`classify`] function.

use tracing::{debug, trace};

use crate::types::gesture::{ElementInfo, Gesture, GestureConfig, GestureEvent, TouchPoint};

const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "input", "select", "textarea", "label", "summary", "option",
];

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "menuitem", "tab", "switch", "slider", "textbox",
    "combobox", "option",
];

const INTERACTIVE_CLASSES: &[&str] = &["btn", "button", "clickable", "interactive"];

/// Classifies a completed sequence.
///
/// Returns `None` when the sequence took longer than the gesture timeout or
/// travelled too far for a tap without reaching the swipe threshold. The
/// dominant axis decides between vertical and horizontal swipes.
pub fn classify(start: TouchPoint, end: TouchPoint, config: &GestureConfig) -> Option<Gesture> {
    let dt = end.t.saturating_sub(start.t);
    if dt > config.gesture_timeout_ms {
        return None;
    }

    // Positive dy: finger moved up. Positive dx: finger moved left.
    let dx = start.x - end.x;
    let dy = start.y - end.y;

    if dx.abs().max(dy.abs()) > config.swipe_threshold_px {
        let gesture = if dx.abs() > dy.abs() {
            if dx > 0.0 { Gesture::SwipeLeft } else { Gesture::SwipeRight }
        } else if dy > 0.0 {
            Gesture::SwipeUp
        } else {
            Gesture::SwipeDown
        };
        return Some(gesture);
    }

    if dx.abs() < config.tap_threshold_px && dy.abs() < config.tap_threshold_px {
        return Some(Gesture::Tap);
    }

    None
}

fn element_is_interactive(element: &ElementInfo) -> bool {
    let tag = element.tag.to_ascii_lowercase();
    if INTERACTIVE_TAGS.contains(&tag.as_str()) {
        return true;
    }
    if let Some(role) = &element.role {
        if INTERACTIVE_ROLES.contains(&role.to_ascii_lowercase().as_str()) {
            return true;
        }
    }
    element
        .classes
        .iter()
        .any(|c| INTERACTIVE_CLASSES.contains(&c.as_str()))
}

/// Whether the target or any ancestor below the bound root is a control
/// or a link. `path` runs from the target upwards and stops before the root.
pub fn is_interactive(path: &[ElementInfo]) -> bool {
    path.iter().any(element_is_interactive)
}

/// Listeners for recognized gestures. Every slot is optional and can be
/// replaced at any time with [`GestureRecognizer::set_callbacks`].
#[derive(Default)]
pub struct GestureCallbacks {
    pub on_gesture: Option<Box<dyn FnMut(Gesture)>>,
    pub on_selection_start: Option<Box<dyn FnMut()>>,
    pub on_selection_end: Option<Box<dyn FnMut()>>,
}

impl GestureCallbacks {
    pub fn on_gesture(mut self, f: impl FnMut(Gesture) + 'static) -> Self {
        self.on_gesture = Some(Box::new(f));
        self
    }

    pub fn on_selection_start(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_selection_start = Some(Box::new(f));
        self
    }

    pub fn on_selection_end(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_selection_end = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for GestureCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureCallbacks")
            .field("on_gesture", &self.on_gesture.is_some())
            .field("on_selection_start", &self.on_selection_start.is_some())
            .field("on_selection_end", &self.on_selection_end.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TrackState {
    Idle,
    Tracking {
        start: TouchPoint,
        /// Armed long-press deadline; cleared once the finger moves.
        long_press_at: Option<u64>,
        interactive: bool,
    },
    Selecting,
    /// A second finger or a cancel; ignore everything until the sequence ends.
    Cancelled,
}

#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    state: TrackState,
    callbacks: GestureCallbacks,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: TrackState::Idle,
            callbacks: GestureCallbacks::default(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Applies new thresholds. A sequence in flight keeps its long-press deadline.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Replaces all listeners at once.
    pub fn set_callbacks(&mut self, callbacks: GestureCallbacks) {
        self.callbacks = callbacks;
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackState::Tracking { .. })
    }

    pub fn is_selecting(&self) -> bool {
        self.state == TrackState::Selecting
    }

    /// Time at which the armed long-press timer fires, in the caller's clock.
    pub fn long_press_deadline(&self) -> Option<u64> {
        match self.state {
            TrackState::Tracking { long_press_at, .. } => long_press_at,
            _ => None,
        }
    }

    /// Begins a sequence. `path` is the target and its ancestors below the root.
    pub fn touch_start(&mut self, point: TouchPoint, path: &[ElementInfo]) {
        match self.state {
            TrackState::Idle => {
                self.state = TrackState::Tracking {
                    start: point,
                    long_press_at: Some(point.t.saturating_add(self.config.long_press_ms)),
                    interactive: is_interactive(path),
                };
                trace!(x = point.x, y = point.y, t = point.t, "touch start");
            }
            // A selection keeps running until its own sequence ends.
            TrackState::Selecting | TrackState::Cancelled => {}
            TrackState::Tracking { .. } => {
                // Multi-touch: never classify pinches as swipes.
                debug!("second touch point, cancelling sequence");
                self.state = TrackState::Cancelled;
            }
        }
    }

    /// Records movement; cancels a pending long press once the finger
    /// leaves the tap radius. May fire a long press that came due before
    /// this sample.
    pub fn touch_move(&mut self, point: TouchPoint) -> Option<GestureEvent> {
        let fired = self.poll(point.t);

        if let TrackState::Tracking {
            start,
            long_press_at,
            ..
        } = &mut self.state
        {
            let moved = (point.x - start.x).abs() >= self.config.tap_threshold_px
                || (point.y - start.y).abs() >= self.config.tap_threshold_px;
            if moved && long_press_at.take().is_some() {
                trace!("movement cancelled long press");
            }
        }

        fired
    }

    /// Ends a sequence and classifies it.
    pub fn touch_end(&mut self, point: TouchPoint) -> Option<GestureEvent> {
        // A long press whose timer should already have fired still counts.
        self.poll(point.t);

        let state = std::mem::replace(&mut self.state, TrackState::Idle);
        match state {
            TrackState::Tracking {
                start, interactive, ..
            } => {
                let gesture = classify(start, point, &self.config)?;
                if gesture == Gesture::Tap && interactive {
                    trace!("tap on interactive element left to the element");
                    return None;
                }
                Some(self.emit_gesture(gesture))
            }
            TrackState::Selecting => {
                if let Some(cb) = self.callbacks.on_selection_end.as_mut() {
                    cb();
                }
                Some(GestureEvent::SelectionEnd)
            }
            TrackState::Idle | TrackState::Cancelled => None,
        }
    }

    /// Aborts the current sequence without classifying it.
    pub fn touch_cancel(&mut self) {
        if self.state == TrackState::Selecting {
            if let Some(cb) = self.callbacks.on_selection_end.as_mut() {
                cb();
            }
        }
        self.state = TrackState::Idle;
    }

    /// Advances the long-press timer to `now`.
    pub fn poll(&mut self, now: u64) -> Option<GestureEvent> {
        match self.state {
            TrackState::Tracking {
                long_press_at: Some(deadline),
                ..
            } if now >= deadline => {
                debug!(now, "long press, selection started");
                self.state = TrackState::Selecting;
                if let Some(cb) = self.callbacks.on_selection_start.as_mut() {
                    cb();
                }
                Some(GestureEvent::SelectionStart)
            }
            _ => None,
        }
    }

    /// Desktop click parity: a click off any interactive element acts as a tap.
    pub fn click(&mut self, path: &[ElementInfo]) -> Option<GestureEvent> {
        if is_interactive(path) {
            return None;
        }
        Some(self.emit_gesture(Gesture::Tap))
    }

    /// Drops the sequence in flight and all listeners.
    pub fn teardown(&mut self) {
        self.state = TrackState::Idle;
        self.callbacks = GestureCallbacks::default();
    }

    fn emit_gesture(&mut self, gesture: Gesture) -> GestureEvent {
        debug!(?gesture, "gesture recognized");
        if let Some(cb) = self.callbacks.on_gesture.as_mut() {
            cb(gesture);
        }
        GestureEvent::Gesture(gesture)
    }
}
