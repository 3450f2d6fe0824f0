use serde::{Deserialize, Serialize};

/// A normalized pointer sample: position in CSS pixels, time in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
    pub t: u64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64, t: u64) -> Self {
        Self { x, y, t }
    }
}

/// A classified gesture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Tap,
    SwipeUp,
    SwipeDown,
    SwipeLeft,
    SwipeRight,
}

/// Everything the recognizer can report to its listeners.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "gesture", rename_all = "snake_case")]
pub enum GestureEvent {
    Gesture(Gesture),
    SelectionStart,
    SelectionEnd,
}

/// One element on the path from the touch target up to the bound root.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElementInfo {
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
}

impl ElementInfo {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            role: None,
            classes: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }
}

/// Distance and timing thresholds of the recognizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GestureConfig {
    /// Minimum travel along the dominant axis for a swipe.
    pub swipe_threshold_px: f64,
    /// Maximum travel on both axes for a tap; also cancels a pending long press.
    pub tap_threshold_px: f64,
    /// Sequences slower than this are dropped.
    pub gesture_timeout_ms: u64,
    pub long_press_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_threshold_px: 50.0,
            tap_threshold_px: 10.0,
            gesture_timeout_ms: 300,
            long_press_ms: 400,
        }
    }
}
