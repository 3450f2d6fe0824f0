use serde::{Deserialize, Serialize};

/// A passage the reader selected with a long press and kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Highlight {
    pub id: String,
    pub article_id: String,
    pub text: String,
    pub color: HighlightColor,
    pub note: Option<String>,
    /// Scroll percentage at which the selection was made.
    pub percentage: f64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
}

impl HighlightColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yellow" => Some(HighlightColor::Yellow),
            "green" => Some(HighlightColor::Green),
            "blue" => Some(HighlightColor::Blue),
            "pink" => Some(HighlightColor::Pink),
            _ => None,
        }
    }
}
