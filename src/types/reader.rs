use serde::{Deserialize, Serialize};

/// Typography of the reader view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReaderSettings {
    pub font_size: u32,
    pub font_family: FontFamily,
    pub theme: ReaderTheme,
    pub line_height: f32,
    pub max_width: u32,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            font_size: 18,
            font_family: FontFamily::Serif,
            theme: ReaderTheme::Light,
            line_height: 1.6,
            max_width: 680,
        }
    }
}

/// Font family options for the reader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FontFamily {
    Serif,
    SansSerif,
    Monospace,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ReaderTheme {
    Light,
    Sepia,
    Dark,
}

impl ReaderTheme {
    /// Background and foreground colors.
    pub fn colors(&self) -> (&'static str, &'static str) {
        match self {
            ReaderTheme::Light => ("#ffffff", "#24292f"),
            ReaderTheme::Sepia => ("#f4ecd8", "#5b4636"),
            ReaderTheme::Dark => ("#1b1d21", "#d7dae0"),
        }
    }
}
