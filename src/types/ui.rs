use serde::{Deserialize, Serialize};

use super::gesture::Gesture;

/// Top-level screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Library,
    Reader,
}

/// Overlay panels that sit above the reader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Settings,
    Toc,
}

/// Process-wide UI state. Never persisted.
///
/// A panel is only ever open while the chrome is visible.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UiState {
    pub view: View,
    pub chrome_hidden: bool,
    pub panel: Option<Panel>,
    pub current_article_id: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl UiState {
    pub fn panel_open(&self) -> bool {
        self.panel.is_some()
    }
}

/// Inputs of the immersive UI state machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UiEvent {
    Gesture(Gesture),
    OpenPanel(Panel),
    ClosePanel,
    OpenArticle(String),
    ShowLibrary,
    LoadingStarted,
    LoadingFinished,
    Failed(String),
    DismissError,
}
