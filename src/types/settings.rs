use serde::{Deserialize, Serialize};

use super::document::EscapePolicy;
use super::gesture::GestureConfig;
use super::reader::ReaderSettings;

/// Top-level settings container, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppSettings {
    pub reader: ReaderSettings,
    pub reading: ReadingSettings,
    #[serde(default)]
    pub gestures: GestureConfig,
    #[serde(default)]
    pub renderer: RendererSettings,
    pub extraction: ExtractionSettings,
}

/// Progress and reading-time behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingSettings {
    pub words_per_minute: u32,
    /// Percentage above which an article is marked read.
    pub mark_read_threshold: u8,
    pub save_debounce_ms: u64,
}

impl Default for ReadingSettings {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
            mark_read_threshold: 90,
            save_debounce_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RendererSettings {
    pub escape_policy: EscapePolicy,
}

/// Where the extraction service lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8787/api/extract".to_string(),
            timeout_secs: 30,
        }
    }
}
