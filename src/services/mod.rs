// ReadLater services
// Services provide the reader core: rendering, progress tracking, gestures, UI state, extraction and settings.

pub mod debouncer;
pub mod extraction_client;
pub mod gesture_recognizer;
pub mod immersive_ui;
pub mod markdown_renderer;
pub mod progress_tracker;
pub mod reader_view;
pub mod settings_engine;
