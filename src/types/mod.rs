// readlater shared type definitions
// Each submodule defines types used across the application.

pub mod article;
pub mod bookmark;
pub mod document;
pub mod errors;
pub mod gesture;
pub mod highlight;
pub mod progress;
pub mod reader;
pub mod settings;
pub mod ui;
