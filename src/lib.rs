//! ReadLater: the core of an offline read-it-later reader.
//!
//! Saved articles are rendered from markdown, reading progress is tracked
//! and persisted per article, touch input is classified into gestures, and
//! an immersive-UI state machine decides what chrome is on screen.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod logging;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
