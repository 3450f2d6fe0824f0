// readlater platform abstraction
// Provides platform-specific config and data paths.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Environment variable overriding the data directory (database + article blobs).
pub const DATA_DIR_ENV: &str = "READLATER_DATA_DIR";

/// Returns the platform-specific configuration directory.
///
/// - **Linux**: `~/.config/readlater` (or `$XDG_CONFIG_HOME/readlater`)
/// - **macOS**: `~/Library/Application Support/ReadLater`
/// - **Windows**: `%APPDATA%/ReadLater`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the platform-specific data directory.
///
/// `READLATER_DATA_DIR` wins when set.
///
/// - **Linux**: `~/.local/share/readlater` (or `$XDG_DATA_HOME/readlater`)
/// - **macOS**: `~/Library/Application Support/ReadLater`
/// - **Windows**: `%LOCALAPPDATA%/ReadLater`
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
