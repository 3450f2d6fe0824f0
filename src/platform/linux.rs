// readlater platform paths for Linux
// Config: ~/.config/readlater
// Data:   ~/.local/share/readlater

use std::env;
use std::path::PathBuf;

/// Returns the configuration directory on Linux.
/// Uses `$XDG_CONFIG_HOME/readlater` if set, otherwise `~/.config/readlater`.
pub fn get_config_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("readlater")
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
        PathBuf::from(home).join(".config").join("readlater")
    }
}

/// Returns the data directory on Linux.
/// Uses `$XDG_DATA_HOME/readlater` if set, otherwise `~/.local/share/readlater`.
pub fn get_data_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("readlater")
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("readlater")
    }
}
