// readlater platform paths for Windows
// Config: %APPDATA%/ReadLater
// Data:   %LOCALAPPDATA%/ReadLater

use std::env;
use std::path::PathBuf;

/// `%APPDATA%/ReadLater`
pub fn get_config_dir() -> PathBuf {
    let appdata =
        env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("ReadLater")
}

/// `%LOCALAPPDATA%/ReadLater`
pub fn get_data_dir() -> PathBuf {
    let local_appdata = env::var("LOCALAPPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Local"));
    PathBuf::from(local_appdata).join("ReadLater")
}
