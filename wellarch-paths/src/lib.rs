//! XDG Base Directory paths for wellarch.
//!
//! The review tooling keeps its configuration and saved review sessions
//! under XDG paths on every platform, the same layout tools like gh and
//! kubectl use.

use std::path::PathBuf;

const APP_DIR: &str = "wellarch";

/// Get the wellarch config directory.
///
/// Returns `$XDG_CONFIG_HOME/wellarch` if set, otherwise `~/.config/wellarch`.
/// The review engine looks for `config.toml` here.
///
/// # Examples
///
/// ```
/// use wellarch_paths::config_dir;
///
/// let config = config_dir().join("config.toml");
/// assert!(config.ends_with("wellarch/config.toml"));
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config").join(APP_DIR)
    } else {
        PathBuf::from(".config").join(APP_DIR)
    }
}

/// Get the wellarch data directory.
///
/// Returns `$XDG_DATA_HOME/wellarch` if set, otherwise `~/.local/share/wellarch`.
/// Review sessions are persisted below this directory.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share").join(APP_DIR)
    } else {
        PathBuf::from(".local/share").join(APP_DIR)
    }
}

/// Directory holding one JSON file per review session.
pub fn sessions_dir() -> PathBuf {
    data_dir().join("sessions")
}
