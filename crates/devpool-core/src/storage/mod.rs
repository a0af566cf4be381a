mod config;
pub mod database;

pub use config::{CoachConfig, Config, NotificationsConfig, SessionConfig};
pub use database::{Database, FocusSessionRecord, FocusStats};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/devpool[-dev]/` based on DEVPOOL_ENV.
///
/// Set DEVPOOL_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DEVPOOL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("devpool-dev")
    } else {
        base_dir.join("devpool")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
