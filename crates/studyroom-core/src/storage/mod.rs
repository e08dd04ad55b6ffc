mod config;
pub mod database;
mod store;

pub use config::{CycleSettings, Config, NotificationsConfig};
pub use database::Database;
pub use store::Store;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Directory holding `config.toml` and `studyroom.db`.
///
/// `STUDYROOM_DATA_DIR` wins when set. Otherwise `~/.config/studyroom`, or
/// `~/.config/studyroom-dev` with `STUDYROOM_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("STUDYROOM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studyroom-dev")
            } else {
                base_dir.join("studyroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
