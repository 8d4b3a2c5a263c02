//! Configuration file management for the Confab client.
//!
//! Settings are read from `~/.config/confab/config.toml`. Every field has a
//! default, so a missing file simply yields the default configuration.
//! Command-line flags and environment variables override file values in
//! `main`.

use confab_core::error::{ConfabError, Result};
use confab_http::service::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Owner id stamped on conversations created from this client when the
/// backend does not issue one.
pub const DEFAULT_USER_ID: &str = "current-user-id";

/// Root configuration structure for config.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Base URL of the conversation backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Owner id for conversations created from this client.
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_id: default_user_id(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

impl ReplConfig {
    /// Loads the configuration file, falling back to defaults when it does
    /// not exist.
    pub fn load_or_default() -> Result<Self> {
        let path = config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads a configuration file from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfabError::config(format!(
                "Failed to read configuration file at {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            ConfabError::config(format!(
                "Failed to parse configuration file at {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Opens the log file at ~/.config/confab/confab.log, creating the
/// directory if needed.
pub fn open_log_file() -> Result<fs::File> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir).map_err(|e| {
        ConfabError::config(format!("Failed to create {}: {}", dir.display(), e))
    })?;
    let path = dir.join("confab.log");
    fs::File::create(&path)
        .map_err(|e| ConfabError::config(format!("Failed to open {}: {}", path.display(), e)))
}

/// Returns the path to the configuration file: ~/.config/confab/config.toml
fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Returns the configuration directory: ~/.config/confab
fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ConfabError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("confab"))
}
