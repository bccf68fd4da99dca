// ABOUTME: User configuration loaded from ~/.agent-spawn/config.toml
// Every field has a default so a missing file or a partial file both work

use crate::terminal::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const APP_DIR: &str = ".agent-spawn";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine home directory")]
    NoHomeDirectory,
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backends to try, in order, after the one the current terminal is detected as.
    pub preferred_backends: Vec<BackendKind>,
    /// Shell used for `-l -c <command>` in kitty tabs.
    pub login_shell: String,
    pub default_command: String,
    /// Directory under the repository root holding agent checkouts.
    pub workspaces_dir: String,
    pub git_program: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred_backends: BackendKind::ALL.to_vec(),
            login_shell: "zsh".to_string(),
            default_command: "claude".to_string(),
            workspaces_dir: ".agents".to_string(),
            git_program: "git".to_string(),
        }
    }
}

impl Config {
    pub fn app_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(APP_DIR))
            .ok_or(ConfigError::NoHomeDirectory)
    }

    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::app_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_config_path()?)
    }

    /// Load `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Ignore-file pattern covering the workspaces directory.
    pub fn workspaces_ignore_pattern(&self) -> String {
        format!("{}/", self.workspaces_dir.trim_end_matches('/'))
    }
}
