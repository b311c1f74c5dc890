//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration only: where the database lives and how verbose
//! logging is. Everything else is stored in the database itself.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SONGSHARE_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "songshare.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    ///
    /// If not specified, will attempt CLI → environment → OS default
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Database file (relative to the root folder, or absolute)
    #[serde(default)]
    pub database_file: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
    }

    /// Load the config file if there is one, otherwise fall back to defaults
    ///
    /// A missing or unreadable file never stops startup. Nothing is logged
    /// here; call [`ConfigSource::log`] once a subscriber is installed.
    pub fn locate(explicit: Option<&Path>) -> (Self, ConfigSource) {
        let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => return (Self::default(), ConfigSource::NoConfigDir),
        };

        if !path.exists() {
            return (Self::default(), ConfigSource::Missing(path));
        }

        match Self::load(&path) {
            Ok(config) => (config, ConfigSource::Loaded(path)),
            Err(error) => (Self::default(), ConfigSource::Invalid { path, error }),
        }
    }

    /// [`TomlConfig::locate`], logging the outcome immediately
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let (config, source) = Self::locate(explicit);
        source.log();
        config
    }
}

/// Where the bootstrap configuration came from
#[derive(Debug)]
pub enum ConfigSource {
    Loaded(PathBuf),
    /// No file at the path; defaults used
    Missing(PathBuf),
    /// The platform has no config directory; defaults used
    NoConfigDir,
    /// The file exists but could not be read or parsed; defaults used
    Invalid { path: PathBuf, error: Error },
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::Loaded(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Missing(path) => {
                info!("No config file at {}, using defaults", path.display())
            }
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using defaults")
            }
            ConfigSource::Invalid { path, error } => {
                warn!("Ignoring config file {}: {}", path.display(), error)
            }
        }
    }

    /// True when defaults were used because the file was unusable
    pub fn is_invalid(&self) -> bool {
        matches!(self, ConfigSource::Invalid { .. })
    }
}

/// Default configuration file path (`~/.config/songshare/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songshare").join("config.toml"))
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("songshare"))
        .unwrap_or_else(|| PathBuf::from("./songshare_data"))
}

/// Database path for a resolved root folder
pub fn database_path(root_folder: &Path, config: &TomlConfig) -> PathBuf {
    match &config.database_file {
        Some(file) if file.is_absolute() => file.clone(),
        Some(file) => root_folder.join(file),
        None => root_folder.join(DATABASE_FILE_NAME),
    }
}
