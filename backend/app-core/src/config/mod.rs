use crate::DEFAULT_APP_URL;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "app.toml";
const CONFIG_VERSION: u32 = 1;
const CONFIG_DIR_ENV: &str = "APPSHELL_CONFIG_DIR";
const CONFIG_DIR_NAME: &str = "appshell";
const DEFAULT_EVENT_BUFFER: usize = 100;
const MAX_EVENT_BUFFER: usize = 65_536;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationSection {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ApplicationSection {
    fn default() -> Self {
        Self {
            url: default_url(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvidersSection {
    /// Upper bound on tracked providers; absent means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tracked: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerSection {
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub application: ApplicationSection,

    #[serde(default)]
    pub providers: ProvidersSection,

    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            application: ApplicationSection::default(),
            providers: ProvidersSection::default(),
            runner: RunnerSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_url() -> String {
    DEFAULT_APP_URL.to_string()
}
fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}
fn default_log_level() -> String {
    "info".to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl AppConfig {
    /// Load config from {config_dir}/app.toml.
    ///
    /// # Returns
    ///
    /// Returns `Ok(AppConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: AppConfig = toml::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config TOML: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/app.toml using atomic write.
    ///
    /// Uses temp file + rename so a crash never leaves a half-written file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation,
    /// serialization, the write or the rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, contents).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        self.application_url()?;

        if self.providers.max_tracked == Some(0) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "providers.max_tracked must be at least 1 (omit it for no limit)"
                    .to_string(),
            });
        }

        if self.runner.event_buffer == 0 || self.runner.event_buffer > MAX_EVENT_BUFFER {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid event buffer: {} (must be 1-{})",
                    self.runner.event_buffer, MAX_EVENT_BUFFER
                ),
            });
        }

        self.log_level()?;

        Ok(())
    }

    /// The application URL, parsed.
    pub fn application_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.application.url).map_err(|e| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid application URL '{}': {e}", self.application.url),
        })
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        self.logging
            .level
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Invalid log level: {}", self.logging.level),
            })
    }
}

/// Directory holding app.toml.
///
/// `APPSHELL_CONFIG_DIR` wins; otherwise the platform config directory.
///
/// # Platform Behavior
/// - **Linux**: `$XDG_CONFIG_HOME/appshell` or `~/.config/appshell`
/// - **macOS**: `~/Library/Application Support/appshell`
/// - **Windows**: `%APPDATA%/appshell`
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
        info!("Using {CONFIG_DIR_ENV} override: {custom_dir}");
        return Ok(PathBuf::from(custom_dir));
    }

    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| ConfigError::DirectoryNotFound {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("No platform config directory and {CONFIG_DIR_ENV} is unset"),
        })
}
