//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (applied by the server binary)
//! 2. Environment variable (applied by the server binary)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing config file at the default location is not an error: defaults
//! are used. An explicitly requested file that does not exist is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "CAQAO_CONFIG";

/// Port the service has always been reachable on
pub const DEFAULT_PORT: u16 = 5000;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    pub server: ServerConfig,
    pub detector: DetectorConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub bind_host: String,
    pub port: u16,
    /// Host used in absolute image URLs; resolved from the network when unset
    pub public_host: Option<String>,
    /// Request body cap for image uploads
    pub max_upload_bytes: usize,
}

/// External detector settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Inference endpoint receiving the image
    pub url: String,
    /// Maximum detections considered per image; also scales the grade threshold
    pub max_det: u32,
    /// Inference size passed to the detector
    pub image_size: u32,
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("detections.db"),
            server: ServerConfig::default(),
            detector: DetectorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            public_host: None,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/detect".to_string(),
            max_det: 50,
            image_size: 640,
            timeout_secs: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load the config file chosen by [`resolve_config_path`], or defaults.
    ///
    /// Returns the path actually read, `None` when defaults were used.
    pub fn load_or_default(cli_path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let explicit = cli_path.is_some() || std::env::var_os(CONFIG_ENV_VAR).is_some();
        match resolve_config_path(cli_path) {
            Some(path) if path.exists() => {
                let config = Self::load(&path)?;
                Ok((config, Some(path)))
            }
            Some(path) if explicit => Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            ))),
            _ => Ok((Self::default(), None)),
        }
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.detector.url.trim().is_empty() {
            return Err(Error::Config("detector.url must not be empty".to_string()));
        }
        if self.detector.max_det == 0 {
            return Err(Error::Config("detector.max_det must be positive".to_string()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(Error::Config(
                "server.max_upload_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Choose the config file location:
/// 1. Command-line argument
/// 2. `CAQAO_CONFIG` environment variable
/// 3. `<user config dir>/caqao/config.toml`
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    default_config_path()
}

/// Platform config location, e.g. `~/.config/caqao/config.toml` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("caqao").join("config.toml"))
}
