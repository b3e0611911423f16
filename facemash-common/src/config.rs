//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing TOML file is not an error: the client starts with defaults and
//! logs a warning. A TOML file that exists but cannot be parsed is rejected.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Directory name used under the platform config directory
pub const APP_DIR_NAME: &str = "facemash";

/// Environment variable overriding the backend base URL
pub const ENV_API_URL: &str = "FACEMASH_API_URL";

/// Environment variable carrying the host-supplied init data credential
pub const ENV_INIT_DATA: &str = "FACEMASH_INIT_DATA";

/// Environment variable pointing at an alternative TOML config file
pub const ENV_CONFIG_PATH: &str = "FACEMASH_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Backend base URL (scheme + host + optional port), without the `/api` root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Init data forwarded as the `tma` authorization credential
    #[serde(default)]
    pub init_data: Option<String>,

    /// Upper bound for any single gateway call
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Upper bound for a vote submission before the pick is reverted
    #[serde(default = "default_vote_timeout_ms")]
    pub vote_timeout_ms: u64,

    /// Device pixel ratio used to size photo requests (capped at 3.0)
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,

    /// Viewport width in CSS pixels; <= 768 selects the mobile card layout
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Preference flag file (optional)
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
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

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            init_data: None,
            request_timeout_ms: default_request_timeout_ms(),
            vote_timeout_ms: default_vote_timeout_ms(),
            device_pixel_ratio: default_device_pixel_ratio(),
            viewport_width: default_viewport_width(),
            preferences_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_vote_timeout_ms() -> u64 {
    10_000
}

fn default_device_pixel_ratio() -> f64 {
    2.0
}

fn default_viewport_width() -> u32 {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub init_data: Option<String>,
    pub log_level: Option<String>,
}

/// Fully resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash
    pub api_base_url: String,
    /// Authorization credential (None = send no Authorization header)
    pub init_data: Option<String>,
    pub request_timeout: Duration,
    pub vote_timeout: Duration,
    pub device_pixel_ratio: f64,
    pub viewport_width: u32,
    pub preferences_path: PathBuf,
    pub log_level: String,
}

impl ClientConfig {
    /// Resolve configuration from CLI overrides, environment, TOML and defaults
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the TOML file exists but is malformed, or if
    /// the resolved values fail validation.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        // Priority 1: --config, Priority 2: FACEMASH_CONFIG, Priority 3: platform default
        let config_path = overrides
            .config_path
            .clone()
            .or_else(|| std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from))
            .or_else(default_config_path);

        let toml_config = match &config_path {
            Some(path) => load_toml_config(path)?,
            None => {
                warn!("Could not determine config directory, using built-in defaults");
                TomlConfig::default()
            }
        };

        Self::from_layers(toml_config, overrides)
    }

    /// Merge an already-loaded TOML layer with environment and CLI overrides
    pub fn from_layers(toml_config: TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        let api_base_url = overrides
            .api_base_url
            .or_else(|| std::env::var(ENV_API_URL).ok())
            .unwrap_or(toml_config.api_base_url);

        let init_data = overrides
            .init_data
            .or_else(|| std::env::var(ENV_INIT_DATA).ok())
            .or(toml_config.init_data);

        let preferences_path = match toml_config.preferences_path {
            Some(path) => path,
            None => default_preferences_path()?,
        };

        let config = Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            init_data,
            request_timeout: Duration::from_millis(toml_config.request_timeout_ms),
            vote_timeout: Duration::from_millis(toml_config.vote_timeout_ms),
            device_pixel_ratio: toml_config.device_pixel_ratio,
            viewport_width: toml_config.viewport_width,
            preferences_path,
            log_level: overrides.log_level.unwrap_or(toml_config.logging.level),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }
        if self.request_timeout.is_zero() || self.vote_timeout.is_zero() {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            return Err(Error::Config(format!(
                "device_pixel_ratio must be positive, got {}",
                self.device_pixel_ratio
            )));
        }
        Ok(())
    }
}

/// Default TOML config location: `<config dir>/facemash/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Default preference file location: `<config dir>/facemash/preferences.toml`
pub fn default_preferences_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join("preferences.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load the TOML layer, falling back to defaults when the file is missing
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Serialize `value` as TOML and write it atomically (temp file + rename)
///
/// Parent directories are created if needed. On Unix the file is restricted
/// to owner read/write since it may contain the init data credential.
pub fn write_toml_atomic<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize TOML: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.logging.level, "info");
        assert!(config.init_data.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str("api_base_url = \"https://rate.example\"").unwrap();
        assert_eq!(config.api_base_url, "https://rate.example");
        assert_eq!(config.vote_timeout_ms, 10_000);
        assert_eq!(config.device_pixel_ratio, 2.0);
        assert_eq!(config.viewport_width, 1024);
    }

    #[test]
    fn test_logging_section() {
        let config: TomlConfig = toml::from_str("[logging]\nlevel = \"debug\"").unwrap();
        assert_eq!(config.logging.level, "debug");
    }
}
