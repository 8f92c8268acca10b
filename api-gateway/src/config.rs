//! Gateway configuration loading and parsing

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/portainer-tools/config.toml";
pub const CONFIG_PATH_ENV: &str = "PORTAINER_TOOLS_CONFIG";

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub portainer: PortainerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Where the values came from; reported once logging is up
    #[serde(skip)]
    pub source: ConfigSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    #[default]
    Defaults,
    File(PathBuf),
    /// The file was looked for but absent, so defaults apply
    Missing(PathBuf),
}

#[derive(Debug, Deserialize, Clone)]
pub struct PortainerConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    #[serde(default = "default_token_ttl")]
    pub token_cache_ttl: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for PortainerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            verify_ssl: true,
            token_cache_ttl: default_token_ttl(),
            timeout_seconds: default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_token_ttl() -> u64 { 3600 }
fn default_timeout() -> u64 { 30 }
fn default_log_level() -> String { "info".into() }

/// Immutable connection settings handed to the session manager
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub verify_tls: bool,
    pub token_ttl: Duration,
    pub request_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self, ConfigError> {
        PortainerConfig {
            url: base_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..PortainerConfig::default()
        }
        .connection()
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}

impl PortainerConfig {
    /// Validate settings and build the immutable connection record
    pub fn connection(&self) -> Result<ConnectionConfig, ConfigError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Missing("portainer.url"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "portainer.url",
                reason: format!("expected an http(s) URL, got {url:?}"),
            });
        }
        if self.username.is_empty() {
            return Err(ConfigError::Missing("portainer.username"));
        }
        if self.token_cache_ttl == 0 {
            return Err(ConfigError::Invalid {
                field: "portainer.token_cache_ttl",
                reason: "must be greater than zero".into(),
            });
        }

        Ok(ConnectionConfig {
            base_url: url.trim_end_matches('/').to_string(),
            username: self.username.clone(),
            password: self.password.clone(),
            verify_tls: self.verify_ssl,
            token_ttl: Duration::from_secs(self.token_cache_ttl),
            request_timeout: Duration::from_secs(self.timeout_seconds.max(1)),
        })
    }
}

impl GatewayConfig {
    /// Apply PORTAINER_* environment overrides on top of file values
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PORTAINER_URL") {
            self.portainer.url = url;
        }
        if let Some(username) = lookup("PORTAINER_USERNAME") {
            self.portainer.username = username;
        }
        if let Some(password) = lookup("PORTAINER_PASSWORD") {
            self.portainer.password = password;
        }
        if let Some(raw) = lookup("PORTAINER_VERIFY_SSL") {
            self.portainer.verify_ssl = parse_bool(&raw).ok_or(ConfigError::Invalid {
                field: "PORTAINER_VERIFY_SSL",
                reason: format!("expected a boolean, got {raw:?}"),
            })?;
        }
        if let Some(raw) = lookup("PORTAINER_TOKEN_TTL") {
            self.portainer.token_cache_ttl =
                raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    field: "PORTAINER_TOKEN_TTL",
                    reason: format!("expected seconds, got {raw:?}"),
                })?;
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load configuration from a TOML file, falling back to defaults when absent
pub fn load_config_from(path: &Path) -> Result<GatewayConfig, ConfigError> {
    if !path.exists() {
        return Ok(GatewayConfig {
            source: ConfigSource::Missing(path.to_path_buf()),
            ..GatewayConfig::default()
        });
    }

    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    let mut config: GatewayConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })?;
    config.source = ConfigSource::File(path.to_path_buf());
    Ok(config)
}

/// Load configuration from $PORTAINER_TOOLS_CONFIG (or the default path) plus environment
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_config_from(Path::new(&config_path))?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}
