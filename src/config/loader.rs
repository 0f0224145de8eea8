//! Configuration file loading with precedence handling.

use crate::state::PrependPolicy;
use crate::transport::endpoints::{
    EndpointError, EndpointSettings, Target, DEFAULT_MOUNT_PATH, DEFAULT_REALTIME_PATH,
};
use crate::transport::{ChannelSettings, Endpoints};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for the reconnect backoff.
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A value parsed but is out of range.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Config key holding the value.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Endpoint settings do not resolve to usable URLs.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/argus/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// `development` or `production`.
    #[serde(default)]
    pub target: Option<Target>,

    /// Origin of the logger server, e.g. `https://api.example.com`.
    #[serde(default)]
    pub server_url: Option<String>,

    /// Path the REST API is mounted under.
    #[serde(default)]
    pub mount_path: Option<String>,

    /// Path of the Socket.IO endpoint.
    #[serde(default)]
    pub realtime_path: Option<String>,

    /// Rows per page.
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Per-request HTTP timeout in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// First reconnect delay; doubled per failed attempt.
    #[serde(default)]
    pub reconnect_delay_ms: Option<u64>,

    /// `always` or `first-page-only`.
    #[serde(default)]
    pub live_prepend: Option<PrependPolicy>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Path to the persisted session flags.
    #[serde(default)]
    pub session_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Which server to talk to.
    pub target: Target,
    /// Origin for the production target.
    pub server_url: Option<String>,
    /// REST mount path, e.g. `/logs/`.
    pub mount_path: String,
    /// Socket.IO endpoint path.
    pub realtime_path: String,
    /// Rows per page, at least 1.
    pub page_size: u32,
    /// Per-request HTTP timeout in seconds, at least 1.
    pub request_timeout_secs: u64,
    /// First reconnect delay in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Whether realtime pushes land on pages other than the first.
    pub live_prepend: PrependPolicy,
    /// Tracing output file.
    pub log_file_path: PathBuf,
    /// Persisted session flags file.
    pub session_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            target: Target::Development,
            server_url: None,
            mount_path: DEFAULT_MOUNT_PATH.to_string(),
            realtime_path: DEFAULT_REALTIME_PATH.to_string(),
            page_size: 10,
            request_timeout_secs: 10,
            reconnect_delay_ms: 1000,
            live_prepend: PrependPolicy::Always,
            log_file_path: default_log_path(),
            session_file_path: default_session_path(),
        }
    }
}

impl ResolvedConfig {
    /// Reject values that parse but cannot be used.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(self)
    }

    /// Endpoint inputs taken from this config.
    pub fn endpoint_settings(&self) -> EndpointSettings {
        EndpointSettings {
            target: self.target,
            server_url: self.server_url.clone(),
            mount_path: self.mount_path.clone(),
            realtime_path: self.realtime_path.clone(),
        }
    }

    /// Resolve REST and realtime URLs once for the whole run.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        Ok(Endpoints::resolve(&self.endpoint_settings())?)
    }

    /// HTTP request timeout; also bounds the realtime connect.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Realtime channel settings for the resolved endpoints.
    pub fn channel_settings(&self, endpoints: &Endpoints) -> ChannelSettings {
        let reconnect_delay = Duration::from_millis(self.reconnect_delay_ms.max(1));
        ChannelSettings {
            url: endpoints.realtime_url().clone(),
            reconnect_delay,
            max_reconnect_delay: MAX_RECONNECT_DELAY.max(reconnect_delay),
            connect_timeout: self.request_timeout(),
        }
    }
}

fn state_file(name: &str) -> PathBuf {
    match dirs::state_dir() {
        Some(state_dir) => state_dir.join("argus").join(name),
        None => PathBuf::from(name),
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/argus/argus.log` on Unix-like systems,
/// or the current directory when no state directory exists.
pub fn default_log_path() -> PathBuf {
    state_file("argus.log")
}

/// Resolve default session file path, next to the log file.
pub fn default_session_path() -> PathBuf {
    state_file("session.json")
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
/// Returns `Err` if file exists but cannot be read or parsed.
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/argus/config.toml` on Unix, appropriate path on other platforms.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("argus").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `ARGUS_CONFIG` environment variable
/// 3. Default path `~/.config/argus/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("ARGUS_CONFIG") {
        if env_path.trim().is_empty() {
            return Err(ConfigError::InvalidPath("ARGUS_CONFIG is empty".to_string()));
        }
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `ARGUS_TARGET`: deployment target
/// - `ARGUS_SERVER_URL`: server origin
///
/// # Errors
///
/// Returns error if `ARGUS_TARGET` names no known target.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Ok(target) = std::env::var("ARGUS_TARGET") {
        config.target = target.parse()?;
    }

    if let Ok(server_url) = std::env::var("ARGUS_SERVER_URL") {
        if !server_url.trim().is_empty() {
            config.server_url = Some(server_url);
        }
    }

    Ok(config)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        target: config.target.unwrap_or(defaults.target),
        server_url: config.server_url.or(defaults.server_url),
        mount_path: config.mount_path.unwrap_or(defaults.mount_path),
        realtime_path: config.realtime_path.unwrap_or(defaults.realtime_path),
        page_size: config.page_size.unwrap_or(defaults.page_size),
        request_timeout_secs: config
            .request_timeout_secs
            .unwrap_or(defaults.request_timeout_secs),
        reconnect_delay_ms: config
            .reconnect_delay_ms
            .unwrap_or(defaults.reconnect_delay_ms),
        live_prepend: config.live_prepend.unwrap_or(defaults.live_prepend),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        session_file_path: config
            .session_file_path
            .unwrap_or(defaults.session_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    target_override: Option<Target>,
    server_override: Option<String>,
    page_size_override: Option<u32>,
) -> ResolvedConfig {
    if let Some(target) = target_override {
        config.target = target;
    }

    if let Some(server_url) = server_override {
        config.server_url = Some(server_url);
    }

    if let Some(page_size) = page_size_override {
        config.page_size = page_size;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
