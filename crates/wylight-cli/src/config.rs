//! Configuration file management.

use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::warn;
use wylight_core::{BroadcastReceiver, DEFAULT_BROADCAST_PORT};

use crate::cli::{ConfigKey, OutputFormat, ScanArgs, parse_bool};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "WYLIGHT_CONFIG";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// UDP port WiFly modules broadcast to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Local IPv4 address to listen on
    #[serde(default = "default_bind_address")]
    pub bind_address: Ipv4Addr,

    /// Scan duration in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Recently used controllers file
    #[serde(default)]
    pub recent_file: Option<PathBuf>,

    /// Default output format
    #[serde(default)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

fn default_port() -> u16 {
    DEFAULT_BROADCAST_PORT
}

fn default_bind_address() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

fn default_timeout_ms() -> u64 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            timeout_ms: default_timeout_ms(),
            recent_file: None,
            format: None,
            no_color: false,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wylight")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`, or return default if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => warn!("Failed to parse config {}: {}", path.display(), e),
                },
                Err(e) => warn!("Failed to read config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Current value of `key` as shown to the user
    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::Port => self.port.to_string(),
            ConfigKey::BindAddress => self.bind_address.to_string(),
            ConfigKey::TimeoutMs => self.timeout_ms.to_string(),
            ConfigKey::RecentFile => self
                .recent_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(default)".to_string()),
            ConfigKey::Format => self
                .format
                .map(|f| format!("{:?}", f).to_lowercase())
                .unwrap_or_else(|| "(default)".to_string()),
            ConfigKey::NoColor => self.no_color.to_string(),
        }
    }

    /// Parse and store `value` under `key`
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::Port => {
                let port: u16 = value
                    .parse()
                    .with_context(|| format!("Invalid port '{}'", value))?;
                if port == 0 {
                    return Err(anyhow!("Port must be between 1 and 65535"));
                }
                self.port = port;
            }
            ConfigKey::BindAddress => {
                self.bind_address = value
                    .parse()
                    .with_context(|| format!("Invalid IPv4 address '{}'", value))?;
            }
            ConfigKey::TimeoutMs => {
                self.timeout_ms = value
                    .parse()
                    .with_context(|| format!("Invalid timeout '{}'", value))?;
            }
            ConfigKey::RecentFile => self.recent_file = Some(PathBuf::from(value)),
            ConfigKey::Format => {
                let format = <OutputFormat as clap::ValueEnum>::from_str(value, true)
                    .map_err(|e| anyhow!("Invalid format '{}': {}", value, e))?;
                self.format = Some(format);
            }
            ConfigKey::NoColor => self.no_color = parse_bool(value).map_err(|e| anyhow!(e))?,
        }
        Ok(())
    }

    /// Reset `key` to its default
    pub fn unset(&mut self, key: ConfigKey) {
        let defaults = Self::default();
        match key {
            ConfigKey::Port => self.port = defaults.port,
            ConfigKey::BindAddress => self.bind_address = defaults.bind_address,
            ConfigKey::TimeoutMs => self.timeout_ms = defaults.timeout_ms,
            ConfigKey::RecentFile => self.recent_file = defaults.recent_file,
            ConfigKey::Format => self.format = defaults.format,
            ConfigKey::NoColor => self.no_color = defaults.no_color,
        }
    }
}

/// Effective scan parameters after applying flags over config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub bind: SocketAddr,
    pub timeout: Duration,
}

impl ScanSettings {
    /// Command flags win over the config file
    pub fn resolve(args: &ScanArgs, config: &Config) -> Self {
        let ip = args.bind.unwrap_or(config.bind_address);
        let port = args.port.unwrap_or(config.port);
        let timeout_ms = args.timeout.unwrap_or(config.timeout_ms);
        Self {
            bind: SocketAddr::new(ip.into(), port),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Build the broadcast receiver for these settings
    pub fn receiver(&self) -> Result<BroadcastReceiver> {
        BroadcastReceiver::try_with_bind_address(self.bind)
            .with_context(|| format!("Cannot listen on {}", self.bind))
    }
}

/// Resolve the recent file: flag or `WYLIGHT_RECENT`, then config, then default
pub fn resolve_recent_path(arg: Option<&Path>, config: &Config) -> PathBuf {
    arg.map(Path::to_path_buf)
        .or_else(|| config.recent_file.clone())
        .unwrap_or_else(wylight_store::default_recent_path)
}

/// Resolve output format: explicit flag, `--json`, config, then text
pub fn resolve_format(arg: Option<OutputFormat>, json: bool, config: &Config) -> OutputFormat {
    if json {
        return OutputFormat::Json;
    }
    arg.or(config.format).unwrap_or_default()
}
