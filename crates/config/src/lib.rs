#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for pkgjob
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/pkgjob/config.toml)
//! - Environment variables (`PKGJOB_*`)

pub mod constants;

use pkgjob_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub archive_dir: Option<PathBuf>,
    pub restart_marker: Option<PathBuf>,
    pub upgrade_lock: Option<PathBuf>,
}

/// Lock acquisition policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_lock_attempts")]
    pub attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Resolver behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_install_recommends")]
    pub install_recommends: bool,
    #[serde(default = "default_autoremove")]
    pub autoremove: bool,
    #[serde(default = "default_native_arch")]
    pub native_arch: String,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_fetch_changelogs")]
    pub fetch_changelogs: bool,
}

// Default implementations

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            attempts: default_lock_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            install_recommends: default_install_recommends(),
            autoremove: default_autoremove(),
            native_arch: default_native_arch(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fetch_changelogs: default_fetch_changelogs(),
        }
    }
}

// Default value functions for serde
fn default_lock_attempts() -> u32 {
    10
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_install_recommends() -> bool {
    true
}

fn default_autoremove() -> bool {
    false
}

fn default_native_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "i386",
        "powerpc64" => "ppc64el",
        other => other,
    }
    .to_string()
}

fn default_fetch_changelogs() -> bool {
    true
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(dir) = std::env::var("PKGJOB_ARCHIVE_DIR") {
            if dir.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "PKGJOB_ARCHIVE_DIR".to_string(),
                    value: dir,
                }
                .into());
            }
            self.paths.archive_dir = Some(PathBuf::from(dir));
        }

        if let Ok(attempts) = std::env::var("PKGJOB_LOCK_ATTEMPTS") {
            self.lock.attempts = match attempts.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PKGJOB_LOCK_ATTEMPTS".to_string(),
                        value: attempts,
                    }
                    .into())
                }
            };
        }

        if let Ok(delay) = std::env::var("PKGJOB_LOCK_RETRY_MS") {
            self.lock.retry_delay_ms = delay.parse().map_err(|_| ConfigError::InvalidValue {
                field: "PKGJOB_LOCK_RETRY_MS".to_string(),
                value: delay,
            })?;
        }

        if let Ok(value) = std::env::var("PKGJOB_INSTALL_RECOMMENDS") {
            self.resolver.install_recommends = parse_bool("PKGJOB_INSTALL_RECOMMENDS", value)?;
        }

        if let Ok(value) = std::env::var("PKGJOB_AUTOREMOVE") {
            self.resolver.autoremove = parse_bool("PKGJOB_AUTOREMOVE", value)?;
        }

        if let Ok(arch) = std::env::var("PKGJOB_NATIVE_ARCH") {
            self.resolver.native_arch = arch;
        }

        Ok(())
    }

    /// Directory holding downloaded package archives
    #[must_use]
    pub fn archive_dir(&self) -> PathBuf {
        self.paths
            .archive_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::ARCHIVE_DIR))
    }

    /// Lock file guarding the archive directory
    #[must_use]
    pub fn archive_lock(&self) -> PathBuf {
        self.archive_dir().join(constants::ARCHIVE_LOCK_NAME)
    }

    #[must_use]
    pub fn partial_dir(&self) -> PathBuf {
        self.archive_dir().join(constants::PARTIAL_DIR_NAME)
    }

    #[must_use]
    pub fn restart_marker(&self) -> PathBuf {
        self.paths
            .restart_marker
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::RESTART_MARKER))
    }

    #[must_use]
    pub fn upgrade_lock(&self) -> PathBuf {
        self.paths
            .upgrade_lock
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::UPGRADE_LOCK))
    }

    #[must_use]
    pub fn lock_retry_delay(&self) -> Duration {
        Duration::from_millis(self.lock.retry_delay_ms)
    }
}
