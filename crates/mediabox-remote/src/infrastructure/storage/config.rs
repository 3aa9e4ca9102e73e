//! TOML configuration for the remote.
//!
//! Reads and writes [`RemoteConfigFile`] at the platform-appropriate path:
//! - Windows:  `%APPDATA%\MediaboxRemote\config.toml`
//! - Linux:    `~/.config/mediabox-remote/config.toml`
//! - macOS:    `~/Library/Application Support/MediaboxRemote/config.toml`
//!
//! ```toml
//! [connection]
//! port = 2048
//! connect_timeout_ms = 5000
//! write_timeout_ms = 5000
//!
//! [remote]
//! last_host = "mediabox.local"
//! log_level = "info"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section or
//! a file written by an older version all load cleanly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mediabox_core::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::connection_manager::ConnectionConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfigFile {
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub remote: RemoteSection,
}

/// Link settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionSection {
    /// TCP port of the media box.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect timeout in milliseconds, DNS lookup included.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Longest time one command write may take before the link is dropped.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

/// Front-end settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteSection {
    /// Host of the last successful connect; used when none is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_host: Option<String>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_write_timeout_ms() -> u64 {
    5_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            last_host: None,
            log_level: default_log_level(),
        }
    }
}

impl RemoteConfigFile {
    /// Builds the connection manager settings from the `[connection]` table.
    pub fn to_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            port: self.connection.port,
            connect_timeout: Duration::from_millis(self.connection.connect_timeout_ms),
            write_timeout: Duration::from_millis(self.connection.write_timeout_ms),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from the platform path.  See [`load_config_from`].
///
/// # Errors
///
/// As [`load_config_from`], plus [`ConfigError::NoPlatformConfigDir`].
pub fn load_config() -> Result<RemoteConfigFile, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the config at `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<RemoteConfigFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RemoteConfigFile::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to the platform path.  See [`save_config_to`].
///
/// # Errors
///
/// As [`save_config_to`], plus [`ConfigError::NoPlatformConfigDir`].
pub fn save_config(config: &RemoteConfigFile) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &RemoteConfigFile, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("MediaboxRemote"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("mediabox-remote"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("MediaboxRemote")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("mediabox_remote_test_{}", Uuid::new_v4()))
            .join("config.toml")
    }

    #[test]
    fn test_default_config_targets_port_2048_with_5s_timeout() {
        // Arrange / Act
        let cfg = RemoteConfigFile::default();

        // Assert
        assert_eq!(cfg.connection.port, 2048);
        assert_eq!(cfg.to_connection_config(), ConnectionConfig::default());
        assert_eq!(cfg.remote.last_host, None);
        assert_eq!(cfg.remote.log_level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: RemoteConfigFile = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, RemoteConfigFile::default());
    }

    #[test]
    fn test_partial_connection_table_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[connection]
connect_timeout_ms = 250
"#;

        // Act
        let cfg: RemoteConfigFile = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.connection.port, 2048);
        assert_eq!(
            cfg.to_connection_config().connect_timeout,
            Duration::from_millis(250)
        );
        assert_eq!(
            cfg.to_connection_config().write_timeout,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_absent_last_host_is_not_written() {
        let toml_str = toml::to_string_pretty(&RemoteConfigFile::default()).expect("serialize");
        assert!(!toml_str.contains("last_host"));
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let result = load_config_from(&temp_path());
        assert_eq!(result.unwrap(), RemoteConfigFile::default());
    }

    #[test]
    fn test_save_then_load_keeps_last_host() {
        // Arrange
        let path = temp_path();
        let mut cfg = RemoteConfigFile::default();
        cfg.connection.port = 12345;
        cfg.remote.last_host = Some("living-room.local".to_string());

        // Act
        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("config.toml"), "got {path:?}");
        }
        // NoPlatformConfigDir is acceptable in a stripped environment.
    }
}
