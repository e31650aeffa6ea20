//! TOML-based configuration persistence for the engine.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\ClipCast\config.toml`
//! - Linux:    `~/.config/clipcast/config.toml`
//! - macOS:    `~/Library/Application Support/ClipCast/config.toml`
//!
//! # Serde default values
//!
//! Every field carries a `#[serde(default = "some_fn")]` annotation and
//! every section defaults as a whole, so an absent file, an empty file,
//! and a file from an older release that lacks newer fields all load
//! cleanly. Only malformed TOML is an error.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

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

// ── Config schema types ─────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// General engine behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for archived captures. Absent means captures are not
    /// written to disk at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<PathBuf>,
}

/// Network port and bind-address settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// TCP port peers connect to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// IP address to bind the listener to. `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Capture pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    /// Upper bound on one selection read, in milliseconds. A capture
    /// that blows past this is treated as empty.
    #[serde(default = "default_selection_timeout_ms")]
    pub selection_timeout_ms: u64,
    /// Whether to listen for SIGUSR1/SIGUSR2 as capture/paste triggers
    /// (Unix only; ignored elsewhere).
    #[serde(default = "default_true")]
    pub signal_triggers: bool,
}

impl NetworkConfig {
    /// Combines `bind_address` and `port` into a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.bind_address.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl CaptureConfig {
    pub fn selection_timeout(&self) -> Duration {
        Duration::from_millis(self.selection_timeout_ms)
    }
}

// ── Default helpers ─────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_port() -> u16 {
    9998
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_selection_timeout_ms() -> u64 {
    2000
}
fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            network: NetworkConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            archive_dir: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            selection_timeout_ms: default_selection_timeout_ms(),
            signal_triggers: default_true(),
        }
    }
}

// ── Config repository ───────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config
/// base directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory
/// cannot be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;
    load_config_from(path)
}

/// Loads `AppConfig` from an explicit path, with the same absent-file
/// behaviour as [`load_config`]. This is the entry point the `--config`
/// command-line flag goes through.
pub fn load_config_from(path: PathBuf) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk.
///
/// Creates the config directory and file if they do not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    // Ensure directory exists before writing.
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory plus the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ClipCast"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("clipcast"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/ClipCast
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ClipCast")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        // Fallback for unsupported platforms.
        None
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_temp_dir(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("clipcast_{label}_{}_{nanos}", std::process::id()))
    }

    // ── AppConfig defaults ──────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_has_expected_network_settings() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.network.port, 9998);
        assert_eq!(cfg.network.bind_address, "0.0.0.0");
    }

    #[test]
    fn test_app_config_default_log_level_is_info() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.log_level, "info");
    }

    #[test]
    fn test_app_config_default_has_no_archive_dir() {
        let cfg = AppConfig::default();
        assert!(cfg.server.archive_dir.is_none());
    }

    #[test]
    fn test_capture_config_default_timeout_is_two_seconds() {
        let cfg = CaptureConfig::default();
        assert_eq!(cfg.selection_timeout(), Duration::from_secs(2));
        assert!(cfg.signal_triggers);
    }

    // ── listen_addr ─────────────────────────────────────────────────────────

    #[test]
    fn test_listen_addr_combines_address_and_port() {
        // Arrange
        let cfg = NetworkConfig {
            port: 4242,
            bind_address: "127.0.0.1".to_string(),
        };

        // Act / Assert
        assert_eq!(cfg.listen_addr().unwrap(), "127.0.0.1:4242".parse().unwrap());
    }

    #[test]
    fn test_listen_addr_accepts_ipv6() {
        let cfg = NetworkConfig {
            port: 9998,
            bind_address: "::".to_string(),
        };
        assert!(cfg.listen_addr().unwrap().is_ipv6());
    }

    #[test]
    fn test_listen_addr_rejects_garbage() {
        let cfg = NetworkConfig {
            port: 9998,
            bind_address: "not-an-ip".to_string(),
        };
        assert!(cfg.listen_addr().is_err());
    }

    // ── TOML round-trip ─────────────────────────────────────────────────────

    #[test]
    fn test_app_config_serializes_and_deserializes_round_trip() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.network.port = 9000;
        cfg.server.archive_dir = Some(PathBuf::from("/var/lib/clipcast"));
        cfg.capture.selection_timeout_ms = 500;

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_absent_archive_dir_is_omitted_from_toml() {
        // Arrange
        let cfg = AppConfig::default();

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");

        // Assert
        assert!(
            !toml_str.contains("archive_dir"),
            "None archive_dir must be omitted, got:\n{toml_str}"
        );
    }

    #[test]
    fn test_deserialize_empty_toml_uses_all_defaults() {
        // Arrange / Act: a first-run config file can be completely empty.
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");

        // Assert
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_minimal_toml_uses_defaults() {
        // Arrange: sections present but empty
        let toml_str = r#"
[server]
[network]
[capture]
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize minimal");

        // Assert
        assert_eq!(cfg.network.port, 9998);
        assert_eq!(cfg.server.log_level, "info");
        assert_eq!(cfg.capture.selection_timeout_ms, 2000);
    }

    #[test]
    fn test_deserialize_partial_network_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[network]
port = 12000
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.network.port, 12000);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.network.bind_address, "0.0.0.0");
        assert_eq!(cfg.server.log_level, "info");
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        // Arrange
        let bad_toml = "[[[ not valid toml";

        // Act
        let result: Result<AppConfig, toml::de::Error> = toml::from_str(bad_toml);

        // Assert
        assert!(result.is_err());
    }

    // ── load_config_from ────────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_returns_default_when_file_absent() {
        // Arrange
        let path = unique_temp_dir("absent").join("config.toml");

        // Act
        let cfg = load_config_from(path).expect("absent file must not error");

        // Assert
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_config_from_reads_saved_values() {
        // Arrange
        let dir = unique_temp_dir("roundtrip");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.network.port = 12345;
        cfg.server.log_level = "debug".to_string();
        std::fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();

        // Act
        let loaded = load_config_from(path).expect("load");

        // Assert
        assert_eq!(loaded.network.port, 12345);
        assert_eq!(loaded.server.log_level, "debug");

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_from_rejects_malformed_file() {
        // Arrange
        let dir = unique_temp_dir("malformed");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "port = definitely not toml {{{").unwrap();

        // Act
        let result = load_config_from(path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    // ── config_dir path formation ───────────────────────────────────────────

    #[test]
    fn test_platform_config_dir_returns_some_on_this_platform() {
        // This test verifies the function returns Some on the current
        // platform. We only assert when the relevant env var is available,
        // so stripped containers do not fail spuriously.
        let result = platform_config_dir();
        #[cfg(target_os = "windows")]
        if std::env::var_os("APPDATA").is_some() {
            assert!(result.is_some());
        }
        #[cfg(target_os = "linux")]
        {
            let has_xdg = std::env::var_os("XDG_CONFIG_HOME").is_some();
            let has_home = std::env::var_os("HOME").is_some();
            if has_xdg || has_home {
                assert!(result.is_some());
            }
        }
        #[cfg(target_os = "macos")]
        if std::env::var_os("HOME").is_some() {
            assert!(result.is_some());
        }
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        let path_result = config_file_path();
        if let Ok(path) = path_result {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir in a stripped CI env is also acceptable.
    }
}
