//! TOML configuration for the capture pipeline.
//!
//! Read from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\GestureCapture\config.toml`
//! - Linux:    `~/.config/gesture-capture/config.toml`
//! - macOS:    `~/Library/Application Support/GestureCapture/config.toml`
//!
//! ```toml
//! [capture]
//! log_level = "debug"
//! strict_session = false
//!
//! [dispatcher]
//! capacity = 100
//! max_consecutive_failures = 5
//! failure_backoff_ms = 500
//!
//! [sink]
//! kind = "csv"
//! path = "samples.csv"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section, or
//! a missing key all fall back to the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::dispatcher::{DispatcherConfig, DEFAULT_CAPACITY};
use crate::pipeline::PipelineOptions;

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

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    #[serde(default)]
    pub capture: CaptureSection,
    #[serde(default)]
    pub dispatcher: DispatcherSection,
    #[serde(default)]
    pub sink: SinkSection,
}

/// Tap behaviour and logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureSection {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Skip samples while no session is open instead of emitting them with
    /// empty identity tags.
    #[serde(default)]
    pub strict_session: bool,
}

/// Buffer size and sink-failure pause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatcherSection {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    #[serde(default = "default_failure_backoff_ms")]
    pub failure_backoff_ms: u64,
}

/// Where records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// One `tracing` line per record.
    #[default]
    Log,
    /// Append to a CSV file.
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinkSection {
    #[serde(default)]
    pub kind: SinkKind,
    /// CSV output path; ignored by the log sink.
    #[serde(default = "default_sink_path")]
    pub path: PathBuf,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}
fn default_max_consecutive_failures() -> u32 {
    5
}
fn default_failure_backoff_ms() -> u64 {
    500
}
fn default_sink_path() -> PathBuf {
    PathBuf::from("samples.csv")
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            strict_session: false,
        }
    }
}

impl Default for DispatcherSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_consecutive_failures: default_max_consecutive_failures(),
            failure_backoff_ms: default_failure_backoff_ms(),
        }
    }
}

impl Default for SinkSection {
    fn default() -> Self {
        Self {
            kind: SinkKind::default(),
            path: default_sink_path(),
        }
    }
}

impl From<&DispatcherSection> for DispatcherConfig {
    fn from(section: &DispatcherSection) -> Self {
        DispatcherConfig {
            capacity: section.capacity,
            max_consecutive_failures: section.max_consecutive_failures,
            failure_backoff: Duration::from_millis(section.failure_backoff_ms),
        }
    }
}

impl From<&CaptureConfig> for PipelineOptions {
    fn from(config: &CaptureConfig) -> Self {
        PipelineOptions {
            dispatcher: DispatcherConfig::from(&config.dispatcher),
            strict_session: config.capture.strict_session,
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

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from the platform config file, or defaults when the file
/// does not exist.
///
/// # Errors
///
/// [`ConfigError::NoPlatformConfigDir`], [`ConfigError::Io`] for file-system
/// errors other than "not found", and [`ConfigError::Parse`] for bad TOML.
pub fn load_config() -> Result<CaptureConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the config from `path`, or defaults when the file does not exist.
///
/// # Errors
///
/// Same as [`load_config`], minus the platform lookup.
pub fn load_config_from(path: &Path) -> Result<CaptureConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CaptureConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// [`ConfigError::Io`] or [`ConfigError::Serialize`].
pub fn save_config_to(config: &CaptureConfig, path: &Path) -> Result<(), ConfigError> {
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
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("GestureCapture"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("gesture-capture"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("GestureCapture")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
