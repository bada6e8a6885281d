//! Settings for the formflow middleware.
//!
//! This module provides the [`Settings`] struct holding the middleware
//! configuration, with sensible defaults, a TOML loader, and environment
//! variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMFLOW_DEBUG` | `debug` |
//! | `FORMFLOW_LOG_LEVEL` | `log_level` |
//! | `FORMFLOW_FORM_CACHE_TIMEOUT` | `form_cache_timeout` (seconds) |
//! | `FORMFLOW_FILE_UPLOAD_MAX_MEMORY_SIZE` | `file_upload_max_memory_size` (bytes) |

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FormFlowError;

/// The minimum allowed form cache timeout, in seconds.
///
/// Shorter timeouts would evict definitions while a user is still filling
/// in the form they were rendered with.
pub const MINIMAL_EXPIRED_TIMEOUT_SECS: u64 = 300;

/// Default in-memory cap for a single uploaded file, in bytes (2.5 MiB).
pub const DEFAULT_FILE_UPLOAD_MAX_MEMORY_SIZE: usize = 2_621_440;

/// The complete set of middleware settings.
///
/// All fields have defaults suitable for development, so `Settings::default()`
/// is a working configuration.
///
/// # Examples
///
/// ```
/// use formflow_core::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.form_cache_timeout, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,

    // ── Form cache ───────────────────────────────────────────────────

    /// How long a registered form definition stays cached, in seconds.
    ///
    /// Values below [`MINIMAL_EXPIRED_TIMEOUT_SECS`] are clamped up when
    /// read through [`Settings::form_cache_timeout`].
    pub form_cache_timeout: u64,

    // ── Uploads ──────────────────────────────────────────────────────

    /// The maximum size of an uploaded file that is buffered in memory,
    /// in bytes.
    pub file_upload_max_memory_size: usize,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            form_cache_timeout: MINIMAL_EXPIRED_TIMEOUT_SECS,
            file_upload_max_memory_size: DEFAULT_FILE_UPLOAD_MAX_MEMORY_SIZE,
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns the form cache timeout as a [`Duration`], clamped to the
    /// minimum of [`MINIMAL_EXPIRED_TIMEOUT_SECS`].
    pub fn form_cache_timeout(&self) -> Duration {
        Duration::from_secs(self.form_cache_timeout.max(MINIMAL_EXPIRED_TIMEOUT_SECS))
    }
}

/// Loads settings from a TOML string.
///
/// Fields not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, FormFlowError> {
    toml::from_str(toml_str)
        .map_err(|e| FormFlowError::ConfigurationError(format!("Failed to parse TOML: {e}")))
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, FormFlowError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        FormFlowError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable
/// overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormFlowError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies environment variable overrides to a settings struct.
///
/// Supported environment variables:
///
/// - `FORMFLOW_DEBUG` -> `debug` (values: "true"/"1"/"yes" => true)
/// - `FORMFLOW_LOG_LEVEL` -> `log_level`
/// - `FORMFLOW_FORM_CACHE_TIMEOUT` -> `form_cache_timeout` (seconds)
/// - `FORMFLOW_FILE_UPLOAD_MAX_MEMORY_SIZE` -> `file_upload_max_memory_size`
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("FORMFLOW_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("FORMFLOW_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("FORMFLOW_FORM_CACHE_TIMEOUT") {
        if let Ok(secs) = val.parse::<u64>() {
            settings.form_cache_timeout = secs;
        }
    }

    if let Ok(val) = std::env::var("FORMFLOW_FILE_UPLOAD_MAX_MEMORY_SIZE") {
        if let Ok(bytes) = val.parse::<usize>() {
            settings.file_upload_max_memory_size = bytes;
        }
    }
}
