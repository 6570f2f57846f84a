//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMBUILDER_DEBUG` | `debug` |
//! | `FORMBUILDER_LOG_LEVEL` | `log_level` |
//! | `FORMBUILDER_FORM_TIMEOUT` | `form_timeout` |
//! | `FORMBUILDER_SESSION_NAMESPACE` | `session_namespace` |
//! | `FORMBUILDER_DEFAULT_CONNECTION` | `default_connection` |
//! | `FORMBUILDER_TEMPLATE_DIRS` | `template_dirs` (comma-separated) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use formbuilder_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/forms.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::FormError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Keys missing from the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, FormError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormError::Configuration(format!("Failed to parse TOML: {e}")))?;
    merge_into_defaults(toml_to_json(toml_value))
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let content = read_config(path.as_ref())?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, FormError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormError::Configuration(format!("Failed to parse JSON: {e}")))?;
    merge_into_defaults(json_value)
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let content = read_config(path.as_ref())?;
    from_json_str(&content)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `FORMBUILDER_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

/// Applies overrides using `lookup` to resolve each `FORMBUILDER_*` key.
///
/// Unparseable numeric values are ignored and the current value is kept.
pub fn apply_overrides_from(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("FORMBUILDER_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("FORMBUILDER_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("FORMBUILDER_FORM_TIMEOUT") {
        if let Ok(timeout) = val.trim().parse::<u64>() {
            settings.form_timeout = timeout;
        }
    }

    if let Some(val) = lookup("FORMBUILDER_SESSION_NAMESPACE") {
        settings.session_namespace = val;
    }

    if let Some(val) = lookup("FORMBUILDER_DEFAULT_CONNECTION") {
        settings.default_connection = val;
    }

    if let Some(val) = lookup("FORMBUILDER_TEMPLATE_DIRS") {
        settings.template_dirs = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path) -> Result<String, FormError> {
    std::fs::read_to_string(path).map_err(|e| {
        FormError::Configuration(format!(
            "Failed to read settings file '{}': {e}",
            path.display()
        ))
    })
}

/// Deep-merges `overrides` into the serialized defaults and deserializes the result.
fn merge_into_defaults(overrides: serde_json::Value) -> Result<Settings, FormError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        FormError::Configuration(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, overrides);
    serde_json::from_value(merged)
        .map_err(|e| FormError::Configuration(format!("Failed to deserialize settings: {e}")))
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
