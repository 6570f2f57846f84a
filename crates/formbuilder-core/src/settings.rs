//! Settings for the formbuilder workspace.
//!
//! [`Settings`] holds every tunable of the form lifecycle: session timeout
//! and namespace, the default database connection, template locations, and
//! logging. It is plain serde data so it can be loaded from TOML or JSON via
//! [`settings_loader`](crate::settings_loader).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default lifetime of a saved render session, in seconds.
pub const DEFAULT_FORM_TIMEOUT: u64 = 300;

/// Default session key prefix under which render sessions are stored.
pub const DEFAULT_SESSION_NAMESPACE: &str = "formBuilderForms";

/// Default name of the database connection used when a binding omits one.
pub const DEFAULT_CONNECTION: &str = "appDB";

/// The complete set of form builder settings.
///
/// # Examples
///
/// ```
/// use formbuilder_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.form_timeout, 300);
/// assert_eq!(settings.session_namespace, "formBuilderForms");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (compact logs instead of JSON).
    pub debug: bool,

    // ── Sessions ─────────────────────────────────────────────────────

    /// Lifetime of a saved render session in seconds.
    pub form_timeout: u64,
    /// Session key prefix for saved render sessions.
    pub session_namespace: String,

    // ── Database ─────────────────────────────────────────────────────

    /// Connection name used when database options do not name one.
    pub default_connection: String,

    // ── Templates ────────────────────────────────────────────────────

    /// Directories searched for form templates.
    pub template_dirs: Vec<PathBuf>,
    /// Template identifier used for insert and update forms.
    pub default_insert_template: String,
    /// Template identifier used for edit tables.
    pub default_edit_template: String,
    /// Base URL (or directory) where form assets live.
    pub assets_url: String,
    /// Whether rendered forms leave browser-side validation enabled.
    pub browser_validation: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,

            form_timeout: DEFAULT_FORM_TIMEOUT,
            session_namespace: DEFAULT_SESSION_NAMESPACE.to_string(),

            default_connection: DEFAULT_CONNECTION.to_string(),

            template_dirs: Vec::new(),
            default_insert_template: "default".to_string(),
            default_edit_template: "default".to_string(),
            assets_url: "formBuilderAssets".to_string(),
            browser_validation: true,

            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Returns the session key under which the render session `form_id` lives.
    pub fn session_key(&self, form_id: &str) -> String {
        format!("{}.{form_id}", self.session_namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.debug);
        assert_eq!(settings.form_timeout, DEFAULT_FORM_TIMEOUT);
        assert_eq!(settings.default_connection, "appDB");
        assert_eq!(settings.default_insert_template, "default");
        assert!(settings.browser_validation);
        assert!(settings.template_dirs.is_empty());
    }

    #[test]
    fn test_session_key() {
        let settings = Settings::default();
        assert_eq!(settings.session_key("abc123"), "formBuilderForms.abc123");
    }

    #[test]
    fn test_serde_roundtrip() {
        let settings = Settings {
            form_timeout: 60,
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.form_timeout, 60);
    }
}
