//! The diagnostics sink for reported, non-fatal failures.
//!
//! The form lifecycle never lets a misconfigured form break a page render.
//! Failures are *reported* here (and mirrored to [`tracing`]) while the
//! operation itself degrades to an empty result. Validation collaborators
//! also deposit per-form error messages here, keyed by a scope of the form
//! `formName_formType`, which the `{formErrors}` template tag later prints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    /// Developer-facing detail, never shown on the page.
    Debug = 10,
    /// Informational message.
    Info = 20,
    /// Success notification.
    Success = 25,
    /// Something the user should look at.
    Warning = 30,
    /// A failure the user should know about.
    Error = 40,
    /// A failure of the backing infrastructure (database, session store).
    High = 50,
}

impl DiagnosticLevel {
    /// Returns the CSS class used when pretty-printing this level.
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Debug | Self::Info => "",
            Self::Success => "successMessage",
            Self::Warning => "warningMessage",
            Self::Error | Self::High => "errorMessage",
        }
    }

    /// Returns `true` if diagnostics of this level belong on the page.
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Debug)
    }
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::High => "high",
        };
        write!(f, "{name}")
    }
}

/// A single reported diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity.
    pub level: DiagnosticLevel,
    /// The message text.
    pub message: String,
}

/// Collects reported diagnostics and per-form validation errors for one request.
///
/// # Examples
///
/// ```
/// use formbuilder_core::diagnostics::{Diagnostics, DiagnosticLevel};
///
/// let mut diagnostics = Diagnostics::new();
/// diagnostics.debug("form 'contact' not defined");
/// diagnostics.add_form_error("contact_insertForm", "Name is required");
///
/// assert_eq!(diagnostics.entries().len(), 1);
/// assert_eq!(diagnostics.form_errors("contact_insertForm"), ["Name is required"]);
/// assert!(diagnostics.user_facing().next().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    form_errors: HashMap<String, Vec<String>>,
}

impl Diagnostics {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a diagnostic and mirrors it to the tracing subscriber.
    pub fn report(&mut self, level: DiagnosticLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            DiagnosticLevel::Debug => tracing::debug!(target: "formbuilder", "{message}"),
            DiagnosticLevel::Info | DiagnosticLevel::Success => {
                tracing::info!(target: "formbuilder", "{message}");
            }
            DiagnosticLevel::Warning => tracing::warn!(target: "formbuilder", "{message}"),
            DiagnosticLevel::Error | DiagnosticLevel::High => {
                tracing::error!(target: "formbuilder", level = %level, "{message}");
            }
        }
        self.entries.push(Diagnostic { level, message });
    }

    /// Reports a debug-level diagnostic.
    pub fn debug(&mut self, message: impl Into<String>) {
        self.report(DiagnosticLevel::Debug, message);
    }

    /// Reports an error-level diagnostic.
    pub fn error(&mut self, message: impl Into<String>) {
        self.report(DiagnosticLevel::Error, message);
    }

    /// Reports a high-severity (infrastructure) diagnostic.
    pub fn high(&mut self, message: impl Into<String>) {
        self.report(DiagnosticLevel::High, message);
    }

    /// Records a validation error for the form scope `formName_formType`.
    pub fn add_form_error(&mut self, scope: impl Into<String>, message: impl Into<String>) {
        self.form_errors
            .entry(scope.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the validation errors recorded for a form scope.
    pub fn form_errors(&self, scope: &str) -> &[String] {
        self.form_errors.get(scope).map_or(&[], Vec::as_slice)
    }

    /// Returns every reported diagnostic in report order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Iterates the diagnostics that belong on the page.
    pub fn user_facing(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.level.is_user_facing())
    }

    /// Returns `true` if any diagnostic at `level` or above was reported.
    pub fn has_at_least(&self, level: DiagnosticLevel) -> bool {
        self.entries.iter().any(|d| d.level >= level)
    }

    /// Returns `true` if a reported message contains `needle` (test helper and log search).
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }

    /// Clears all diagnostics and form errors.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.form_errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(DiagnosticLevel::Debug < DiagnosticLevel::Error);
        assert!(DiagnosticLevel::High > DiagnosticLevel::Error);
    }

    #[test]
    fn test_css_class() {
        assert_eq!(DiagnosticLevel::Error.css_class(), "errorMessage");
        assert_eq!(DiagnosticLevel::Success.css_class(), "successMessage");
        assert_eq!(DiagnosticLevel::Warning.css_class(), "warningMessage");
    }

    #[test]
    fn test_report_and_query() {
        let mut d = Diagnostics::new();
        d.debug("hidden detail");
        d.error("visible failure");
        assert_eq!(d.entries().len(), 2);
        assert_eq!(d.user_facing().count(), 1);
        assert!(d.has_at_least(DiagnosticLevel::Error));
        assert!(!d.has_at_least(DiagnosticLevel::High));
        assert!(d.contains("hidden"));
    }

    #[test]
    fn test_form_errors_scoped() {
        let mut d = Diagnostics::new();
        d.add_form_error("contact_insertForm", "a");
        d.add_form_error("contact_insertForm", "b");
        d.add_form_error("other_insertForm", "c");
        assert_eq!(d.form_errors("contact_insertForm"), ["a", "b"]);
        assert!(d.form_errors("contact_updateForm").is_empty());
    }

    #[test]
    fn test_clear() {
        let mut d = Diagnostics::new();
        d.high("db down");
        d.add_form_error("x_insertForm", "bad");
        d.clear();
        assert!(d.entries().is_empty());
        assert!(d.form_errors("x_insertForm").is_empty());
    }
}
