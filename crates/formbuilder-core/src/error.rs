//! Core error types for the formbuilder workspace.
//!
//! [`FormError`] covers the structural/configuration failures of the form
//! lifecycle, the block-scoped row-loop signals, and the ambient failures
//! (serialization, session storage, template loading, IO) that surface
//! through the collaborators.

use thiserror::Error;

/// The primary error type for the formbuilder workspace.
///
/// Variants fall into three groups:
///
/// - configuration errors (`DuplicateName`, `MissingTable`, `NoDatabaseLink`,
///   `UnknownDisplayType`, ...) which callers report and then degrade to an
///   empty result,
/// - processor lookup errors (`NoId`, `InvalidId`) which callers present as
///   an "expired or invalid form" message,
/// - block-scoped signals (`QueryError`, `EmptyResult`) which replace a
///   single rendered block with [`FormError::user_message`].
#[derive(Error, Debug)]
pub enum FormError {
    // ── Lifecycle ────────────────────────────────────────────────────

    /// A form with this name is already registered.
    #[error("Form already created with given name: '{0}'")]
    DuplicateName(String),

    /// Database options were given without a table name.
    #[error("Database options must include a 'table' element")]
    MissingTable,

    /// The form has no database binding (it must be processed manually).
    #[error("No database link defined for form '{0}'")]
    NoDatabaseLink(String),

    /// No form identifier was supplied or found in the submission.
    #[error("No form ID supplied")]
    NoId,

    /// The form identifier does not name a live render session.
    #[error("Invalid or expired form ID: '{0}'")]
    InvalidId(String),

    /// The requested display type is not supported.
    #[error("Unsupported display type '{0}'")]
    UnknownDisplayType(String),

    /// A field was referenced that the catalog does not define.
    #[error("No field defined for '{0}'")]
    UnknownField(String),

    /// A named database connection is not registered.
    #[error("Unknown database connection '{0}'")]
    UnknownConnection(String),

    // ── Row loop ─────────────────────────────────────────────────────

    /// The row-loop query failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// The row-loop query returned no rows.
    #[error("{0}")]
    EmptyResult(String),

    // ── Ambient ──────────────────────────────────────────────────────

    /// A template could not be loaded or is malformed.
    #[error("Template error: {0}")]
    Template(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The session store rejected an operation.
    #[error("Session error: {0}")]
    Session(String),

    /// A snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormError {
    /// Returns `true` for signals that only abort a single template block.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::QueryError(_) | Self::EmptyResult(_))
    }

    /// Returns the text rendered in place of a block that failed with this error.
    ///
    /// Query failures never leak database details into the page.
    pub fn user_message(&self) -> String {
        match self {
            Self::QueryError(_) => "Internal database error!".to_string(),
            Self::EmptyResult(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for FormError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// A convenience type alias for `Result<T, FormError>`.
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            FormError::DuplicateName("contact".into()).to_string(),
            "Form already created with given name: 'contact'"
        );
        assert_eq!(
            FormError::EmptyResult("No records found".into()).to_string(),
            "No records found"
        );
        assert_eq!(FormError::NoId.to_string(), "No form ID supplied");
    }

    #[test]
    fn test_recoverable_signals() {
        assert!(FormError::QueryError("x".into()).is_recoverable());
        assert!(FormError::EmptyResult("x".into()).is_recoverable());
        assert!(!FormError::MissingTable.is_recoverable());
        assert!(!FormError::InvalidId("abc".into()).is_recoverable());
    }

    #[test]
    fn test_user_message_hides_query_details() {
        let err = FormError::QueryError("1064: syntax error near FROM".into());
        assert_eq!(err.user_message(), "Internal database error!");
        let err = FormError::EmptyResult("No records found".into());
        assert_eq!(err.user_message(), "No records found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FormError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FormError = bad.into();
        assert!(matches!(err, FormError::Serialization(_)));
    }
}
