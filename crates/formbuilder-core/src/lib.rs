//! # formbuilder-core
//!
//! Core types, settings, diagnostics, and error types for the formbuilder
//! workspace. This crate has no formbuilder dependencies and provides the
//! foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - The [`FormError`] taxonomy and result alias
//! - [`settings`] - Form builder configuration with defaults
//! - [`settings_loader`] - Loading settings from TOML/JSON and the environment
//! - [`diagnostics`] - The reported-error sink and form validation errors
//! - [`logging`] - Tracing-based logging integration

pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use error::{FormError, FormResult};
pub use settings::Settings;
