//! # formbuilder
//!
//! Database-backed HTML forms rendered from tag templates.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on
//! `formbuilder` for everything, or on the individual crates for finer
//! control.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use formbuilder::prelude::*;
//!
//! # async fn page() -> FormResult<()> {
//! let settings = Settings::default();
//! let connections = ConnectionRegistry::new(settings.default_connection.clone());
//! let mut manager = FormManager::new(settings, Arc::new(InMemorySessionStore::new()), connections);
//!
//! let form = manager.create_form("contact", None)?;
//! form.add_field(FieldSpec::new("email", FieldType::Email).label("E-mail"))?;
//!
//! let html = manager.display("contact", "insertForm", &RenderOptions::new()).await;
//! # let _ = html;
//! # Ok(())
//! # }
//! ```

/// Errors, settings, diagnostics and logging.
pub use formbuilder_core as core;

/// Database values, rows, executors and connections.
pub use formbuilder_db as db;

/// Render-session storage, CSRF tokens and posted submissions.
#[cfg(feature = "session")]
pub use formbuilder_session as session;

/// The tag grammar: lexer, parser, HTML helpers and template loaders.
#[cfg(feature = "template")]
pub use formbuilder_template as template;

/// Fields, form definitions, the renderer, processors and the manager.
#[cfg(feature = "forms")]
pub use formbuilder_forms as forms;

// Third-party crates used in the public API.
pub use async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// Commonly used types.
pub mod prelude {
    pub use formbuilder_core::{DiagnosticLevel, Diagnostics, FormError, FormResult, Settings};
    pub use formbuilder_db::{ConnectionRegistry, DbExecutor, Row, Value};

    #[cfg(feature = "session")]
    pub use formbuilder_session::{InMemorySessionStore, SessionStore, Submission};

    #[cfg(feature = "template")]
    pub use formbuilder_template::{StringLoader, TemplateLoader};

    #[cfg(feature = "forms")]
    pub use formbuilder_forms::{
        CollectedValues, DbOptions, FieldSpec, FieldType, FormKind, FormManager, RenderOptions,
    };
}
