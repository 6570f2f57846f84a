//! # formbuilder-forms
//!
//! Forms for the formbuilder workspace: field widgets, field catalogs, form
//! definitions and their database bindings, the tag-based template renderer
//! and row materializer, render-session snapshots, processors, and the
//! [`FormManager`] that ties the lifecycle together.
//!
//! ## Modules
//!
//! - [`field`] - The [`Field`] capability trait, [`FieldSpec`], form and field kinds
//! - [`widgets`] - [`HtmlField`], the default HTML widget
//! - [`catalog`] - [`FieldCatalog`], the ordered fields of a form
//! - [`binding`] - Database options and bindings
//! - [`definition`] - [`FormDefinition`]
//! - [`registry`] - [`FormRegistry`], the live forms of a request
//! - [`snapshot`] - Plain-data snapshots stored in render sessions
//! - [`options`] - [`RenderOptions`]
//! - [`renderer`] - [`TemplateRenderer`]
//! - [`rows`] - `{rowLoop}` expansion and row identifiers
//! - [`processor`] - [`Processor`]
//! - [`error_html`] - Pretty printing of diagnostics
//! - [`manager`] - [`FormManager`]

pub mod binding;
pub mod catalog;
pub mod definition;
pub mod error_html;
pub mod field;
pub mod manager;
pub mod options;
pub mod processor;
pub mod registry;
pub mod renderer;
pub mod rows;
pub mod snapshot;
pub mod widgets;

pub use binding::{DbBinding, DbOptions};
pub use catalog::FieldCatalog;
pub use definition::{FormDefinition, PrimaryValues};
pub use field::{Field, FieldFactory, FieldSpec, FieldType, FormKind, SelectOption};
pub use manager::FormManager;
pub use options::RenderOptions;
pub use processor::{CollectedValues, Processor};
pub use registry::FormRegistry;
pub use renderer::{RenderContext, TemplateRenderer};
pub use rows::row_identifier;
pub use snapshot::{FormSnapshot, RenderSession};
pub use widgets::HtmlField;
