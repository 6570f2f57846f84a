//! # formbuilder-db
//!
//! The database collaborator of the form builder. Forms never talk to a
//! driver directly: they hold a [`DbExecutor`] resolved by name from a
//! [`ConnectionRegistry`], and read result sets as [`Row`]s of [`Value`]s.
//!
//! ## Modules
//!
//! - [`value`] - Backend-agnostic cell values
//! - [`row`] - Result rows with ordered columns
//! - [`executor`] - The async executor trait implemented by backends
//! - [`connections`] - Named connection registry with a default alias
//! - [`query`] - The `SELECT *` statement used by edit tables
//! - `sqlite` - A `rusqlite` backend (feature `sqlite`)

pub mod connections;
pub mod executor;
pub mod query;
pub mod row;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod value;

pub use connections::ConnectionRegistry;
pub use executor::DbExecutor;
pub use query::SelectAll;
pub use row::Row;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
pub use value::Value;
