//! Database binding of a form.
//!
//! Callers hand [`DbOptions`] to `link_to_database` (a bare table name is
//! accepted); the options are normalized into a [`DbBinding`] that always
//! names a table and a connection.

use formbuilder_core::{FormError, FormResult};
use formbuilder_db::SelectAll;
use serde::{Deserialize, Serialize};

/// Database options as given by the caller.
///
/// # Examples
///
/// ```
/// use formbuilder_forms::binding::DbOptions;
///
/// let binding = DbOptions::from("contacts").normalize("appDB").unwrap();
/// assert_eq!(binding.table, "contacts");
/// assert_eq!(binding.connection, "appDB");
///
/// assert!(DbOptions::default().normalize("appDB").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbOptions {
    /// The backing table.
    pub table: Option<String>,
    /// The connection name; the configured default when absent.
    pub connection: Option<String>,
    /// An `ORDER BY` fragment for edit tables.
    pub order: Option<String>,
    /// A `WHERE` fragment for edit tables.
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
    /// A `LIMIT` fragment for edit tables.
    pub limit: Option<String>,
}

impl DbOptions {
    /// Options naming only a table.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    /// Sets the connection name.
    #[must_use]
    pub fn connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    /// Sets the `ORDER BY` fragment.
    #[must_use]
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Sets the `WHERE` fragment.
    #[must_use]
    pub fn filter(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    /// Sets the `LIMIT` fragment.
    #[must_use]
    pub fn limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Normalizes into a binding.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingTable`] if no (non-blank) table is named.
    pub fn normalize(self, default_connection: &str) -> FormResult<DbBinding> {
        let table = self
            .table
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(FormError::MissingTable)?;
        let connection = self
            .connection
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| default_connection.to_string());
        Ok(DbBinding {
            table,
            connection,
            order: self.order,
            where_clause: self.where_clause,
            limit: self.limit,
        })
    }
}

impl From<&str> for DbOptions {
    fn from(table: &str) -> Self {
        Self::table(table)
    }
}

impl From<String> for DbOptions {
    fn from(table: String) -> Self {
        Self::table(table)
    }
}

/// A normalized database binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbBinding {
    /// The backing table.
    pub table: String,
    /// The connection name.
    pub connection: String,
    /// An `ORDER BY` fragment.
    pub order: Option<String>,
    /// A `WHERE` fragment.
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
    /// A `LIMIT` fragment.
    pub limit: Option<String>,
}

impl DbBinding {
    /// Returns the edit table query for this binding.
    pub fn select_all(&self) -> SelectAll {
        SelectAll::new(&self.table)
            .filter(self.where_clause.as_deref())
            .order_by(self.order.as_deref())
            .limit(self.limit.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_table_is_missing() {
        let err = DbOptions::table("  ").normalize("appDB").unwrap_err();
        assert!(matches!(err, FormError::MissingTable));
    }

    #[test]
    fn test_explicit_connection_kept() {
        let binding = DbOptions::table("t")
            .connection("reporting")
            .normalize("appDB")
            .unwrap();
        assert_eq!(binding.connection, "reporting");
    }

    #[test]
    fn test_select_all_fragments() {
        let binding = DbOptions::table("contacts")
            .filter("active = 1")
            .order("name")
            .limit("10")
            .normalize("appDB")
            .unwrap();
        assert_eq!(
            binding.select_all().to_sql(|t| format!("`{t}`")),
            "SELECT * FROM `contacts` WHERE active = 1 ORDER BY name LIMIT 10"
        );
    }

    #[test]
    fn test_options_from_json() {
        let opts: DbOptions =
            serde_json::from_str(r#"{"table":"contacts","where":"id > 3"}"#).unwrap();
        assert_eq!(opts.where_clause.as_deref(), Some("id > 3"));
        assert!(opts.connection.is_none());
    }
}
