//! The `SELECT *` statement behind edit-table row loops.
//!
//! `WHERE`, `ORDER BY` and `LIMIT` fragments come from the form's database
//! binding, which is trusted application configuration, and are spliced in
//! verbatim. Only the table name is quoted.

use crate::executor::DbExecutor;

/// A `SELECT * FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT ..]` statement.
///
/// # Examples
///
/// ```
/// use formbuilder_db::query::SelectAll;
///
/// let sql = SelectAll::new("contacts")
///     .filter(Some("active = 1"))
///     .order_by(Some("name"))
///     .limit(Some("10"))
///     .to_sql(|t| format!("`{t}`"));
/// assert_eq!(sql, "SELECT * FROM `contacts` WHERE active = 1 ORDER BY name LIMIT 10");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectAll {
    table: String,
    where_clause: Option<String>,
    order: Option<String>,
    limit: Option<String>,
}

impl SelectAll {
    /// Starts a statement over `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Sets the `WHERE` fragment. Blank fragments are ignored.
    #[must_use]
    pub fn filter(mut self, where_clause: Option<&str>) -> Self {
        self.where_clause = non_blank(where_clause);
        self
    }

    /// Sets the `ORDER BY` fragment. Blank fragments are ignored.
    #[must_use]
    pub fn order_by(mut self, order: Option<&str>) -> Self {
        self.order = non_blank(order);
        self
    }

    /// Sets the `LIMIT` fragment. Blank fragments are ignored.
    #[must_use]
    pub fn limit(mut self, limit: Option<&str>) -> Self {
        self.limit = non_blank(limit);
        self
    }

    /// Renders the SQL using `quote` for the table name.
    pub fn to_sql(&self, quote: impl Fn(&str) -> String) -> String {
        let mut sql = format!("SELECT * FROM {}", quote(&self.table));
        if let Some(w) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(w);
        }
        if let Some(o) = &self.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(o);
        }
        if let Some(l) = &self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(l);
        }
        sql
    }

    /// Renders the SQL with the executor's identifier quoting.
    pub fn to_sql_for(&self, db: &dyn DbExecutor) -> String {
        self.to_sql(|t| db.quote_identifier(t))
    }
}

fn non_blank(fragment: Option<&str>) -> Option<String> {
    fragment
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(t: &str) -> String {
        t.to_string()
    }

    #[test]
    fn test_bare_select() {
        assert_eq!(SelectAll::new("t").to_sql(plain), "SELECT * FROM t");
    }

    #[test]
    fn test_blank_fragments_ignored() {
        let sql = SelectAll::new("t")
            .filter(Some("   "))
            .order_by(None)
            .limit(Some(""))
            .to_sql(plain);
        assert_eq!(sql, "SELECT * FROM t");
    }

    #[test]
    fn test_order_only() {
        let sql = SelectAll::new("t").order_by(Some("id DESC")).to_sql(plain);
        assert_eq!(sql, "SELECT * FROM t ORDER BY id DESC");
    }
}
