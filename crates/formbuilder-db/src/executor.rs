//! The database executor trait.
//!
//! [`DbExecutor`] is the minimal async interface the form builder needs from
//! a database driver: run a query and get rows back, run a statement, and
//! quote an identifier. Concrete backends (the `sqlite` module, or an
//! application's own driver) implement it; forms hold it as
//! `Arc<dyn DbExecutor>`.

use formbuilder_core::FormResult;

use crate::row::Row;
use crate::value::Value;

/// Minimal async database executor trait.
///
/// Query failures are reported as
/// [`FormError::QueryError`](formbuilder_core::FormError::QueryError)
/// carrying the driver's error code and message.
#[async_trait::async_trait]
pub trait DbExecutor: Send + Sync {
    /// Returns the vendor name (e.g. "sqlite", "mysql").
    fn vendor(&self) -> &str;

    /// Runs a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> FormResult<Vec<Row>>;

    /// Runs a SQL statement that does not return rows.
    /// Returns the number of rows affected.
    async fn execute_sql(&self, sql: &str, params: &[Value]) -> FormResult<u64>;

    /// Quotes a table or column name for interpolation into SQL.
    ///
    /// The default uses ANSI double quotes, doubling embedded quotes.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullExecutor;

    #[async_trait::async_trait]
    impl DbExecutor for NullExecutor {
        fn vendor(&self) -> &str {
            "null"
        }

        async fn query(&self, _sql: &str, _params: &[Value]) -> FormResult<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn execute_sql(&self, _sql: &str, _params: &[Value]) -> FormResult<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_default_quote_identifier() {
        let db = NullExecutor;
        assert_eq!(db.quote_identifier("contacts"), "\"contacts\"");
        assert_eq!(db.quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[tokio::test]
    async fn test_trait_object_usage() {
        let db: Box<dyn DbExecutor> = Box::new(NullExecutor);
        assert_eq!(db.vendor(), "null");
        assert!(db.query("SELECT 1", &[]).await.unwrap().is_empty());
        assert_eq!(db.execute_sql("DELETE FROM t", &[]).await.unwrap(), 0);
    }
}
