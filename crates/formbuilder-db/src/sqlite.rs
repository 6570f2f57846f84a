//! SQLite database backend using `rusqlite`.
//!
//! The connection is guarded by an async mutex and every statement runs on
//! `tokio::task::spawn_blocking` so the driver never blocks the runtime.
//! In-memory databases (`:memory:`) are supported for tests and demos.

use std::path::PathBuf;
use std::sync::Arc;

use formbuilder_core::{FormError, FormResult};
use tokio::sync::Mutex;

use crate::executor::DbExecutor;
use crate::row::Row;
use crate::value::Value;

/// A SQLite database backend.
pub struct SqliteBackend {
    path: PathBuf,
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteBackend {
    /// Opens a SQLite database at the given path (`:memory:` for in-memory).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> FormResult<Self> {
        let path = path.into();
        let conn = if path.to_str() == Some(":memory:") {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| FormError::Configuration(format!("SQLite open failed: {e}")))?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn memory() -> FormResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> FormResult<()> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::Float(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::Bytes(b) => stmt.raw_bind_parameter(idx, b.as_slice()),
            }
            .map_err(|e| FormError::QueryError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> Row {
        let values = (0..column_names.len())
            .map(|i| {
                match sqlite_row
                    .get_ref(i)
                    .unwrap_or(rusqlite::types::ValueRef::Null)
                {
                    rusqlite::types::ValueRef::Null => Value::Null,
                    rusqlite::types::ValueRef::Integer(v) => Value::Int(v),
                    rusqlite::types::ValueRef::Real(v) => Value::Float(v),
                    rusqlite::types::ValueRef::Text(b) => {
                        Value::String(String::from_utf8_lossy(b).into_owned())
                    }
                    rusqlite::types::ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
                }
            })
            .collect();
        Row::new(column_names.to_vec(), values)
    }
}

#[async_trait::async_trait]
impl DbExecutor for SqliteBackend {
    fn vendor(&self) -> &str {
        "sqlite"
    }

    async fn query(&self, sql: &str, params: &[Value]) -> FormResult<Vec<Row>> {
        tracing::trace!(sql, params = params.len(), "sqlite query");
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| FormError::QueryError(e.to_string()))?;
            let column_names: Vec<String> =
                stmt.column_names().into_iter().map(String::from).collect();

            Self::bind_params(&mut stmt, &params)?;

            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows
                .next()
                .map_err(|e| FormError::QueryError(e.to_string()))?
            {
                rows.push(Self::convert_row(row, &column_names));
            }
            Ok(rows)
        })
        .await
        .map_err(|e| FormError::QueryError(format!("Task join error: {e}")))?
    }

    async fn execute_sql(&self, sql: &str, params: &[Value]) -> FormResult<u64> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| FormError::QueryError(e.to_string()))?;
            Self::bind_params(&mut stmt, &params)?;
            let count = stmt
                .raw_execute()
                .map_err(|e| FormError::QueryError(e.to_string()))?;
            Ok(count as u64)
        })
        .await
        .map_err(|e| FormError::QueryError(format!("Task join error: {e}")))?
    }
}
