//! Named database connections.
//!
//! Forms refer to their database by connection *name* so that a saved form
//! snapshot never carries a live handle. The [`ConnectionRegistry`] maps
//! names to executors and supplies the configured default when a binding
//! does not name one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use formbuilder_core::{FormError, FormResult};

use crate::executor::DbExecutor;

/// Registry of named database executors.
///
/// # Examples
///
/// ```
/// use formbuilder_db::ConnectionRegistry;
///
/// let registry = ConnectionRegistry::new("appDB");
/// assert_eq!(registry.default_name(), "appDB");
/// assert!(registry.resolve(None).is_err());
/// ```
#[derive(Clone)]
pub struct ConnectionRegistry {
    default_name: String,
    connections: HashMap<String, Arc<dyn DbExecutor>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry whose default connection is `default_name`.
    pub fn new(default_name: impl Into<String>) -> Self {
        Self {
            default_name: default_name.into(),
            connections: HashMap::new(),
        }
    }

    /// Registers (or replaces) a connection under `name`.
    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn DbExecutor>) {
        self.connections.insert(name.into(), executor);
    }

    /// Returns the name used when none is given.
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Returns the effective name for an optional connection name.
    pub fn effective_name<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        name.unwrap_or(&self.default_name)
    }

    /// Resolves an optional connection name to its executor.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownConnection`] if no executor is registered.
    pub fn resolve(&self, name: Option<&str>) -> FormResult<Arc<dyn DbExecutor>> {
        let name = self.effective_name(name);
        self.connections
            .get(name)
            .cloned()
            .ok_or_else(|| FormError::UnknownConnection(name.to_string()))
    }

    /// Returns the registered connection names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("default_name", &self.default_name)
            .field("connections", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;
    use crate::value::Value;

    struct Named(&'static str);

    #[async_trait::async_trait]
    impl DbExecutor for Named {
        fn vendor(&self) -> &str {
            self.0
        }

        async fn query(&self, _sql: &str, _params: &[Value]) -> FormResult<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn execute_sql(&self, _sql: &str, _params: &[Value]) -> FormResult<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_resolve_default_and_named() {
        let mut registry = ConnectionRegistry::new("appDB");
        registry.register("appDB", Arc::new(Named("main")));
        registry.register("reporting", Arc::new(Named("reports")));

        assert_eq!(registry.resolve(None).unwrap().vendor(), "main");
        assert_eq!(registry.resolve(Some("reporting")).unwrap().vendor(), "reports");
        assert_eq!(registry.names(), vec!["appDB", "reporting"]);
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ConnectionRegistry::new("appDB");
        match registry.resolve(Some("nope")) {
            Err(FormError::UnknownConnection(name)) => assert_eq!(name, "nope"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_effective_name() {
        let registry = ConnectionRegistry::new("appDB");
        assert_eq!(registry.effective_name(None), "appDB");
        assert_eq!(registry.effective_name(Some("x")), "x");
    }
}
