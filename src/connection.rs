//! Dataset connection configuration and identity.
//!
//! Supports configuration via environment variables:
//! - `DQ_DB_DRIVER`: Database driver (only `duckdb` today)
//! - `DQ_DB_PATH`: Database file path, or `:memory:`

use std::env;
use std::rc::Rc;

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("unsupported driver: {0}. Supported: duckdb")]
    UnsupportedDriver(String),

    #[error("invalid connection string: {0}")]
    InvalidConfig(String),
}

/// Supported database drivers. DuckDB is the only backend today; the
/// variant exists so a second backend can be added without reshaping the
/// public API, mirroring how multi-dialect SQL generation elsewhere in this
/// crate keeps a `Dialect` enum even while one dialect dominates usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    DuckDb,
}

impl Driver {
    pub fn from_str(s: &str) -> Result<Self, ConnectionError> {
        match s.to_lowercase().as_str() {
            "duckdb" | "duck" => Ok(Driver::DuckDb),
            other => Err(ConnectionError::UnsupportedDriver(other.to_string())),
        }
    }
}

/// Dataset connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub driver: Driver,
    /// File path, or `:memory:`.
    pub path: String,
}

impl ConnectionConfig {
    pub fn duckdb(path: impl Into<String>) -> Self {
        Self {
            driver: Driver::DuckDb,
            path: path.into(),
        }
    }

    pub fn in_memory() -> Self {
        Self::duckdb(":memory:")
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConnectionError> {
        let driver_str = env::var("DQ_DB_DRIVER").unwrap_or_else(|_| "duckdb".to_string());
        let driver = Driver::from_str(&driver_str)?;
        let path = env::var("DQ_DB_PATH")
            .map_err(|_| ConnectionError::MissingEnvVar("DQ_DB_PATH".to_string()))?;
        Ok(Self { driver, path })
    }

    /// Parse a connection string of the form `duckdb:///path/to/db` or a
    /// bare file path (treated as DuckDB).
    pub fn parse(spec: &str) -> Result<Self, ConnectionError> {
        if let Some(rest) = spec.strip_prefix("duckdb://") {
            return Ok(Self::duckdb(rest));
        }
        if spec.contains("://") {
            return Err(ConnectionError::InvalidConfig(format!(
                "unrecognized connection string: {spec}"
            )));
        }
        Ok(Self::duckdb(spec))
    }
}

/// A handle to an open dataset connection, compared by identity rather than
/// by connection string: two handles opened from the same path are
/// different connections, and the planner needs to know whether the
/// executor's connection *is* the metadata repository's connection (so it
/// can materialize frequency tables as `TEMP` instead of durable tables).
#[derive(Clone)]
pub struct ConnectionHandle(pub Rc<duckdb::Connection>);

impl ConnectionHandle {
    pub fn open(config: &ConnectionConfig) -> Result<Self, duckdb::Error> {
        let conn = if config.path.is_empty() || config.path == ":memory:" {
            duckdb::Connection::open_in_memory()?
        } else {
            duckdb::Connection::open(&config.path)?
        };
        Ok(Self(Rc::new(conn)))
    }

    pub fn same_connection(&self, other: &ConnectionHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duckdb_url() {
        let config = ConnectionConfig::parse("duckdb:///tmp/data.duckdb").unwrap();
        assert_eq!(config.path, "/tmp/data.duckdb");
    }

    #[test]
    fn parses_bare_path_as_duckdb() {
        let config = ConnectionConfig::parse(":memory:").unwrap();
        assert_eq!(config.path, ":memory:");
    }

    #[test]
    fn same_connection_identity_not_string_equality() {
        let a = ConnectionHandle::open(&ConnectionConfig::in_memory()).unwrap();
        let b = ConnectionHandle::open(&ConnectionConfig::in_memory()).unwrap();
        assert!(a.same_connection(&a.clone()));
        assert!(!a.same_connection(&b));
    }
}
