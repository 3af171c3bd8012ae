//! Error types for the verification engine.

use thiserror::Error;

/// Errors that can occur while planning, executing, or evaluating a
/// verification run.
#[derive(Debug, Error)]
pub enum DqError {
    #[error("unsupported property: {0}")]
    UnsupportedProperty(String),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern { pattern: String, source: String },

    #[error("unknown operator type: {0}")]
    UnknownOperatorType(String),

    #[error("unsupported connection object: {0}")]
    UnsupportedConnectionObject(String),

    #[error("state handler does not support state {state_kind} for property {property}")]
    StateHandlerUnsupportedState {
        state_kind: String,
        property: String,
    },

    #[error("cannot merge states for property {property}: {reason}")]
    StateMerging { property: String, reason: String },

    #[error("constraint assertion failed: {0}")]
    ConstraintAssertion(String),

    #[error("data quality error: {0}")]
    DataQuality(String),

    #[error(transparent)]
    Connection(#[from] crate::connection::ConnectionError),

    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sketch encoding error: {0}")]
    SketchEncoding(#[from] Box<bincode::ErrorKind>),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DqResult<T> = Result<T, DqError>;
