//! Error types for the zdao DAO layer.
//!
//! All public APIs return `DaoResult<T>`; library code never panics.
//! Backend clients report [`BackendError`]; the DAO boundary classifies
//! those into [`DaoError`] through [`crate::translate`].

use std::fmt;
use thiserror::Error;

/// Boxed driver-native cause carried by backend errors.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Category of a remote call failure, one per backend dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Mysql,
    Oracle,
    Search,
    WideColumn,
    /// Cause could not be attributed to a known backend
    Generic,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallKind::Mysql => "mysql",
            CallKind::Oracle => "oracle",
            CallKind::Search => "search",
            CallKind::WideColumn => "wide-column",
            CallKind::Generic => "remote",
        };
        f.write_str(name)
    }
}

/// Unified error type for all DAO operations.
#[derive(Debug, Error)]
pub enum DaoError {
    /// Caller input rejected before any backend call
    #[error("invalid argument '{param}': {message}")]
    InvalidArgument { param: String, message: String },

    /// Malformed entity metadata or settings, raised at DAO construction
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backend variant does not provide this operation
    #[error("{dao} does not support {operation}")]
    Unsupported {
        dao: &'static str,
        operation: &'static str,
    },

    /// Classified backend failure
    #[error("{kind} call failed: {message}")]
    RemoteCall {
        kind: CallKind,
        message: String,
        #[source]
        source: BackendError,
    },

    /// Unique constraint or primary key collision on insert
    #[error("unique constraint violation: {message}")]
    UniqueConstraint {
        message: String,
        #[source]
        source: BackendError,
    },

    /// Optimistic version check lost
    #[error("version conflict on id '{id}': {message}")]
    VersionConflict {
        id: String,
        message: String,
        #[source]
        source: BackendError,
    },

    /// Unbounded request whose true size exceeds the representable window
    #[error("query overload rejected: {0}")]
    Overload(String),

    /// Value shape or conversion mismatch
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DaoError {
    pub fn invalid_argument(param: impl Into<String>, message: impl Into<String>) -> Self {
        DaoError::InvalidArgument {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(dao: &'static str, operation: &'static str) -> Self {
        DaoError::Unsupported { dao, operation }
    }

    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        DaoError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type alias for all DAO operations.
pub type DaoResult<T> = Result<T, DaoError>;

impl From<serde_json::Error> for DaoError {
    fn from(err: serde_json::Error) -> Self {
        DaoError::Serialization(err.to_string())
    }
}

/// What went wrong inside a backend client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    DuplicateKey,
    VersionConflict,
    /// Engine refused a from+size window beyond its limit
    ResultWindowTooLarge,
    Connection,
    Other,
}

/// Error reported by backend client handles (executors, sessions, clients).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
    #[source]
    pub source: Option<BoxedCause>,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, message)
    }

    pub fn with_source(mut self, source: impl Into<BoxedCause>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Result type for backend client calls.
pub type BackendResult<T> = Result<T, BackendError>;
