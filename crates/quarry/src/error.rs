//! Error types for quarry

use thiserror::Error;

/// Result type alias for quarry operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Contract violations detected while a builder is being assembled.
///
/// These are recorded on the builder during fluent chaining and surfaced by
/// [`Builder::validate`](crate::Builder::validate) before anything is compiled
/// for execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// An empty value was paired with an operator that needs one.
    #[error("Illegal operator and value combination: '{operator}'")]
    IllegalOperatorAndValue { operator: String },

    /// A binding category outside `select, join, where, having, order, union`.
    #[error("Invalid binding type: {0}")]
    InvalidBindingType(String),
}

/// Error types for query building and execution
#[derive(Debug, Error)]
pub enum QueryError {
    /// Builder contract violation
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The builder has no connection to run against
    #[error("No connection: {0}")]
    NoConnection(String),

    /// A paging helper was used without an ORDER BY clause
    #[error("You must specify an order_by clause when using {0}")]
    MissingOrderBy(&'static str),

    /// Error reported by the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QueryError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Check if this is a builder contract error
    pub fn is_build_error(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Check if this is a missing ORDER BY error
    pub fn is_missing_order_by(&self) -> bool {
        matches!(self, Self::MissingOrderBy(_))
    }
}
