//! Error types for text index operations

use thiserror::Error;

/// Result type alias for TextLite operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in text index operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid analyzer or builder configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unsupported stemmer language code
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Field name not declared in the schema
    #[error("Field not found in schema: {0}")]
    FieldNotFound(String),

    /// Field exists but cannot be used for the requested operation
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Malformed document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Ingestion batch exceeds the configured byte budget
    #[error("Batch of {got} bytes exceeds budget of {budget} bytes")]
    BudgetExceeded { got: u64, budget: u64 },

    /// Unparsable query string or structured query
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Index operation failed in the underlying engine
    #[error("Index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Misuse of a handle or result index at the boundary
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::InvalidOperation(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::InvalidOperation(s.to_string())
    }
}

impl From<tantivy::query::QueryParserError> for Error {
    fn from(err: tantivy::query::QueryParserError) -> Self {
        Error::InvalidQuery(err.to_string())
    }
}

impl From<tantivy::directory::error::OpenDirectoryError> for Error {
    fn from(err: tantivy::directory::error::OpenDirectoryError) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
