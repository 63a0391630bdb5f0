//! Error types for sqlchain

use thiserror::Error;

/// The main error type for sqlchain operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Impossible argument combination passed to a builder method
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Lookup of a column that the row does not carry
    #[error("No column '{column}' in row")]
    ColumnNotFound { column: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure reported by a non-sqlx executor
    #[error("Execution error: {message}")]
    Execution { message: String },
}

/// Convenience Result type for sqlchain operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new column not found error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Create a new execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_error() {
        let err = Error::invalid_argument("A value must be provided");
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert_eq!(err.to_string(), "Invalid argument: A value must be provided");
    }

    #[test]
    fn test_column_not_found_error() {
        let err = Error::column_not_found("aggregate");
        assert!(matches!(err, Error::ColumnNotFound { .. }));
        assert_eq!(err.to_string(), "No column 'aggregate' in row");
    }

    #[test]
    fn test_execution_error() {
        let err = Error::execution("connection reset");
        assert!(matches!(err, Error::Execution { .. }));
        assert_eq!(err.to_string(), "Execution error: connection reset");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
