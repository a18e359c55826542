//! Error types for fluentq

use thiserror::Error;

/// Result type alias for mapper operations
pub type MapperResult<T> = Result<T, MapperError>;

/// Error types for condition building and dispatch
#[derive(Debug, Error)]
pub enum MapperError {
    /// Required input is missing or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A feature was invoked while its configuration flag is disabled
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Schema resolution or entity field access failure
    #[error("Schema error: {0}")]
    Schema(String),

    /// Execution collaborator failure
    #[error("Execution error: {0}")]
    Execution(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl MapperError {
    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a schema resolution error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is an invalid-argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a schema resolution error
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
