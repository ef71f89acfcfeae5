//! Error types for tabular schemas.
//!
//! These are the *fatal* conditions: a schema that references unknown
//! fields, a field type that cannot be resolved, a check that cannot be
//! configured, or a source that cannot be read. Per-row problems are never
//! represented here; they are reported as data by the validator.

use thiserror::Error;

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Main error type for table operations.
#[derive(Error, Debug)]
pub enum TableError {
    /// Schema definition is not valid
    #[error("Schema error: {0}")]
    Schema(String),

    /// Field definition is not valid
    #[error("Field error: {0}")]
    Field(String),

    /// A check cannot be configured for this table
    #[error("Check error: {0}")]
    Check(String),

    /// Data source cannot be opened or read
    #[error("Source error: {0}")]
    Source(String),

    /// Resource cannot be resolved (e.g. a foreign key reference)
    #[error("Resource error: {0}")]
    Resource(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    General(String),
}

impl TableError {
    /// Creates a new schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Creates a new field error.
    pub fn field(message: impl Into<String>) -> Self {
        Self::Field(message.into())
    }

    /// Creates a new check error.
    pub fn check(message: impl Into<String>) -> Self {
        Self::Check(message.into())
    }

    /// Creates a new source error.
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Creates a new resource error.
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource(message.into())
    }

    /// Creates a new generic error.
    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }

    /// Stable error code used when this error is reported as a task error.
    pub fn code(&self) -> &'static str {
        match self {
            TableError::Schema(_) => "schema-error",
            TableError::Field(_) => "field-error",
            TableError::Check(_) => "check-error",
            TableError::Source(_) => "source-error",
            TableError::Resource(_) => "resource-error",
            TableError::Serialization(_) | TableError::General(_) => "general-error",
        }
    }

    /// The instance-specific detail without the category prefix.
    pub fn note(&self) -> String {
        match self {
            TableError::Schema(note)
            | TableError::Field(note)
            | TableError::Check(note)
            | TableError::Source(note)
            | TableError::Resource(note)
            | TableError::General(note) => note.clone(),
            TableError::Serialization(err) => err.to_string(),
        }
    }
}
