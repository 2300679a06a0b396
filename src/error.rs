//! Error types for type and sample generation

use thiserror::Error;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, TypegenError>;

/// Generation errors.
///
/// Everything except `Io` and `Json` on the input document is recoverable:
/// the driver logs the failure for the affected schema and keeps going.
#[derive(Error, Debug)]
pub enum TypegenError {
    #[error("Reference not found: {reference}")]
    ReferenceNotFound { reference: String },

    #[error("Structural cycle through reference: {reference}")]
    StructuralCycle { reference: String },

    #[error("Schema not found in document: {name}")]
    SchemaNotFound { name: String },

    #[error("Union member {index} of {union} matched no classification rule")]
    UnclassifiableVariant { union: String, index: usize },

    #[error("Sample validation exhausted after {attempts} attempts for {schema}: {last_error}")]
    ValidationExhausted {
        schema: String,
        attempts: usize,
        last_error: String,
    },

    #[error("Schema compilation failed for {schema}: {message}")]
    SchemaCompile { schema: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
