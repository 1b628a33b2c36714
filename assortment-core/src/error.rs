//! Assortment error types.
//!
//! Every hard failure has a named variant. Soft failures (a store with no
//! template, an empty swap pool) are not errors and never reach this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssortmentError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid template {template_id}: {reason}")]
    InvalidTemplate { template_id: String, reason: String },

    #[error("Duplicate template id: {0}")]
    DuplicateTemplate(String),

    #[error("Invalid store {store_id}: {reason}")]
    InvalidStore { store_id: String, reason: String },

    #[error("Unsupported store schema version: {0}")]
    UnsupportedSchemaVersion(u32),
}

impl AssortmentError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AssortmentError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for assortment operations.
pub type AssortmentResult<T> = Result<T, AssortmentError>;
