use thiserror::Error;

use crate::{DocumentKey, Precondition, Version};

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// A precondition attached to a write did not hold at commit time.
    /// Nothing in the batch was applied.
    #[error("Precondition {precondition} failed for {key}: current version {actual:?}")]
    PreconditionFailed {
        key: DocumentKey,
        precondition: Precondition,
        actual: Option<Version>,
    },

    /// A field update targeted a document that does not exist.
    #[error("Document not found: {0}")]
    NotFound(DocumentKey),

    /// The batch was rejected before anything was applied.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// A field path crossed a value that is not an object.
    #[error("Field path '{path}' does not address an object field in {key}")]
    FieldTypeMismatch { key: DocumentKey, path: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocumentStoreError {
    /// Returns true if the failure came from the caller's view of the data
    /// being stale rather than from the store itself.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DocumentStoreError::PreconditionFailed { .. })
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocumentStoreError>;
