//! Domain error types.

use document_store::DocumentStoreError;
use thiserror::Error;

/// Rejections caused by the caller's input or by the current state of a record.
///
/// These are surfaced to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid cart: {0}")]
    InvalidCart(String),

    #[error("no active shop can be determined for this order")]
    NoActiveShop,

    #[error("unknown status value: {0}")]
    InvalidStatus(String),

    #[error("illegal status transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    #[error("unknown product: {0}")]
    UnknownProduct(String),

    #[error("invalid adjustment: {0}")]
    InvalidAdjustment(String),

    #[error("already connected to shop {shop_id} ({status})")]
    AlreadyConnected { shop_id: String, status: String },

    #[error("shop {0} is online and accepts orders without a connection")]
    ConnectionNotRequired(String),

    #[error("shop {0} is not accepting requests")]
    ShopUnavailable(String),

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request was rejected by a domain rule.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The actor may not perform this operation. Carries no detail on purpose.
    #[error("Unauthorized")]
    Unauthorized,

    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A commit-time precondition failed; the record changed since it was read.
    #[error("Conflict on {key}")]
    Conflict { key: String },

    /// The store could not commit the batch.
    #[error("Batch commit failed: {0}")]
    BatchCommit(DocumentStoreError),

    /// A stored document could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<DocumentStoreError> for DomainError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::PreconditionFailed { key, .. } => DomainError::Conflict {
                key: key.to_string(),
            },
            DocumentStoreError::Serialization(e) => DomainError::Serialization(e),
            other => DomainError::BatchCommit(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_store::{Collection, Precondition};

    #[test]
    fn precondition_failure_maps_to_conflict() {
        let err: DomainError = DocumentStoreError::PreconditionFailed {
            key: Collection::new("orders").key("o1"),
            precondition: Precondition::Exists,
            actual: None,
        }
        .into();

        assert!(matches!(err, DomainError::Conflict { ref key } if key == "orders/o1"));
    }

    #[test]
    fn other_store_errors_map_to_batch_commit() {
        let err: DomainError = DocumentStoreError::InvalidBatch("empty".to_string()).into();
        assert!(matches!(err, DomainError::BatchCommit(_)));
    }

    #[test]
    fn validation_messages_are_readable() {
        let err = DomainError::from(ValidationError::IllegalTransition {
            from: "Delivered".to_string(),
            to: "Pending".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Validation error: illegal status transition from Delivered to Pending"
        );
    }
}
