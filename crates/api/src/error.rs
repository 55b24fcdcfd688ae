//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ValidationError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or unknown bearer token.
    Unauthenticated,
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "missing or invalid bearer token".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Validation(validation) => (validation_status(validation), err.to_string()),
        DomainError::Unauthorized => (StatusCode::FORBIDDEN, "forbidden".to_string()),
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::Conflict { .. } => (StatusCode::CONFLICT, err.to_string()),
        DomainError::BatchCommit(_) => {
            tracing::warn!(error = %err, "store unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        DomainError::Serialization(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

/// Malformed input is 400; input that is well-formed but conflicts with the
/// current state of a record is 422.
fn validation_status(err: &ValidationError) -> StatusCode {
    match err {
        ValidationError::NoActiveShop
        | ValidationError::IllegalTransition { .. }
        | ValidationError::InsufficientStock { .. }
        | ValidationError::AlreadyConnected { .. }
        | ValidationError::ConnectionNotRequired(_)
        | ValidationError::ShopUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ValidationError::InvalidCart(_)
        | ValidationError::InvalidStatus(_)
        | ValidationError::InvalidQuantity(_)
        | ValidationError::UnknownProduct(_)
        | ValidationError::InvalidAdjustment(_)
        | ValidationError::InvalidIdentifier(_)
        | ValidationError::MissingField(_) => StatusCode::BAD_REQUEST,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn maps_domain_errors() {
        assert_eq!(status_of(DomainError::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(DomainError::Conflict {
                key: "orders/o1".to_string()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ValidationError::InvalidStatus("x".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                ValidationError::IllegalTransition {
                    from: "Delivered".to_string(),
                    to: "Pending".to_string(),
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
