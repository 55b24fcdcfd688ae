//! Bearer-token authentication.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use document_store::DocumentStore;
use domain::Principal;

use crate::error::ApiError;
use crate::state::AppState;

/// The principal behind the request's `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct Actor(pub Principal);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<Arc<AppState<S>>> for Actor
where
    S: DocumentStore + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            metrics::counter!("auth_rejections_total", "reason" => "missing").increment(1);
            return Err(ApiError::Unauthenticated);
        };
        let Some(principal) = state.resolver.resolve(token).await? else {
            metrics::counter!("auth_rejections_total", "reason" => "unknown").increment(1);
            return Err(ApiError::Unauthenticated);
        };

        tracing::debug!(
            subject = %principal.subject,
            role = %principal.role,
            "request authenticated"
        );
        Ok(Actor(principal))
    }
}
