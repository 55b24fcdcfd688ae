//! Banner endpoints. Reads are public; writes need an admin.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use document_store::DocumentStore;
use domain::{Banner, BannerDraft, BannerId};
use serde::Deserialize;

use crate::auth::Actor;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BannerRequest {
    #[serde(flatten)]
    pub draft: BannerDraft,
    /// Makes this the only active banner.
    #[serde(default)]
    pub active: bool,
}

/// GET /banners
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Banner>>, ApiError> {
    Ok(Json(state.banners.list_banners().await?))
}

/// GET /banners/active: `null` when no banner is active.
pub async fn active<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Option<Banner>>, ApiError> {
    Ok(Json(state.banners.active_banner().await?))
}

/// GET /banners/{id}
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<BannerId>,
) -> Result<Json<Banner>, ApiError> {
    Ok(Json(state.banners.get_banner(&id).await?))
}

/// PUT /banners: creates a banner with a generated id.
#[tracing::instrument(skip(state, actor, req))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Json(req): Json<BannerRequest>,
) -> Result<(StatusCode, Json<Banner>), ApiError> {
    let draft = BannerDraft { id: None, ..req.draft };
    let banner = state
        .banners
        .upsert_banner(&actor, draft, req.active)
        .await?;
    Ok((StatusCode::CREATED, Json(banner)))
}

/// PUT /banners/{id}: creates or replaces the banner with this id.
#[tracing::instrument(skip(state, actor, req))]
pub async fn upsert<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path(id): Path<BannerId>,
    Json(req): Json<BannerRequest>,
) -> Result<Json<Banner>, ApiError> {
    let draft = BannerDraft {
        id: Some(id),
        ..req.draft
    };
    let banner = state
        .banners
        .upsert_banner(&actor, draft, req.active)
        .await?;
    Ok(Json(banner))
}

/// DELETE /banners/{id}
#[tracing::instrument(skip(state, actor))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path(id): Path<BannerId>,
) -> Result<StatusCode, ApiError> {
    state.banners.delete_banner(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
