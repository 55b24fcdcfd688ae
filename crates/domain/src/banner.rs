//! Promotional banners. At most one is active at any time.

use chrono::{DateTime, Utc};
use document_store::{
    DocumentQuery, DocumentStore, DocumentStoreExt, FieldUpdate, Filter, WriteBatch, WriteOp,
};
use serde::{Deserialize, Serialize};

use crate::{
    BannerId,
    collections::BANNERS,
    error::{DomainError, ValidationError},
    identity::Principal,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Where the banner links to.
    #[serde(default)]
    pub target: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Banner content submitted by an admin. A missing id creates a new banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BannerDraft {
    #[serde(default)]
    pub id: Option<BannerId>,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// Service for the banner workflow.
pub struct BannerService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> BannerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates or replaces a banner.
    ///
    /// With `make_active`, every other active banner is switched off in the
    /// same commit. The predicate is evaluated at commit time, so a banner
    /// activated concurrently does not survive either.
    #[tracing::instrument(skip(self, actor, draft), fields(actor = %actor.subject))]
    pub async fn upsert_banner(
        &self,
        actor: &Principal,
        draft: BannerDraft,
        make_active: bool,
    ) -> Result<Banner, DomainError> {
        actor.require_admin()?;
        if draft.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title").into());
        }
        let id = match draft.id {
            Some(id) if id.is_blank() => {
                return Err(ValidationError::InvalidIdentifier(id.to_string()).into());
            }
            Some(id) => id,
            None => BannerId::generate(),
        };

        let banner = Banner {
            id,
            title: draft.title,
            subtitle: draft.subtitle,
            image: draft.image,
            target: draft.target,
            is_active: make_active,
            updated_at: Utc::now(),
        };

        let mut batch = WriteBatch::new();
        if make_active {
            batch.push(WriteOp::update_where(
                DocumentQuery::new(BANNERS)
                    .where_eq("isActive", true)
                    .filter(Filter::ne("id", banner.id.as_str())),
                vec![
                    FieldUpdate::set("isActive", false),
                    FieldUpdate::commit_timestamp("updatedAt"),
                ],
            ));
        }
        batch.push(WriteOp::set_serialized(BANNERS.key(banner.id.clone()), &banner)?);

        self.store.commit(batch).await?;

        if make_active {
            metrics::counter!("banner_activations_total").increment(1);
        }
        tracing::info!(banner_id = %banner.id, active = make_active, "banner stored");
        Ok(banner)
    }

    /// Deletes a banner.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.subject))]
    pub async fn delete_banner(
        &self,
        actor: &Principal,
        banner_id: &BannerId,
    ) -> Result<(), DomainError> {
        actor.require_admin()?;
        let key = BANNERS.key(banner_id.clone());
        if !self.store.exists(&key).await? {
            return Err(DomainError::not_found("Banner", banner_id));
        }

        self.store.commit_op(WriteOp::delete(key)).await?;
        tracing::info!(%banner_id, "banner deleted");
        Ok(())
    }

    pub async fn get_banner(&self, banner_id: &BannerId) -> Result<Banner, DomainError> {
        self.store
            .get_decoded::<Banner>(&BANNERS.key(banner_id.clone()))
            .await?
            .map(|(banner, _)| banner)
            .ok_or_else(|| DomainError::not_found("Banner", banner_id))
    }

    /// Lists every banner, oldest first.
    pub async fn list_banners(&self) -> Result<Vec<Banner>, DomainError> {
        Ok(self.store.query_decoded(DocumentQuery::new(BANNERS)).await?)
    }

    /// Returns the active banner, if any.
    pub async fn active_banner(&self) -> Result<Option<Banner>, DomainError> {
        let mut active: Vec<Banner> = self
            .store
            .query_decoded(DocumentQuery::new(BANNERS).where_eq("isActive", true))
            .await?;
        Ok(active.pop())
    }
}
