//! Principals, roles and the resolver seam that produces them.
//!
//! Authentication happens elsewhere; by the time a request reaches the
//! domain it carries an opaque token that a [`PrincipalResolver`] maps to a
//! [`Principal`]. Every authorization decision in the crate goes through the
//! `require_*` helpers here so that a denial never leaks which check failed.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{CustomerId, ShopId, error::DomainError};

/// Tenant-scoped role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Owner,
    Staff,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::Staff => "staff",
            Role::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated actor.
///
/// `shop_id` is the tenant the role applies to. Owners and staff always carry
/// one; an admin without a shop is platform-wide and may act on any shop the
/// request explicitly scopes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub subject: String,
    pub role: Role,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
}

impl Principal {
    pub fn admin(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: Role::Admin,
            shop_id: None,
        }
    }

    pub fn scoped_admin(subject: impl Into<String>, shop_id: impl Into<ShopId>) -> Self {
        Self {
            subject: subject.into(),
            role: Role::Admin,
            shop_id: Some(shop_id.into()),
        }
    }

    pub fn owner(subject: impl Into<String>, shop_id: impl Into<ShopId>) -> Self {
        Self {
            subject: subject.into(),
            role: Role::Owner,
            shop_id: Some(shop_id.into()),
        }
    }

    pub fn staff(subject: impl Into<String>, shop_id: impl Into<ShopId>) -> Self {
        Self {
            subject: subject.into(),
            role: Role::Staff,
            shop_id: Some(shop_id.into()),
        }
    }

    pub fn customer(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: Role::Customer,
            shop_id: None,
        }
    }

    /// Returns true if this principal may manage orders of `shop_id`.
    pub fn can_manage_shop(&self, shop_id: &ShopId) -> bool {
        match self.role {
            Role::Owner | Role::Staff => self.shop_id.as_ref() == Some(shop_id),
            Role::Admin => self.admin_covers(shop_id),
            Role::Customer => false,
        }
    }

    /// Returns true if this principal may act as the owner of `shop_id`.
    pub fn can_own_shop(&self, shop_id: &ShopId) -> bool {
        match self.role {
            Role::Owner => self.shop_id.as_ref() == Some(shop_id),
            Role::Admin => self.admin_covers(shop_id),
            Role::Staff | Role::Customer => false,
        }
    }

    /// Returns true if this principal is the customer `customer_id`.
    pub fn is_customer(&self, customer_id: &CustomerId) -> bool {
        self.role == Role::Customer && self.subject == customer_id.as_str()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    fn admin_covers(&self, shop_id: &ShopId) -> bool {
        self.shop_id.as_ref().is_none_or(|scope| scope == shop_id)
    }

    pub(crate) fn require_shop_manager(&self, shop_id: &ShopId) -> Result<(), DomainError> {
        require(self.can_manage_shop(shop_id))
    }

    pub(crate) fn require_shop_owner(&self, shop_id: &ShopId) -> Result<(), DomainError> {
        require(self.can_own_shop(shop_id))
    }

    pub(crate) fn require_admin(&self) -> Result<(), DomainError> {
        require(self.is_admin())
    }

    /// Returns the customer id this principal acts as.
    pub(crate) fn require_customer(&self) -> Result<CustomerId, DomainError> {
        require(self.role == Role::Customer && !self.subject.trim().is_empty())?;
        Ok(CustomerId::new(self.subject.clone()))
    }
}

fn require(allowed: bool) -> Result<(), DomainError> {
    if allowed {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}

/// Maps an opaque bearer token to the principal it was issued to.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// Returns None if the token is unknown.
    async fn resolve(&self, token: &str) -> Result<Option<Principal>, DomainError>;
}

/// Resolver backed by a fixed token table.
///
/// Used by tests and by the server binary when it is given a token file.
#[derive(Debug, Clone, Default)]
pub struct StaticPrincipalResolver {
    principals: HashMap<String, Principal>,
}

impl StaticPrincipalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token, replacing any previous principal it mapped to.
    pub fn with(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.principals.insert(token.into(), principal);
        self
    }

    /// Parses a JSON object of `token -> principal`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let principals: HashMap<String, Principal> = serde_json::from_str(json)?;
        Ok(Self { principals })
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

#[async_trait]
impl PrincipalResolver for StaticPrincipalResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Principal>, DomainError> {
        Ok(self.principals.get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(id: &str) -> ShopId {
        ShopId::new(id)
    }

    #[test]
    fn owner_and_staff_manage_only_their_shop() {
        let owner = Principal::owner("u1", "s1");
        let staff = Principal::staff("u2", "s1");

        assert!(owner.can_manage_shop(&shop("s1")));
        assert!(staff.can_manage_shop(&shop("s1")));
        assert!(!owner.can_manage_shop(&shop("s2")));
        assert!(!staff.can_manage_shop(&shop("s2")));
    }

    #[test]
    fn staff_cannot_act_as_owner() {
        let staff = Principal::staff("u2", "s1");
        assert!(!staff.can_own_shop(&shop("s1")));
        assert!(Principal::owner("u1", "s1").can_own_shop(&shop("s1")));
    }

    #[test]
    fn admin_scope() {
        let platform = Principal::admin("root");
        let scoped = Principal::scoped_admin("ops", "s1");

        assert!(platform.can_manage_shop(&shop("s9")));
        assert!(scoped.can_manage_shop(&shop("s1")));
        assert!(!scoped.can_manage_shop(&shop("s2")));
    }

    #[test]
    fn customer_cannot_manage_shops() {
        let customer = Principal::customer("c1");
        assert!(!customer.can_manage_shop(&shop("s1")));
        assert!(customer.is_customer(&CustomerId::new("c1")));
        assert!(!customer.is_customer(&CustomerId::new("c2")));
        assert!(matches!(
            Principal::owner("u1", "s1").require_customer(),
            Err(DomainError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn static_resolver_from_json() {
        let resolver = StaticPrincipalResolver::from_json(
            r#"{
                "t-owner": {"subject": "u1", "role": "owner", "shopId": "s1"},
                "t-customer": {"subject": "c1", "role": "customer"}
            }"#,
        )
        .unwrap();

        assert_eq!(resolver.len(), 2);
        let owner = resolver.resolve("t-owner").await.unwrap().unwrap();
        assert_eq!(owner, Principal::owner("u1", "s1"));
        assert!(resolver.resolve("nope").await.unwrap().is_none());
    }
}
