//! Identity link storage.
//!
//! An identity link associates an account on an external provider with a
//! local user. Links are keyed by `(plugin_id, provider_user_id)`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;

/// A persisted link between a provider identity and a local user.
///
/// Links are never updated in place; linking again creates a new record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityLink {
    /// Unique id of the link record.
    pub id: String,

    /// Id of the local user.
    pub user_id: String,

    /// The provider integration that created the link (e.g. "social_auth_google").
    pub plugin_id: String,

    /// The user's id on the provider.
    pub provider_user_id: String,

    /// Access token for further provider API calls.
    pub token: String,

    /// Additional provider data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<serde_json::Value>,

    /// When this link was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl IdentityLink {
    /// Creates a new link record.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        plugin_id: impl Into<String>,
        provider_user_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            plugin_id: plugin_id.into(),
            provider_user_id: provider_user_id.into(),
            token: token.into(),
            additional_data: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Sets the additional provider data.
    #[must_use]
    pub fn with_additional_data(mut self, data: Option<serde_json::Value>) -> Self {
        self.additional_data = data;
        self
    }

    /// Checks if this link matches the given plugin and provider user.
    #[must_use]
    pub fn matches(&self, plugin_id: &str, provider_user_id: &str) -> bool {
        self.plugin_id == plugin_id && self.provider_user_id == provider_user_id
    }
}

/// Storage operations for identity links.
#[async_trait]
pub trait IdentityLinkStorage: Send + Sync {
    /// Find the link for a provider identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_provider_user_id(
        &self,
        plugin_id: &str,
        provider_user_id: &str,
    ) -> AuthResult<Option<IdentityLink>>;

    /// Persist a new link.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A link for the same `(plugin_id, provider_user_id)` already exists
    /// - The storage operation fails
    async fn create(&self, link: &IdentityLink) -> AuthResult<()>;

    /// Returns the local user id linked to a provider identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_user_id(
        &self,
        plugin_id: &str,
        provider_user_id: &str,
    ) -> AuthResult<Option<String>> {
        Ok(self
            .find_by_provider_user_id(plugin_id, provider_user_id)
            .await?
            .map(|link| link.user_id))
    }
}
