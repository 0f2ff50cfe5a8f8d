//! In-memory identity link storage.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use social_auth::storage::{IdentityLink, IdentityLinkStorage};
use social_auth::{AuthError, AuthResult};

type LinkKey = (String, String);

/// Identity links keyed by `(plugin_id, provider_user_id)`.
#[derive(Debug, Default)]
pub struct InMemoryIdentityLinkStorage {
    links: DashMap<LinkKey, IdentityLink>,
}

impl InMemoryIdentityLinkStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every link of a local account.
    pub fn links_for_user(&self, user_id: &str) -> Vec<IdentityLink> {
        let mut links: Vec<IdentityLink> = self
            .links
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        links.sort_by_key(|link| link.created_at);
        links
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if no links are stored.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl IdentityLinkStorage for InMemoryIdentityLinkStorage {
    async fn find_by_provider_user_id(
        &self,
        plugin_id: &str,
        provider_user_id: &str,
    ) -> AuthResult<Option<IdentityLink>> {
        let key = (plugin_id.to_string(), provider_user_id.to_string());
        Ok(self.links.get(&key).map(|link| link.clone()))
    }

    async fn create(&self, link: &IdentityLink) -> AuthResult<()> {
        let key = (link.plugin_id.clone(), link.provider_user_id.clone());
        match self.links.entry(key) {
            Entry::Occupied(_) => Err(AuthError::conflict(format!(
                "Identity {}:{} is already linked",
                link.plugin_id, link.provider_user_id
            ))),
            Entry::Vacant(v) => {
                v.insert(link.clone());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find() {
        let storage = InMemoryIdentityLinkStorage::new();
        storage
            .create(&IdentityLink::new("7", "social_auth_google", "123", "t"))
            .await
            .unwrap();

        assert_eq!(
            storage
                .find_user_id("social_auth_google", "123")
                .await
                .unwrap()
                .as_deref(),
            Some("7")
        );
        assert!(
            storage
                .find_user_id("social_auth_github", "123")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_one_link_per_identity() {
        let storage = InMemoryIdentityLinkStorage::new();
        storage
            .create(&IdentityLink::new("7", "social_auth_google", "123", "t"))
            .await
            .unwrap();

        let err = storage
            .create(&IdentityLink::new("8", "social_auth_google", "123", "t"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_links_for_user() {
        let storage = InMemoryIdentityLinkStorage::new();
        storage
            .create(&IdentityLink::new("7", "social_auth_google", "1", "t"))
            .await
            .unwrap();
        storage
            .create(&IdentityLink::new("7", "social_auth_github", "2", "t"))
            .await
            .unwrap();
        storage
            .create(&IdentityLink::new("8", "social_auth_github", "3", "t"))
            .await
            .unwrap();

        assert_eq!(storage.links_for_user("7").len(), 2);
        assert!(storage.links_for_user("9").is_empty());
    }
}
