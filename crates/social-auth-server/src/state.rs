//! Shared application state.

use std::sync::Arc;

use anyhow::Context;
use social_auth::password::hash_password;
use social_auth::storage::SUPER_ADMIN_ID;
use social_auth::{HttpFileDownloader, User, UserFields, UserProvisioningService, UserStatus};
use social_auth_memory::{
    InMemoryIdentityLinkStorage, InMemorySessionRegistry, InMemoryUserStorage,
};

use crate::config::{AdminUserConfig, AppConfig};

/// Role given to the bootstrapped super-admin.
pub const ADMIN_ROLE: &str = "administrator";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<UserProvisioningService>,
    pub users: Arc<InMemoryUserStorage>,
    pub links: Arc<InMemoryIdentityLinkStorage>,
    pub sessions: Arc<InMemorySessionRegistry>,
}

impl AppState {
    /// Wires storages and the provisioning service from configuration.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let users = Arc::new(InMemoryUserStorage::new());
        let links = Arc::new(InMemoryIdentityLinkStorage::new());

        if let Some(admin) = &cfg.bootstrap.admin_user {
            seed_admin(&users, admin)?;
        }

        let mut service = UserProvisioningService::new(users.clone(), links.clone())
            .with_config(cfg.site.clone());

        if cfg.site.picture.enabled {
            let mut downloader = HttpFileDownloader::new(cfg.site.picture.download_timeout)
                .context("Failed to create picture downloader")?
                .with_max_size(cfg.site.picture.max_size);
            for scheme in &cfg.files.schemes {
                downloader = downloader.with_scheme(scheme.clone(), cfg.files.root.join(scheme));
            }
            service = service.with_file_downloader(Arc::new(downloader));
        }

        Ok(Self {
            config: Arc::new(cfg.clone()),
            service: Arc::new(service),
            users,
            links,
            sessions: Arc::new(InMemorySessionRegistry::new()),
        })
    }
}

fn seed_admin(users: &InMemoryUserStorage, admin: &AdminUserConfig) -> anyhow::Result<()> {
    let mut fields = UserFields::new(admin.username.clone(), "en")
        .with_mail(admin.email.clone())
        .with_status(UserStatus::Active);
    fields.roles.push(ADMIN_ROLE.to_string());

    if let Some(password) = &admin.password {
        let hash = hash_password(password)
            .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;
        fields = fields.with_pass(hash);
    }

    users
        .insert(User::from_fields(SUPER_ADMIN_ID, fields))
        .context("Failed to create admin user")?;

    tracing::info!(username = %admin.username, "Admin user created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_auth::UserStorage;

    #[tokio::test]
    async fn test_seeds_super_admin() {
        let mut cfg = AppConfig::default();
        cfg.bootstrap.admin_user = Some(AdminUserConfig {
            username: "admin".to_string(),
            password: None,
            email: Some("admin@example.com".to_string()),
        });

        let state = AppState::from_config(&cfg).unwrap();
        let admin = state.users.find_by_id(SUPER_ADMIN_ID).await.unwrap().unwrap();

        assert!(admin.is_super_admin());
        assert!(admin.has_role(ADMIN_ROLE));
        assert_eq!(admin.email.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn test_without_admin_storage_is_empty() {
        let state = AppState::from_config(&AppConfig::default()).unwrap();
        assert!(state.users.is_empty());
        assert!(state.sessions.is_empty());
    }
}
