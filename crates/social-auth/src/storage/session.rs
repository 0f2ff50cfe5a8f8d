//! Session storage and login finalization.
//!
//! [`SessionStore`] is the per-request session. [`SessionDataHandler`] scopes
//! keys to a provider integration by prefixing them with its plugin id, so
//! two providers never clobber each other's state.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::user::User;
use crate::AuthResult;

/// Session key holding the id of the logged-in user.
pub const SESSION_UID_KEY: &str = "uid";

/// Session key holding the unix timestamp of the last login.
pub const SESSION_LOGIN_TIME_KEY: &str = "login_timestamp";

/// A key/value session bound to one browser session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a session value.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails.
    async fn get(&self, key: &str) -> AuthResult<Option<serde_json::Value>>;

    /// Write a session value. `None` clears the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails.
    async fn set(&self, key: &str, value: Option<serde_json::Value>) -> AuthResult<()>;
}

/// Session access scoped to a plugin id.
#[derive(Clone)]
pub struct SessionDataHandler {
    session: Arc<dyn SessionStore>,
    prefix: String,
}

impl SessionDataHandler {
    /// Creates a handler that prefixes every key with `prefix`.
    pub fn new(session: Arc<dyn SessionStore>, prefix: impl Into<String>) -> Self {
        Self {
            session,
            prefix: prefix.into(),
        }
    }

    /// Returns the key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the underlying unprefixed session.
    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Returns the prefixed form of `key`.
    #[must_use]
    pub fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Read a prefixed session value.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails.
    pub async fn get(&self, key: &str) -> AuthResult<Option<serde_json::Value>> {
        self.session.get(&self.prefixed(key)).await
    }

    /// Write a prefixed session value.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails.
    pub async fn set(&self, key: &str, value: Option<serde_json::Value>) -> AuthResult<()> {
        self.session.set(&self.prefixed(key), value).await
    }
}

impl std::fmt::Debug for SessionDataHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDataHandler")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Completes a login once the account has passed every check.
#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    /// Bind `user` to `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be updated.
    async fn finalize_login(&self, session: &dyn SessionStore, user: &User) -> AuthResult<()>;
}

/// Authenticator that records the user id and login time in the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionUidAuthenticator;

#[async_trait]
impl SessionAuthenticator for SessionUidAuthenticator {
    async fn finalize_login(&self, session: &dyn SessionStore, user: &User) -> AuthResult<()> {
        session
            .set(SESSION_UID_KEY, Some(serde_json::json!(user.id)))
            .await?;
        session
            .set(
                SESSION_LOGIN_TIME_KEY,
                Some(serde_json::json!(OffsetDateTime::now_utc().unix_timestamp())),
            )
            .await?;
        tracing::debug!(user_id = %user.id, "Session bound to user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::user::{UserFields, UserStatus};
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Mock session for testing.
    #[derive(Default)]
    struct MockSession {
        values: RwLock<HashMap<String, serde_json::Value>>,
    }

    #[async_trait]
    impl SessionStore for MockSession {
        async fn get(&self, key: &str) -> AuthResult<Option<serde_json::Value>> {
            Ok(self.values.read().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: Option<serde_json::Value>) -> AuthResult<()> {
            let mut values = self.values.write().unwrap();
            match value {
                Some(v) => values.insert(key.to_string(), v),
                None => values.remove(key),
            };
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_data_handler_prefixes_keys() {
        let session = Arc::new(MockSession::default());
        let handler = SessionDataHandler::new(session.clone(), "social_auth_google");

        handler
            .set("access_token", Some(serde_json::json!("abc")))
            .await
            .unwrap();

        assert!(session.get("access_token").await.unwrap().is_none());
        assert_eq!(
            session.get("social_auth_googleaccess_token").await.unwrap(),
            Some(serde_json::json!("abc"))
        );
        assert_eq!(
            handler.get("access_token").await.unwrap(),
            Some(serde_json::json!("abc"))
        );

        handler.set("access_token", None).await.unwrap();
        assert!(handler.get("access_token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_uid_authenticator_binds_user() {
        let session = MockSession::default();
        let user = User::from_fields(
            "42",
            UserFields::new("janedoe", "en").with_status(UserStatus::Active),
        );

        SessionUidAuthenticator
            .finalize_login(&session, &user)
            .await
            .unwrap();

        assert_eq!(
            session.get(SESSION_UID_KEY).await.unwrap(),
            Some(serde_json::json!("42"))
        );
        assert!(session.get(SESSION_LOGIN_TIME_KEY).await.unwrap().is_some());
    }
}
