//! Per-request provisioning state.

use std::sync::Arc;

use crate::AuthResult;
use crate::storage::{SessionDataHandler, SessionStore};

/// Session key holding the path to return to after login.
pub const LOGIN_DESTINATION_KEY: &str = "login_destination";

/// Default interface language.
pub const DEFAULT_LANGCODE: &str = "en";

/// State for one authentication attempt.
///
/// Session keys are scoped to the plugin id, so a context for
/// `social_auth_google` reads and writes `social_auth_google{key}`.
#[derive(Debug, Clone)]
pub struct ProvisioningContext {
    plugin_id: String,
    data_handler: SessionDataHandler,
    session_keys: Vec<String>,
    current_user_id: Option<String>,
    langcode: String,
}

impl ProvisioningContext {
    /// Creates a context for `plugin_id` bound to `session`.
    pub fn new(plugin_id: impl Into<String>, session: Arc<dyn SessionStore>) -> Self {
        let plugin_id = plugin_id.into();
        Self {
            data_handler: SessionDataHandler::new(session, plugin_id.clone()),
            plugin_id,
            session_keys: Vec::new(),
            current_user_id: None,
            langcode: DEFAULT_LANGCODE.to_string(),
        }
    }

    /// Sets the session keys to clear when authentication fails.
    #[must_use]
    pub fn with_session_keys_to_nullify(mut self, keys: Vec<String>) -> Self {
        self.session_keys = keys;
        self
    }

    /// Marks the request as coming from an already logged-in account.
    #[must_use]
    pub fn with_current_user(mut self, user_id: Option<String>) -> Self {
        self.current_user_id = user_id.filter(|id| !id.is_empty());
        self
    }

    /// Sets the current interface language.
    #[must_use]
    pub fn with_langcode(mut self, langcode: impl Into<String>) -> Self {
        self.langcode = langcode.into();
        self
    }

    /// Returns the provider integration id.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Returns the logged-in account id, if any.
    #[must_use]
    pub fn current_user_id(&self) -> Option<&str> {
        self.current_user_id.as_deref()
    }

    /// Returns the current interface language.
    #[must_use]
    pub fn langcode(&self) -> &str {
        &self.langcode
    }

    /// Returns the keys cleared on failure.
    #[must_use]
    pub fn session_keys_to_nullify(&self) -> &[String] {
        &self.session_keys
    }

    /// Returns the plugin-scoped session.
    #[must_use]
    pub fn data_handler(&self) -> &SessionDataHandler {
        &self.data_handler
    }

    /// Returns the underlying session.
    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        self.data_handler.session()
    }

    /// Stores the path to return to after login.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails.
    pub async fn set_destination(&self, destination: impl Into<String>) -> AuthResult<()> {
        self.data_handler
            .set(
                LOGIN_DESTINATION_KEY,
                Some(serde_json::Value::String(destination.into())),
            )
            .await
    }

    /// Removes and returns the stored destination.
    ///
    /// Empty values count as no destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails.
    pub async fn take_destination(&self) -> AuthResult<Option<String>> {
        let destination = self.data_handler.get(LOGIN_DESTINATION_KEY).await?;
        let destination = match destination {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            _ => return Ok(None),
        };
        self.data_handler.set(LOGIN_DESTINATION_KEY, None).await?;
        Ok(Some(destination))
    }

    /// Sets every configured session key to null.
    ///
    /// Failures are logged; clearing continues with the next key.
    pub async fn nullify_session_keys(&self) {
        for key in &self.session_keys {
            if let Err(e) = self.data_handler.set(key, None).await {
                tracing::warn!(
                    plugin_id = %self.plugin_id,
                    key = %key,
                    error = %e,
                    "Failed to clear session key"
                );
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Mock session for testing.
    #[derive(Default)]
    pub(crate) struct MockSession {
        values: RwLock<HashMap<String, serde_json::Value>>,
    }

    impl MockSession {
        pub(crate) fn raw(&self, key: &str) -> Option<serde_json::Value> {
            self.values.read().unwrap().get(key).cloned()
        }

        pub(crate) fn insert(&self, key: &str, value: serde_json::Value) {
            self.values.write().unwrap().insert(key.to_string(), value);
        }
    }

    #[async_trait]
    impl SessionStore for MockSession {
        async fn get(&self, key: &str) -> AuthResult<Option<serde_json::Value>> {
            Ok(self.raw(key))
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
    async fn test_destination_round_trip() {
        let session = Arc::new(MockSession::default());
        let ctx = ProvisioningContext::new("social_auth_google", session.clone());

        ctx.set_destination("/node/1").await.unwrap();
        assert_eq!(
            session.raw("social_auth_googlelogin_destination"),
            Some(serde_json::json!("/node/1"))
        );

        assert_eq!(ctx.take_destination().await.unwrap().as_deref(), Some("/node/1"));
        assert!(ctx.take_destination().await.unwrap().is_none());
        assert!(session.raw("social_auth_googlelogin_destination").is_none());
    }

    #[tokio::test]
    async fn test_empty_destination_is_ignored() {
        let session = Arc::new(MockSession::default());
        let ctx = ProvisioningContext::new("social_auth_google", session);
        ctx.set_destination("").await.unwrap();
        assert!(ctx.take_destination().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_nullify_session_keys() {
        let session = Arc::new(MockSession::default());
        session.insert("social_auth_googleaccess_token", serde_json::json!("abc"));
        session.insert("social_auth_googleoauth2state", serde_json::json!("xyz"));
        session.insert("other", serde_json::json!(1));

        let ctx = ProvisioningContext::new("social_auth_google", session.clone())
            .with_session_keys_to_nullify(vec![
                "access_token".to_string(),
                "oauth2state".to_string(),
            ]);
        ctx.nullify_session_keys().await;

        assert!(session.raw("social_auth_googleaccess_token").is_none());
        assert!(session.raw("social_auth_googleoauth2state").is_none());
        assert_eq!(session.raw("other"), Some(serde_json::json!(1)));
    }

    #[test]
    fn test_builder() {
        let ctx = ProvisioningContext::new("p", Arc::new(MockSession::default()))
            .with_current_user(Some(String::new()))
            .with_langcode("fr");
        assert!(ctx.current_user_id().is_none());
        assert_eq!(ctx.langcode(), "fr");
        assert_eq!(ctx.data_handler().prefix(), "p");

        let ctx = ctx.with_current_user(Some("7".to_string()));
        assert_eq!(ctx.current_user_id(), Some("7"));
    }
}
