//! Account provisioning for social login.
//!
//! # Overview
//!
//! Once a provider integration has verified a user, it hands the identity to
//! the [`UserProvisioningService`] together with a [`ProvisioningContext`]
//! describing the request. The service links, logs in or registers a local
//! account and returns an [`AuthOutcome`] with the redirect to send.
//!
//! # Example
//!
//! ```ignore
//! use social_auth::provisioning::{ExternalIdentity, ProvisioningContext, UserProvisioningService};
//!
//! let service = UserProvisioningService::new(users, links).with_config(config);
//! let ctx = ProvisioningContext::new("social_auth_google", session)
//!     .with_session_keys_to_nullify(vec!["access_token".to_string()]);
//!
//! let identity = ExternalIdentity::new("Jane Doe", "123", access_token)
//!     .with_email(Some("jane@example.com".to_string()));
//! let outcome = service.authenticate(&ctx, identity).await;
//! ```

pub mod context;
pub mod outcome;
pub mod service;
pub mod username;

use serde::{Deserialize, Serialize};

pub use context::{DEFAULT_LANGCODE, LOGIN_DESTINATION_KEY, ProvisioningContext};
pub use outcome::{AuthOutcome, MessageLevel, OutcomeStatus, StatusMessage};
pub use service::UserProvisioningService;
pub use username::{
    MAX_USERNAME_LENGTH, UsernameCandidates, generate_unique_username, normalize_username,
};

/// A user identity verified by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Display name on the provider.
    pub name: String,

    /// Email address, if the provider shared one.
    #[serde(default)]
    pub email: Option<String>,

    /// Stable user id on the provider.
    pub provider_user_id: String,

    /// Access token issued by the provider.
    #[serde(default)]
    pub token: String,

    /// Absolute URL of the profile picture.
    #[serde(default)]
    pub picture_url: Option<String>,

    /// Extra provider data stored with the link.
    #[serde(default)]
    pub additional_data: Option<serde_json::Value>,
}

impl ExternalIdentity {
    /// Creates an identity without email or picture.
    pub fn new(
        name: impl Into<String>,
        provider_user_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: None,
            provider_user_id: provider_user_id.into(),
            token: token.into(),
            picture_url: None,
            additional_data: None,
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the profile picture URL.
    #[must_use]
    pub fn with_picture_url(mut self, url: Option<String>) -> Self {
        self.picture_url = url.filter(|u| !u.is_empty());
        self
    }

    /// Sets the extra provider data.
    #[must_use]
    pub fn with_additional_data(mut self, data: Option<serde_json::Value>) -> Self {
        self.additional_data = data;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_json() {
        let identity: ExternalIdentity = serde_json::from_value(serde_json::json!({
            "name": "Jane Doe",
            "provider_user_id": "123",
            "email": "jane@example.com"
        }))
        .unwrap();

        assert_eq!(identity.name, "Jane Doe");
        assert_eq!(identity.email.as_deref(), Some("jane@example.com"));
        assert!(identity.token.is_empty());
        assert!(identity.picture_url.is_none());
    }

    #[test]
    fn test_empty_picture_url_is_dropped() {
        let identity = ExternalIdentity::new("Jane", "1", "t").with_picture_url(Some(String::new()));
        assert!(identity.picture_url.is_none());
    }
}
