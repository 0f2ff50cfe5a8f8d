//! Event payloads dispatched by the provisioning service.

use std::fmt;

use crate::storage::{User, UserFields};

/// Kinds of social login events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocialAuthEventType {
    /// The field set of a new account is being built.
    UserFields,
    /// A new account was created.
    UserCreated,
    /// An account logged in.
    UserLogin,
}

impl SocialAuthEventType {
    /// Returns the event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserFields => "social_auth.user.fields",
            Self::UserCreated => "social_auth.user.created",
            Self::UserLogin => "social_auth.user.login",
        }
    }
}

impl fmt::Display for SocialAuthEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for [`SocialAuthEventType::UserCreated`] and
/// [`SocialAuthEventType::UserLogin`].
#[derive(Debug, Clone)]
pub struct UserEvent {
    /// The provider integration handling the login.
    pub plugin_id: String,
    /// The account concerned.
    pub user: User,
}

impl UserEvent {
    /// Creates a new user event.
    pub fn new(plugin_id: impl Into<String>, user: User) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            user,
        }
    }
}

/// Mutable payload for [`SocialAuthEventType::UserFields`].
#[derive(Debug, Clone)]
pub struct UserFieldsEvent {
    plugin_id: String,
    fields: UserFields,
}

impl UserFieldsEvent {
    /// Creates a new fields event.
    pub fn new(plugin_id: impl Into<String>, fields: UserFields) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            fields,
        }
    }

    /// Returns the provider integration handling the login.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Returns the field set.
    #[must_use]
    pub fn fields(&self) -> &UserFields {
        &self.fields
    }

    /// Returns the field set for modification.
    pub fn fields_mut(&mut self) -> &mut UserFields {
        &mut self.fields
    }

    /// Consumes the event, returning the (possibly modified) field set.
    #[must_use]
    pub fn into_fields(self) -> UserFields {
        self.fields
    }
}
