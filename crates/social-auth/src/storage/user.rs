//! User storage trait.
//!
//! Defines the local account model and the interface for user persistence.
//! Implementations are provided by storage backends (e.g., in-memory).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;

/// Id of the distinguished super-admin account.
pub const SUPER_ADMIN_ID: &str = "1";

/// Default datetime value for deserialization when field is missing.
fn default_datetime() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

// =============================================================================
// User Type
// =============================================================================

/// Account status.
///
/// Freshly registered accounts that await administrator approval are
/// `Blocked` until an administrator activates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// The account may not log in.
    #[default]
    Blocked,
    /// The account may log in.
    Active,
}

/// A local user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user.
    pub id: String,

    /// Unique account name.
    pub name: String,

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Email address used at registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,

    /// Argon2 hash of the account password.
    ///
    /// Accounts created by social login get a random password that is never
    /// shown to anyone.
    #[serde(default)]
    pub password_hash: Option<String>,

    /// Account status.
    pub status: UserStatus,

    /// Roles held by the account.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Language the account was created in.
    pub langcode: String,

    /// Preferred interface language.
    pub preferred_langcode: String,

    /// Preferred administration language.
    pub preferred_admin_langcode: String,

    /// Id of the managed file holding the profile picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_file_id: Option<String>,

    /// Additional fields set by hooks.
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,

    /// When the user was created.
    #[serde(default = "default_datetime", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the user was last updated.
    #[serde(default = "default_datetime", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Creates a user from an initial field set and the id assigned by storage.
    #[must_use]
    pub fn from_fields(id: impl Into<String>, fields: UserFields) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            name: fields.name,
            email: fields.mail,
            init: fields.init,
            password_hash: fields.pass,
            status: fields.status,
            roles: fields.roles,
            langcode: fields.langcode,
            preferred_langcode: fields.preferred_langcode,
            preferred_admin_langcode: fields.preferred_admin_langcode,
            picture_file_id: None,
            extra: fields.extra,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the account may log in.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Returns `true` if this is the super-admin account.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.id == SUPER_ADMIN_ID
    }

    /// Returns `true` if the user has a specific role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

// =============================================================================
// User Fields
// =============================================================================

/// Initial field set for a new account.
///
/// Built by the provisioning service and handed to hooks before the account
/// is persisted, so any change a hook makes ends up on the stored user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFields {
    /// Account name.
    pub name: String,
    /// Email address.
    pub mail: Option<String>,
    /// Registration email address.
    pub init: Option<String>,
    /// Password hash.
    pub pass: Option<String>,
    /// Initial status.
    pub status: UserStatus,
    /// Creation language.
    pub langcode: String,
    /// Preferred interface language.
    pub preferred_langcode: String,
    /// Preferred administration language.
    pub preferred_admin_langcode: String,
    /// Initial roles.
    pub roles: Vec<String>,
    /// Additional fields.
    pub extra: HashMap<String, serde_json::Value>,
}

impl UserFields {
    /// Creates a field set with the given name and language.
    #[must_use]
    pub fn new(name: impl Into<String>, langcode: impl Into<String>) -> Self {
        let langcode = langcode.into();
        Self {
            name: name.into(),
            mail: None,
            init: None,
            pass: None,
            status: UserStatus::Blocked,
            preferred_langcode: langcode.clone(),
            preferred_admin_langcode: langcode.clone(),
            langcode,
            roles: Vec::new(),
            extra: HashMap::new(),
        }
    }

    /// Sets the email address (also used as the registration email).
    #[must_use]
    pub fn with_mail(mut self, mail: Option<String>) -> Self {
        self.init = mail.clone();
        self.mail = mail;
        self
    }

    /// Sets the password hash.
    #[must_use]
    pub fn with_pass(mut self, pass: impl Into<String>) -> Self {
        self.pass = Some(pass.into());
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }
}

// =============================================================================
// User Storage Trait
// =============================================================================

/// Fields users can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    /// The user id.
    Id,
    /// The unique account name.
    Name,
    /// The email address.
    Mail,
}

/// Storage operations for users.
///
/// # Example
///
/// ```ignore
/// use social_auth::storage::UserStorage;
///
/// async fn example(storage: &impl UserStorage) {
///     if let Some(user) = storage.find_by_email("jane@example.com").await? {
///         println!("Found user: {}", user.name);
///     }
/// }
/// ```
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Find the first user whose `field` equals `value`.
    ///
    /// Names and emails are unique, so at most one user matches those.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_field(&self, field: UserField, value: &str) -> AuthResult<Option<User>>;

    /// Create a new user from an initial field set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A user with the same name or email already exists
    /// - The storage operation fails
    async fn create(&self, fields: &UserFields) -> AuthResult<User>;

    /// Persist changes to an existing user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user doesn't exist or the storage operation fails.
    async fn save(&self, user: &User) -> AuthResult<()>;

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>> {
        self.find_by_field(UserField::Id, user_id).await
    }

    /// Find a user by account name.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_name(&self, name: &str) -> AuthResult<Option<User>> {
        self.find_by_field(UserField::Name, name).await
    }

    /// Find a user by email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        self.find_by_field(UserField::Mail, email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_fields_builder() {
        let fields = UserFields::new("janedoe", "fr")
            .with_mail(Some("jane@x.com".to_string()))
            .with_pass("$argon2id$hash")
            .with_status(UserStatus::Active);

        assert_eq!(fields.name, "janedoe");
        assert_eq!(fields.mail.as_deref(), Some("jane@x.com"));
        assert_eq!(fields.init.as_deref(), Some("jane@x.com"));
        assert_eq!(fields.langcode, "fr");
        assert_eq!(fields.preferred_langcode, "fr");
        assert_eq!(fields.preferred_admin_langcode, "fr");
        assert_eq!(fields.status, UserStatus::Active);
    }

    #[test]
    fn test_user_from_fields() {
        let mut fields = UserFields::new("janedoe", "en").with_status(UserStatus::Active);
        fields.roles.push("editor".to_string());

        let user = User::from_fields("42", fields);
        assert_eq!(user.id, "42");
        assert!(user.is_active());
        assert!(user.has_role("editor"));
        assert!(!user.has_role("admin"));
        assert!(!user.is_super_admin());
        assert!(user.picture_file_id.is_none());
    }

    #[test]
    fn test_super_admin() {
        let user = User::from_fields(SUPER_ADMIN_ID, UserFields::new("admin", "en"));
        assert!(user.is_super_admin());
        assert!(!user.is_active());
    }

    #[test]
    fn test_user_status_serde() {
        assert_eq!(
            serde_json::to_value(UserStatus::Active).unwrap(),
            serde_json::json!("active")
        );
        let status: UserStatus = serde_json::from_value(serde_json::json!("blocked")).unwrap();
        assert_eq!(status, UserStatus::Blocked);
    }
}
