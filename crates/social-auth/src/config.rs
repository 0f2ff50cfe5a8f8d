//! Social login configuration.
//!
//! Site-wide registration settings and the social-auth specific settings are
//! kept in separate sections, mirroring where each value originates.
//!
//! # Example (TOML)
//!
//! ```toml
//! [user]
//! register = "visitors_admin_approval"
//!
//! [social_auth]
//! user_allowed = "register"
//! disable_admin_login = true
//! disabled_roles = ["editor"]
//! post_login = "user.page"
//!
//! [picture]
//! enabled = true
//! file_directory = "pictures/[date:custom:Y]-[date:custom:m]"
//! download_timeout = "10s"
//! max_size = 5242880
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration consumed by the provisioning service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SocialAuthConfig {
    /// Site-wide account settings.
    pub user: UserSettings,

    /// Social-auth specific settings.
    pub social_auth: SocialAuthSettings,

    /// File system settings.
    pub file: FileSettings,

    /// Profile picture settings.
    pub picture: PictureSettings,
}

/// Who may register new accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// Only administrators can create accounts.
    AdminOnly,
    /// Visitors can register and are active immediately.
    #[default]
    Visitors,
    /// Visitors can register but need administrator approval.
    VisitorsAdminApproval,
}

/// Site-wide account settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserSettings {
    /// Account registration policy.
    pub register: RegistrationPolicy,
}

/// What social login may do for unknown identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAllowed {
    /// Existing users may log in and new users may register.
    #[default]
    Register,
    /// Only existing users may log in.
    Login,
}

/// Social-auth specific settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SocialAuthSettings {
    /// Whether social login may create accounts.
    pub user_allowed: UserAllowed,

    /// Refuse social login for the super-admin account.
    pub disable_admin_login: bool,

    /// Roles whose holders may not use social login.
    pub disabled_roles: Vec<String>,

    /// Route name (or raw path) users are sent to after login.
    pub post_login: String,

    /// Send newly created users to their profile edit form.
    pub redirect_user_form: bool,
}

impl Default for SocialAuthSettings {
    fn default() -> Self {
        Self {
            user_allowed: UserAllowed::Register,
            disable_admin_login: true,
            disabled_roles: Vec::new(),
            post_login: "user.page".to_string(),
            redirect_user_form: false,
        }
    }
}

/// File system settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileSettings {
    /// Default stream wrapper scheme for new files.
    pub default_scheme: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            default_scheme: "public".to_string(),
        }
    }
}

/// Profile picture settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PictureSettings {
    /// Whether user accounts carry a picture field.
    pub enabled: bool,

    /// Directory template for downloaded pictures, relative to the scheme.
    /// Supports `[date:custom:*]`, `[user:uid]` and `[plugin:id]` tokens.
    pub file_directory: String,

    /// Timeout for a single picture download.
    #[serde(with = "humantime_serde")]
    pub download_timeout: Duration,

    /// Largest picture accepted from a provider, in bytes.
    pub max_size: u64,
}

impl Default for PictureSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            file_directory: "pictures/[date:custom:Y]-[date:custom:m]".to_string(),
            download_timeout: Duration::from_secs(10),
            max_size: crate::files::DEFAULT_MAX_DOWNLOAD_SIZE,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl SocialAuthConfig {
    /// Returns `true` if social login may not create new accounts.
    ///
    /// Either the site-wide policy or the social-auth setting can disable
    /// registration; both are checked independently.
    #[must_use]
    pub fn is_registration_disabled(&self) -> bool {
        self.user.register == RegistrationPolicy::AdminOnly
            || self.social_auth.user_allowed == UserAllowed::Login
    }

    /// Returns `true` if new accounts need administrator approval.
    #[must_use]
    pub fn is_approval_required(&self) -> bool {
        self.user.register == RegistrationPolicy::VisitorsAdminApproval
    }

    /// Returns `true` if new accounts start active.
    #[must_use]
    pub fn new_users_active(&self) -> bool {
        self.user.register == RegistrationPolicy::Visitors
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `post_login` is empty
    /// - `default_scheme` is empty or contains `:`
    /// - pictures are enabled with an empty directory, a zero timeout or a
    ///   zero size limit
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.social_auth.post_login.trim().is_empty() {
            return Err(ConfigError::Missing("social_auth.post_login".to_string()));
        }

        let scheme = &self.file.default_scheme;
        if scheme.is_empty() || scheme.contains(':') {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid file scheme: '{}'",
                scheme
            )));
        }

        if self.picture.enabled {
            if self.picture.file_directory.trim().is_empty() {
                return Err(ConfigError::Missing("picture.file_directory".to_string()));
            }
            if self.picture.download_timeout.is_zero() {
                return Err(ConfigError::InvalidValue(
                    "picture.download_timeout must be > 0".to_string(),
                ));
            }
            if self.picture.max_size == 0 {
                return Err(ConfigError::InvalidValue(
                    "picture.max_size must be > 0".to_string(),
                ));
            }
        }

        for role in &self.social_auth.disabled_roles {
            if role.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "social_auth.disabled_roles cannot contain empty roles".to_string(),
                ));
            }
        }

        Ok(())
    }
}
