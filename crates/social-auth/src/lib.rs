//! # social-auth
//!
//! User provisioning for social login providers.
//!
//! This crate provides:
//! - Linking provider identities to local accounts
//! - Registration of new accounts with unique usernames
//! - Site policy checks (registration, approval, disabled roles)
//! - Profile picture download
//! - Post-login redirects
//!
//! ## Modules
//!
//! - [`config`] - Registration and login settings
//! - [`provisioning`] - The provisioning service and its request state
//! - [`storage`] - Storage traits for users, identity links and sessions
//! - [`events`] - Hooks around account creation and login
//! - [`files`] - Picture download, token replacement and transliteration
//! - [`routing`] - Redirect targets and route resolution
//! - [`password`] - Password generation and hashing

pub mod config;
pub mod error;
pub mod events;
pub mod files;
pub mod password;
pub mod provisioning;
pub mod routing;
pub mod storage;

pub use config::{
    ConfigError, FileSettings, PictureSettings, RegistrationPolicy, SocialAuthConfig,
    SocialAuthSettings, UserAllowed, UserSettings,
};
pub use error::{AuthError, ErrorCategory, PolicyRejection, ProvisioningError};
pub use events::{HookError, HookRegistry, SocialAuthHook, UserEvent, UserFieldsEvent};
pub use files::{FileDownloader, HttpFileDownloader, ManagedFile};
pub use provisioning::{
    AuthOutcome, ExternalIdentity, MessageLevel, OutcomeStatus, ProvisioningContext,
    StatusMessage, UserProvisioningService,
};
pub use routing::{RedirectTarget, RouteResolver, RouteTable};
pub use storage::{
    IdentityLink, IdentityLinkStorage, SessionAuthenticator, SessionStore, User, UserFields,
    UserStatus, UserStorage,
};

/// Type alias for provisioning results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use social_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{ConfigError, RegistrationPolicy, SocialAuthConfig, UserAllowed};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::events::{HookError, HookRegistry, SocialAuthHook, UserEvent, UserFieldsEvent};
    pub use crate::files::{FileDownloader, HttpFileDownloader, ManagedFile};
    pub use crate::provisioning::{
        AuthOutcome, ExternalIdentity, OutcomeStatus, ProvisioningContext, StatusMessage,
        UserProvisioningService,
    };
    pub use crate::routing::{RedirectTarget, RouteResolver, RouteTable};
    pub use crate::storage::{
        IdentityLink, IdentityLinkStorage, SessionAuthenticator, SessionStore, User, UserField,
        UserFields, UserStatus, UserStorage,
    };
}
