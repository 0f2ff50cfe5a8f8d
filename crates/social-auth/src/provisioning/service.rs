//! User provisioning service.
//!
//! [`UserProvisioningService::authenticate`] decides, for a verified provider
//! identity, whether to link it to the logged-in account, log in an existing
//! account, or register a new one. The first matching branch wins:
//!
//! 1. **Link to current account** - the request is already authenticated and
//!    the identity is not linked yet
//! 2. **Linked account** - the identity is linked to a local account
//! 3. **Match by email** - a local account has the identity's email
//! 4. **Register** - create a new account, fetch its picture and link it
//!
//! Collaborator failures never escape: they are logged and the browser is
//! sent back to the login page with a message.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::context::ProvisioningContext;
use super::outcome::{AuthOutcome, OutcomeStatus, StatusMessage};
use super::username::UsernameCandidates;
use super::ExternalIdentity;
use crate::config::SocialAuthConfig;
use crate::error::{AuthError, ErrorCategory, PolicyRejection, ProvisioningError};
use crate::events::{HookRegistry, UserEvent, UserFieldsEvent};
use crate::files::{
    DefaultTokenReplacer, FileDownloader, LatinTransliterator, TokenContext, TokenReplacer,
    Transliterator,
};
use crate::password::{GENERATED_PASSWORD_LENGTH, PasswordGenerator, RandomPasswordGenerator};
use crate::routing::{RedirectTarget, RouteResolver, RouteTable};
use crate::storage::{
    IdentityLink, IdentityLinkStorage, SessionAuthenticator, SessionUidAuthenticator, User,
    UserFields, UserStatus, UserStorage,
};

/// Shown when the super-admin tries to use social login.
pub const MSG_ADMIN_DISABLED: &str = "Authentication for Admin (user 1) is disabled.";

/// Shown when a blocked or unapproved account tries to log in.
pub const MSG_NOT_APPROVED: &str = "Your account has not been approved yet or might have been canceled, please contact the administrator.";

/// Shown after registering an account that needs approval.
pub const MSG_APPROVAL_REQUIRED: &str =
    "Your account was created, but it needs administrator's approval.";

/// Shown when a freshly registered account cannot log in.
pub const MSG_NEW_USER_LOGIN_FAILED: &str =
    "You could not be authenticated. Contact site administrator.";

/// Shown when registration is closed.
pub const MSG_REGISTRATION_DISABLED: &str =
    "User registration is disabled, please contact the administrator.";

/// Shown when an account or link could not be stored.
pub const MSG_AUTHENTICATION_FAILED: &str =
    "You could not be authenticated, please contact the administrator.";

/// Maximum length of transliterated picture paths.
const MAX_PICTURE_PATH_LENGTH: usize = 50;

/// Message shown when an account holds a disabled role.
fn role_disabled_message(role: &str) -> String {
    format!("Authentication for '{role}' role is disabled.")
}

/// Message shown to the user for a policy rejection.
fn rejection_message(rejection: &PolicyRejection) -> StatusMessage {
    match rejection {
        PolicyRejection::RegistrationDisabled => StatusMessage::error(MSG_REGISTRATION_DISABLED),
        PolicyRejection::AdminLoginDisabled => StatusMessage::error(MSG_ADMIN_DISABLED),
        PolicyRejection::RoleDisabled(role) => StatusMessage::error(role_disabled_message(role)),
        PolicyRejection::ApprovalRequired => StatusMessage::warning(MSG_APPROVAL_REQUIRED),
        PolicyRejection::AccountBlocked => StatusMessage::error(MSG_NOT_APPROVED),
    }
}

/// Links provider identities to local accounts and logs them in.
pub struct UserProvisioningService {
    users: Arc<dyn UserStorage>,
    links: Arc<dyn IdentityLinkStorage>,
    config: SocialAuthConfig,
    hooks: Arc<HookRegistry>,
    downloader: Option<Arc<dyn FileDownloader>>,
    authenticator: Arc<dyn SessionAuthenticator>,
    passwords: Arc<dyn PasswordGenerator>,
    routes: Arc<dyn RouteResolver>,
    tokens: Arc<dyn TokenReplacer>,
    transliterator: Arc<dyn Transliterator>,
}

impl UserProvisioningService {
    /// Creates a service with default configuration and collaborators.
    ///
    /// Without a [`FileDownloader`] profile pictures are skipped.
    pub fn new(users: Arc<dyn UserStorage>, links: Arc<dyn IdentityLinkStorage>) -> Self {
        Self {
            users,
            links,
            config: SocialAuthConfig::default(),
            hooks: Arc::new(HookRegistry::new()),
            downloader: None,
            authenticator: Arc::new(SessionUidAuthenticator),
            passwords: Arc::new(RandomPasswordGenerator),
            routes: Arc::new(RouteTable::with_defaults()),
            tokens: Arc::new(DefaultTokenReplacer),
            transliterator: Arc::new(LatinTransliterator),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SocialAuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the hook registry.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets the downloader used for profile pictures.
    #[must_use]
    pub fn with_file_downloader(mut self, downloader: Arc<dyn FileDownloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Sets the session authenticator.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn SessionAuthenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Sets the password generator.
    #[must_use]
    pub fn with_password_generator(mut self, passwords: Arc<dyn PasswordGenerator>) -> Self {
        self.passwords = passwords;
        self
    }

    /// Sets the route resolver.
    #[must_use]
    pub fn with_route_resolver(mut self, routes: Arc<dyn RouteResolver>) -> Self {
        self.routes = routes;
        self
    }

    /// Sets the token replacer for picture directories.
    #[must_use]
    pub fn with_token_replacer(mut self, tokens: Arc<dyn TokenReplacer>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Sets the transliterator for picture paths.
    #[must_use]
    pub fn with_transliterator(mut self, transliterator: Arc<dyn Transliterator>) -> Self {
        self.transliterator = transliterator;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SocialAuthConfig {
        &self.config
    }

    /// Returns the route resolver.
    #[must_use]
    pub fn routes(&self) -> &Arc<dyn RouteResolver> {
        &self.routes
    }

    /// Authenticate a verified provider identity.
    ///
    /// Never fails: every error ends in a redirect to the login page with a
    /// message for the user.
    pub async fn authenticate(
        &self,
        ctx: &ProvisioningContext,
        identity: ExternalIdentity,
    ) -> AuthOutcome {
        let mut messages = Vec::new();
        let plugin_id = ctx.plugin_id();
        let provider_user_id = identity.provider_user_id.as_str();

        let linked_user_id = match self.links.find_user_id(plugin_id, provider_user_id).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    plugin_id = %plugin_id,
                    provider_user_id = %provider_user_id,
                    error = %e,
                    "Failed to look up identity link"
                );
                messages.push(StatusMessage::error(MSG_AUTHENTICATION_FAILED));
                return self.fail(ctx, messages).await;
            }
        };

        if let Some(current_user_id) = ctx.current_user_id() {
            if linked_user_id.is_none()
                && self
                    .add_user_record(ctx, current_user_id, &identity, &mut messages)
                    .await
            {
                info!(
                    plugin_id = %plugin_id,
                    provider_user_id = %provider_user_id,
                    user_id = %current_user_id,
                    "Identity linked to current account"
                );
                let redirect = self.post_login_path(ctx).await;
                return AuthOutcome::new(redirect, OutcomeStatus::Linked)
                    .with_messages(messages)
                    .with_user(current_user_id);
            }
        }

        if let Some(user_id) = linked_user_id {
            match self.users.find_by_id(&user_id).await {
                Ok(Some(user)) => {
                    return self.authenticate_existing_user(ctx, user, messages).await;
                }
                Ok(None) => {
                    warn!(
                        plugin_id = %plugin_id,
                        provider_user_id = %provider_user_id,
                        user_id = %user_id,
                        "Identity is linked to a missing account"
                    );
                }
                Err(e) => {
                    error!(
                        plugin_id = %plugin_id,
                        provider_user_id = %provider_user_id,
                        user_id = %user_id,
                        error = %e,
                        "Failed to load linked account"
                    );
                    messages.push(StatusMessage::error(MSG_AUTHENTICATION_FAILED));
                    return self.fail(ctx, messages).await;
                }
            }
        }

        if let Some(email) = identity.email.as_deref().filter(|e| !e.is_empty()) {
            match self.users.find_by_email(email).await {
                Ok(Some(user)) => {
                    self.add_user_record(ctx, &user.id, &identity, &mut messages)
                        .await;
                    return self.authenticate_existing_user(ctx, user, messages).await;
                }
                Ok(None) => {}
                Err(e) => {
                    error!(
                        plugin_id = %plugin_id,
                        provider_user_id = %provider_user_id,
                        error = %e,
                        "Failed to look up account by email"
                    );
                    messages.push(StatusMessage::error(MSG_AUTHENTICATION_FAILED));
                    return self.fail(ctx, messages).await;
                }
            }
        }

        let created = self
            .create_local_user(ctx, &identity.name, identity.email.as_deref(), &mut messages)
            .await;

        let Some(mut user) = created else {
            return self.fail(ctx, messages).await;
        };

        if let Some(picture_url) = identity.picture_url.as_deref() {
            self.set_profile_picture(ctx, &mut user, picture_url, provider_user_id)
                .await;
        }

        self.add_user_record(ctx, &user.id, &identity, &mut messages)
            .await;

        self.authenticate_new_user(ctx, user, messages).await
    }

    /// Clears session keys and sends the browser to the login page.
    async fn fail(&self, ctx: &ProvisioningContext, messages: Vec<StatusMessage>) -> AuthOutcome {
        ctx.nullify_session_keys().await;
        AuthOutcome::login(OutcomeStatus::Failed).with_messages(messages)
    }

    /// Sends the browser to the login page for a policy rejection of `user`.
    async fn reject(
        &self,
        ctx: &ProvisioningContext,
        user: User,
        rejection: PolicyRejection,
        mut messages: Vec<StatusMessage>,
    ) -> AuthOutcome {
        warn!(
            plugin_id = %ctx.plugin_id(),
            user_id = %user.id,
            category = %ErrorCategory::Policy,
            reason = %rejection,
            "Social login rejected by policy"
        );

        let (status, clear_session) = match &rejection {
            PolicyRejection::AdminLoginDisabled
            | PolicyRejection::AccountBlocked
            | PolicyRejection::RegistrationDisabled => (OutcomeStatus::Rejected, true),
            PolicyRejection::RoleDisabled(_) => (OutcomeStatus::Rejected, false),
            PolicyRejection::ApprovalRequired => (OutcomeStatus::PendingApproval, true),
        };
        if clear_session {
            ctx.nullify_session_keys().await;
        }

        messages.push(rejection_message(&rejection));
        AuthOutcome::login(status)
            .with_messages(messages)
            .with_user(user.id)
    }

    /// Checks site policy for an existing account, then logs it in.
    pub async fn authenticate_existing_user(
        &self,
        ctx: &ProvisioningContext,
        user: User,
        mut messages: Vec<StatusMessage>,
    ) -> AuthOutcome {
        if let Err(rejection) = self.check_login_policy(&user) {
            return self.reject(ctx, user, rejection, messages).await;
        }

        match self.try_login_user(ctx, &user).await {
            Ok(()) => {
                let redirect = self.post_login_path(ctx).await;
                AuthOutcome::new(redirect, OutcomeStatus::LoggedIn)
                    .with_messages(messages)
                    .with_user(user.id)
            }
            Err(ProvisioningError::PolicyRejection(rejection)) => {
                self.reject(ctx, user, rejection, messages).await
            }
            Err(err) => {
                error!(
                    plugin_id = %ctx.plugin_id(),
                    user_id = %user.id,
                    category = %err.category(),
                    error = %err,
                    "Failed to finalize login"
                );
                ctx.nullify_session_keys().await;
                messages.push(rejection_message(&PolicyRejection::AccountBlocked));
                AuthOutcome::login(OutcomeStatus::Rejected)
                    .with_messages(messages)
                    .with_user(user.id)
            }
        }
    }

    /// Logs in a freshly registered account unless it needs approval.
    pub async fn authenticate_new_user(
        &self,
        ctx: &ProvisioningContext,
        user: User,
        mut messages: Vec<StatusMessage>,
    ) -> AuthOutcome {
        if self.config.is_approval_required() {
            return self
                .reject(ctx, user, PolicyRejection::ApprovalRequired, messages)
                .await;
        }

        if self.login_user(ctx, &user).await {
            let redirect = if self.config.social_auth.redirect_user_form {
                RedirectTarget::user_edit_form(user.id.clone())
            } else {
                self.post_login_path(ctx).await
            };
            return AuthOutcome::new(redirect, OutcomeStatus::LoggedIn)
                .with_messages(messages)
                .with_user(user.id);
        }

        messages.push(StatusMessage::error(MSG_NEW_USER_LOGIN_FAILED));
        ctx.nullify_session_keys().await;
        AuthOutcome::login(OutcomeStatus::Rejected)
            .with_messages(messages)
            .with_user(user.id)
    }

    /// Site policy for existing accounts: super-admin first, then roles.
    fn check_login_policy(&self, user: &User) -> Result<(), PolicyRejection> {
        let settings = &self.config.social_auth;

        if settings.disable_admin_login && user.is_super_admin() {
            return Err(PolicyRejection::AdminLoginDisabled);
        }

        if let Some(role) = settings
            .disabled_roles
            .iter()
            .find(|role| !role.is_empty() && user.has_role(role))
        {
            return Err(PolicyRejection::RoleDisabled(role.clone()));
        }

        Ok(())
    }

    /// Links the identity to account `user_id`.
    ///
    /// Returns `false` and records a message if a required value is missing
    /// or the link cannot be stored.
    pub async fn add_user_record(
        &self,
        ctx: &ProvisioningContext,
        user_id: &str,
        identity: &ExternalIdentity,
        messages: &mut Vec<StatusMessage>,
    ) -> bool {
        let plugin_id = ctx.plugin_id();
        let provider_user_id = identity.provider_user_id.as_str();

        if user_id.is_empty() || plugin_id.is_empty() || provider_user_id.is_empty() {
            let err = ProvisioningError::Validation(
                "user id, plugin id and provider user id are required".to_string(),
            );
            error!(
                plugin_id = %plugin_id,
                provider_user_id = %provider_user_id,
                user_id = %user_id,
                category = %err.category(),
                error = %err,
                "Failed to add identity link"
            );
            messages.push(StatusMessage::error(MSG_AUTHENTICATION_FAILED));
            return false;
        }

        let link = IdentityLink::new(user_id, plugin_id, provider_user_id, &identity.token)
            .with_additional_data(identity.additional_data.clone());

        match self.links.create(&link).await {
            Ok(()) => {
                debug!(
                    plugin_id = %plugin_id,
                    provider_user_id = %provider_user_id,
                    user_id = %user_id,
                    "Identity link created"
                );
                true
            }
            Err(e) => {
                let err = ProvisioningError::Persistence(e);
                error!(
                    plugin_id = %plugin_id,
                    provider_user_id = %provider_user_id,
                    user_id = %user_id,
                    category = %err.category(),
                    error = %err,
                    "Failed to add identity link"
                );
                messages.push(StatusMessage::error(MSG_AUTHENTICATION_FAILED));
                false
            }
        }
    }

    /// Registers a new account for the provider identity.
    ///
    /// Returns `None` when the name is empty, registration is closed or the
    /// account cannot be stored.
    pub async fn create_local_user(
        &self,
        ctx: &ProvisioningContext,
        name: &str,
        email: Option<&str>,
        messages: &mut Vec<StatusMessage>,
    ) -> Option<User> {
        match self.try_create_local_user(ctx, name, email).await {
            Ok(user) => Some(user),
            Err(err @ ProvisioningError::Validation(_)) => {
                error!(
                    plugin_id = %ctx.plugin_id(),
                    name = %name,
                    category = %err.category(),
                    error = %err,
                    "Failed to create user"
                );
                None
            }
            Err(ProvisioningError::PolicyRejection(rejection)) => {
                warn!(
                    plugin_id = %ctx.plugin_id(),
                    name = %name,
                    email = ?email,
                    category = %ErrorCategory::Policy,
                    reason = %rejection,
                    "Failed to create user"
                );
                messages.push(rejection_message(&rejection));
                None
            }
            Err(err) => {
                error!(
                    plugin_id = %ctx.plugin_id(),
                    name = %name,
                    category = %err.category(),
                    error = %err,
                    "Could not create new user"
                );
                messages.push(StatusMessage::error(MSG_AUTHENTICATION_FAILED));
                None
            }
        }
    }

    async fn try_create_local_user(
        &self,
        ctx: &ProvisioningContext,
        name: &str,
        email: Option<&str>,
    ) -> Result<User, ProvisioningError> {
        if name.trim().is_empty() {
            return Err(ProvisioningError::Validation("name is empty".to_string()));
        }

        if self.config.is_registration_disabled() {
            return Err(PolicyRejection::RegistrationDisabled.into());
        }

        let fields = self.build_user_fields(ctx, name, email).await?;

        let mut event = UserFieldsEvent::new(ctx.plugin_id(), fields);
        self.hooks.dispatch_user_fields(&mut event).await;
        let fields = event.into_fields();

        let user = self
            .users
            .create(&fields)
            .await
            .map_err(ProvisioningError::Persistence)?;

        info!(
            plugin_id = %ctx.plugin_id(),
            username = %user.name,
            user_id = %user.id,
            "New user created"
        );

        self.hooks
            .dispatch_user_created(&UserEvent::new(ctx.plugin_id(), user.clone()))
            .await;

        Ok(user)
    }

    async fn build_user_fields(
        &self,
        ctx: &ProvisioningContext,
        name: &str,
        email: Option<&str>,
    ) -> Result<UserFields, ProvisioningError> {
        let username = self.generate_unique_username(name).await?;

        let password = self.passwords.generate(GENERATED_PASSWORD_LENGTH);
        let hash = self
            .passwords
            .hash(&password)
            .map_err(ProvisioningError::Internal)?;

        let status = if self.config.new_users_active() {
            UserStatus::Active
        } else {
            UserStatus::Blocked
        };

        Ok(UserFields::new(username, ctx.langcode())
            .with_mail(email.filter(|e| !e.is_empty()).map(str::to_string))
            .with_pass(hash)
            .with_status(status))
    }

    /// Returns the first free account name derived from `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Persistence`] if a name lookup fails and
    /// [`ProvisioningError::Internal`] if every suffix is taken.
    pub async fn generate_unique_username(&self, name: &str) -> Result<String, ProvisioningError> {
        for candidate in UsernameCandidates::new(name) {
            let taken = self
                .users
                .find_by_name(&candidate)
                .await
                .map_err(ProvisioningError::Persistence)?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
        }
        Err(ProvisioningError::Internal(AuthError::internal(
            "username candidates exhausted",
        )))
    }

    /// Finalizes the session for an active account.
    ///
    /// Returns `false` for blocked accounts and when the session cannot be
    /// updated.
    pub async fn login_user(&self, ctx: &ProvisioningContext, user: &User) -> bool {
        match self.try_login_user(ctx, user).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    plugin_id = %ctx.plugin_id(),
                    user_id = %user.id,
                    username = %user.name,
                    category = %err.category(),
                    error = %err,
                    "Login prevented"
                );
                false
            }
        }
    }

    async fn try_login_user(
        &self,
        ctx: &ProvisioningContext,
        user: &User,
    ) -> Result<(), ProvisioningError> {
        if !user.is_active() {
            return Err(PolicyRejection::AccountBlocked.into());
        }

        self.authenticator
            .finalize_login(ctx.session().as_ref(), user)
            .await
            .map_err(ProvisioningError::Persistence)?;

        self.hooks
            .dispatch_user_login(&UserEvent::new(ctx.plugin_id(), user.clone()))
            .await;

        info!(plugin_id = %ctx.plugin_id(), user_id = %user.id, "User logged in");
        Ok(())
    }

    /// Downloads the provider picture and attaches it to the account.
    ///
    /// Returns `true` when the picture was stored and the account saved.
    pub async fn set_profile_picture(
        &self,
        ctx: &ProvisioningContext,
        user: &mut User,
        picture_url: &str,
        provider_user_id: &str,
    ) -> bool {
        match self
            .try_set_profile_picture(ctx, user, picture_url, provider_user_id)
            .await
        {
            Ok(stored) => stored,
            Err(err) => {
                error!(
                    plugin_id = %ctx.plugin_id(),
                    provider_user_id = %provider_user_id,
                    user_id = %user.id,
                    url = %picture_url,
                    category = %err.category(),
                    error = %err,
                    "Could not save profile picture"
                );
                false
            }
        }
    }

    /// `Ok(false)` when pictures are not handled for this account.
    async fn try_set_profile_picture(
        &self,
        ctx: &ProvisioningContext,
        user: &mut User,
        picture_url: &str,
        provider_user_id: &str,
    ) -> Result<bool, ProvisioningError> {
        if !self.config.picture.enabled || picture_url.is_empty() || provider_user_id.is_empty() {
            return Ok(false);
        }

        let Some(downloader) = &self.downloader else {
            debug!(plugin_id = %ctx.plugin_id(), "No file downloader, skipping profile picture");
            return Ok(false);
        };

        let file_directory = self.config.picture.file_directory.trim_matches('/');
        if file_directory.is_empty() {
            return Ok(false);
        }

        let token_context = TokenContext::new(ctx.plugin_id()).with_user(&user.id, &user.name);
        let directory = format!("{}://{}", self.config.file.default_scheme, file_directory);
        let directory = self.tokens.replace(&directory, &token_context);
        let directory =
            self.transliterator
                .transliterate(&directory, '_', MAX_PICTURE_PATH_LENGTH);

        downloader
            .prepare_directory(&directory)
            .await
            .map_err(ProvisioningError::Resource)?;

        let filename = self.transliterator.transliterate(
            &format!("{}_{}.jpg", ctx.plugin_id(), provider_user_id),
            '_',
            MAX_PICTURE_PATH_LENGTH,
        );
        let destination = format!("{}/{}", directory.trim_end_matches('/'), filename);

        let file = downloader
            .download(picture_url, &destination)
            .await
            .map_err(ProvisioningError::Resource)?;

        debug!(
            plugin_id = %ctx.plugin_id(),
            user_id = %user.id,
            uri = %file.uri,
            filesize = file.filesize,
            "Profile picture downloaded"
        );

        user.picture_file_id = Some(file.id);
        self.users
            .save(user)
            .await
            .map_err(ProvisioningError::Persistence)?;

        Ok(true)
    }

    /// Where to go after a successful login.
    ///
    /// A destination stored in the session wins and is consumed; otherwise
    /// the configured post-login route, or path when no such route exists.
    pub async fn post_login_path(&self, ctx: &ProvisioningContext) -> RedirectTarget {
        match ctx.take_destination().await {
            Ok(Some(destination)) => return RedirectTarget::path(destination),
            Ok(None) => {}
            Err(e) => {
                warn!(plugin_id = %ctx.plugin_id(), error = %e, "Failed to read login destination");
            }
        }

        let post_login = &self.config.social_auth.post_login;
        if self.routes.has_route(post_login) {
            RedirectTarget::route(post_login.clone())
        } else {
            RedirectTarget::path(post_login.clone())
        }
    }
}

impl std::fmt::Debug for UserProvisioningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserProvisioningService")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .field("downloader", &self.downloader.is_some())
            .finish_non_exhaustive()
    }
}
